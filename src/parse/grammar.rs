use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, fail, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::{CompareOp, Expr};

/// Parentheses, call arguments and `not` each open one level.
pub(crate) const MAX_NESTING: usize = 128;

// -- Whitespace & keywords --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword<'i>(kw: &'static str) -> impl Parser<&'i str, (), ErrMode<ContextError>> {
    terminated(kw, not(one_of(is_ident_char))).void()
}

// -- Names ------------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

/// Names after `input:` and `group:` may also contain `-`.
fn reference_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| is_ident_char(c) || c == '-').parse_next(input)
}

// -- Literals ---------------------------------------------------------------

/// Single- or double-quoted string. Unknown escapes are kept verbatim so regex
/// patterns like `'^\d+$'` survive.
fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = alt(('\'', '"')).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::CharLiteral(quote)))
            .parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = cut_err(any).parse_next(input)?;
                match esc {
                    '\'' | '"' | '\\' => s.push(esc),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)
}

// -- Operands ---------------------------------------------------------------

fn descend(input: &mut &str, depth: usize) -> ModalResult<usize> {
    if depth < MAX_NESTING {
        return Ok(depth + 1);
    }
    cut_err(
        fail::<&str, usize, ErrMode<ContextError>>
            .context(StrContext::Label("nesting, more than 128 levels")),
    )
    .parse_next(input)
}

fn call_or_bool(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    let name = ident.parse_next(input)?;
    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;
    if opt('(').parse_next(input)?.is_some() {
        let inner = descend(input, depth)?;
        let args: Vec<Expr> =
            separated(0.., |i: &mut &str| expr(i, inner), (ws, ',')).parse_next(input)?;
        (ws, cut_err(')'))
            .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
            .parse_next(input)?;
        return Ok(Expr::call(name, args));
    }
    input.reset(&checkpoint);
    match name {
        "true" => Ok(Expr::Bool(true)),
        "false" => Ok(Expr::Bool(false)),
        _ => Err(ErrMode::from_input(input)),
    }
}

fn parenthesized(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    '('.parse_next(input)?;
    let inner = descend(input, depth)?;
    let e = expr(input, inner)?;
    (ws, cut_err(')')).parse_next(input)?;
    Ok(Expr::Paren(Box::new(e)))
}

fn primary(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        |i: &mut &str| parenthesized(i, depth),
        string_literal.map(Expr::Str),
        number.map(|n: &str| Expr::Number(n.to_owned())),
        preceded("input:", cut_err(reference_name)).map(Expr::input),
        preceded("group:", cut_err(reference_name))
            .map(|n: &str| Expr::GroupRef(n.to_owned())),
        |i: &mut &str| call_or_bool(i, depth),
    ))
    .context(StrContext::Expected(StrContextValue::Description("operand")))
    .parse_next(input)
}

// -- Comparisons ------------------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    alt((
        "~=".value(CompareOp::Match),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
        ">=".value(CompareOp::Gte),
        "<=".value(CompareOp::Lte),
        ">".value(CompareOp::Gt),
        "<".value(CompareOp::Lt),
        "=".value(CompareOp::Eq),
    ))
    .parse_next(input)
}

fn comparison(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    let lhs = primary(input, depth)?;
    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;
    if let Some(op) = opt(compare_op).parse_next(input)? {
        let rhs = cut_err(|i: &mut &str| primary(i, depth)).parse_next(input)?;
        Ok(Expr::compare(lhs, op, rhs))
    } else {
        input.reset(&checkpoint);
        Ok(lhs)
    }
}

// -- Expressions (precedence: or < and < not < comparison) ------------------

fn unary(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    if opt(alt(('!'.void(), keyword("not"))))
        .parse_next(input)?
        .is_some()
    {
        let inner = descend(input, depth)?;
        let operand = cut_err(|i: &mut &str| unary(i, inner)).parse_next(input)?;
        Ok(Expr::Not(Box::new(operand)))
    } else {
        comparison(input, depth)
    }
}

fn and_op(input: &mut &str) -> ModalResult<()> {
    ws.parse_next(input)?;
    alt(("&&".void(), keyword("and"))).parse_next(input)
}

fn or_op(input: &mut &str) -> ModalResult<()> {
    ws.parse_next(input)?;
    alt(("||".void(), keyword("or"))).parse_next(input)
}

fn and_expr(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    let first = unary(input, depth)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded(and_op, cut_err(|i: &mut &str| unary(i, depth))))
            .parse_next(input)?;
    Ok(rest.into_iter().fold(first, Expr::and))
}

fn or_expr(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    let first = and_expr(input, depth)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded(or_op, cut_err(|i: &mut &str| and_expr(i, depth))))
            .parse_next(input)?;
    Ok(rest.into_iter().fold(first, Expr::or))
}

fn expr(input: &mut &str, depth: usize) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    or_expr(input, depth)
}

// -- Top-level parser -------------------------------------------------------

pub fn condition(input: &mut &str) -> ModalResult<Expr> {
    let parsed = expr(input, 0)?;
    ws.parse_next(input)?;
    Ok(parsed)
}

use std::fmt;

use super::input_type::InputType;

/// Comparison operators of the condition language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `~=`, regular-expression match against a pattern literal.
    Match,
}

impl CompareOp {
    /// Whether a comparison with this operator against a number literal makes the
    /// other operand numeric.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(self, CompareOp::Match)
    }
}

/// Binary logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Condition AST produced by [`parse_condition`](crate::parse::parse_condition).
///
/// Literals keep their source spelling so that rendering does not reformat numbers.
/// `Paren` records explicit grouping from the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Number(String),
    Str(String),
    /// `input:<name>`, with the type asserted for it once inference has run.
    Input {
        name: String,
        ty: Option<InputType>,
    },
    /// `group:<name>`.
    GroupRef(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Compare {
        lhs: Box<Expr>,
        op: CompareOp,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Paren(Box<Expr>),
}

impl Expr {
    #[must_use]
    pub fn input(name: &str) -> Expr {
        Expr::Input {
            name: name.to_owned(),
            ty: None,
        }
    }

    #[must_use]
    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call {
            name: name.to_owned(),
            args,
        }
    }

    #[must_use]
    pub fn compare(lhs: Expr, op: CompareOp, rhs: Expr) -> Expr {
        Expr::Compare {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::Logical {
            op: LogicalOp::And,
            lhs: Box::new(self),
            rhs: Box::new(other),
        }
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Logical {
            op: LogicalOp::Or,
            lhs: Box::new(self),
            rhs: Box::new(other),
        }
    }

    /// Visit every node, children before parents.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        match self {
            Expr::Call { args, .. } => {
                for arg in args.iter_mut() {
                    arg.walk_mut(f);
                }
            }
            Expr::Compare { lhs, rhs, .. } | Expr::Logical { lhs, rhs, .. } => {
                lhs.walk_mut(f);
                rhs.walk_mut(f);
            }
            Expr::Not(inner) | Expr::Paren(inner) => inner.walk_mut(f),
            Expr::Bool(_)
            | Expr::Number(_)
            | Expr::Str(_)
            | Expr::Input { .. }
            | Expr::GroupRef(_) => {}
        }
        f(self);
    }

    /// Visit every node, children before parents.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Compare { lhs, rhs, .. } | Expr::Logical { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Not(inner) | Expr::Paren(inner) => inner.walk(f),
            Expr::Bool(_)
            | Expr::Number(_)
            | Expr::Str(_)
            | Expr::Input { .. }
            | Expr::GroupRef(_) => {}
        }
        f(self);
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Match => write!(f, "~="),
        }
    }
}

/// Renders the expression back in condition-language syntax.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool(v) => write!(f, "{v}"),
            Expr::Number(raw) => write!(f, "{raw}"),
            Expr::Str(s) => write!(f, "'{s}'"),
            Expr::Input { name, .. } => write!(f, "input:{name}"),
            Expr::GroupRef(name) => write!(f, "group:{name}"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Compare { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Expr::Logical { op, lhs, rhs } => match op {
                LogicalOp::And => write!(f, "{lhs} and {rhs}"),
                LogicalOp::Or => write!(f, "{lhs} or {rhs}"),
            },
            Expr::Not(inner) => write!(f, "not {inner}"),
            Expr::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

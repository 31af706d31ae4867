use std::fmt::Write;

use crate::types::escape;
use crate::{Expr, InputType, LogicalOp};

/// Runtime binding for an input read with a type assertion.
pub(crate) fn input_binding(name: &str, ty: InputType) -> String {
    format!("context.input[\"{}\"] as {ty}", escape(name))
}

/// Render a fully rewritten condition in the target expression syntax.
///
/// Inputs that were never typed render as `String`.
pub(crate) fn render(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(expr, &mut out);
    out
}

fn write_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Bool(v) => {
            let _ = write!(out, "{v}");
        }
        Expr::Number(raw) => out.push_str(raw),
        Expr::Str(s) | Expr::GroupRef(s) => {
            let _ = write!(out, "\"{}\"", escape(s));
        }
        Expr::Input { name, ty } => {
            out.push_str(&input_binding(name, ty.unwrap_or(InputType::String)));
        }
        Expr::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(arg, out);
            }
            out.push(')');
        }
        Expr::Compare { lhs, op, rhs } => {
            write_expr(lhs, out);
            let _ = write!(out, " {op} ");
            write_expr(rhs, out);
        }
        Expr::Logical { op, lhs, rhs } => {
            write_expr(lhs, out);
            out.push_str(match op {
                LogicalOp::And => " && ",
                LogicalOp::Or => " || ",
            });
            write_expr(rhs, out);
        }
        Expr::Not(inner) => {
            out.push('!');
            write_expr(inner, out);
        }
        Expr::Paren(inner) => {
            out.push('(');
            write_expr(inner, out);
            out.push(')');
        }
    }
}

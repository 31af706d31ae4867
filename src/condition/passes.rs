//! Rewrite passes over a parsed condition.
//!
//! The passes run in a fixed order; later passes rely on the call names and
//! arguments produced by earlier ones.

use tracing::debug;

use crate::{CompileError, Expr, InputType, TypeRegistry};

/// `<lhs> ~= <pattern>` becomes `match(<lhs>, <pattern>)`.
pub(crate) fn rewrite_match(expr: &mut Expr) {
    expr.walk_mut(&mut |e| {
        if let Expr::Compare {
            op: crate::CompareOp::Match,
            lhs,
            rhs,
        } = e
        {
            let lhs = std::mem::replace(lhs.as_mut(), Expr::Bool(false));
            let rhs = std::mem::replace(rhs.as_mut(), Expr::Bool(false));
            *e = Expr::call("match", vec![lhs, rhs]);
        }
    });
}

/// `concat(...)` becomes `concatString(...)`.
pub(crate) fn rewrite_concat(expr: &mut Expr) {
    expr.walk_mut(&mut |e| {
        if let Expr::Call { name, .. } = e {
            if name == "concat" {
                *name = "concatString".to_owned();
            }
        }
    });
}

/// `contains(group:<g>, ...)` becomes `groupContains("<rule group>", "<g>", ...)`.
pub(crate) fn rewrite_group_contains(expr: &mut Expr, rule_group: &str) {
    expr.walk_mut(&mut |e| {
        if let Expr::Call { name, args } = e {
            if name == "contains" && matches!(args.first(), Some(Expr::GroupRef(_))) {
                let Expr::GroupRef(group) = args.remove(0) else {
                    return;
                };
                args.insert(0, Expr::Str(group));
                args.insert(0, Expr::Str(rule_group.to_owned()));
                *name = "groupContains".to_owned();
            }
        }
    });
}

/// Append the rule group's seed to `randomPerc(pct, key)` and
/// `randomPercRange(lo, hi, key)`. Returns the number of calls rewritten.
pub(crate) fn inject_seeds(expr: &mut Expr, seed: u64) -> usize {
    let mut injected = 0;
    expr.walk_mut(&mut |e| {
        if let Expr::Call { name, args } = e {
            let arity = match name.as_str() {
                "randomPerc" => 2,
                "randomPercRange" => 3,
                _ => return,
            };
            if args.len() == arity {
                args.push(Expr::Number(seed.to_string()));
                injected += 1;
            }
        }
    });
    injected
}

/// Type every input compared against a number literal as `Float64`, everywhere it
/// appears in the condition.
pub(crate) fn infer_numeric_inputs(
    expr: &mut Expr,
    registry: &mut TypeRegistry,
    rule_group: &str,
) -> Result<(), CompileError> {
    let mut numeric: Vec<String> = Vec::new();
    expr.walk(&mut |e| {
        if let Expr::Compare { lhs, op, rhs } = e {
            if !op.is_numeric() {
                return;
            }
            let name = match (&**lhs, &**rhs) {
                (Expr::Input { name, .. }, Expr::Number(_))
                | (Expr::Number(_), Expr::Input { name, .. }) => name,
                _ => return,
            };
            if !numeric.contains(name) {
                numeric.push(name.clone());
            }
        }
    });

    for name in &numeric {
        declare(registry, rule_group, name, InputType::Float64)?;
    }

    expr.walk_mut(&mut |e| {
        if let Expr::Input { name, ty } = e {
            if numeric.contains(name) {
                *ty = Some(InputType::Float64);
            }
        }
    });
    Ok(())
}

/// Type every input left untyped as `String`.
///
/// Inputs that already carry a type are left alone, so running this twice changes
/// nothing.
pub(crate) fn cast_remaining_inputs(
    expr: &mut Expr,
    registry: &mut TypeRegistry,
    rule_group: &str,
) -> Result<(), CompileError> {
    let mut result = Ok(());
    expr.walk_mut(&mut |e| {
        if result.is_err() {
            return;
        }
        if let Expr::Input { name, ty: ty @ None } = e {
            result = declare(registry, rule_group, name, InputType::String);
            *ty = Some(InputType::String);
        }
    });
    result
}

pub(crate) fn declare(
    registry: &mut TypeRegistry,
    rule_group: &str,
    name: &str,
    ty: InputType,
) -> Result<(), CompileError> {
    match registry.declare(name, ty) {
        Ok(true) => {
            debug!(rule_group, input = name, %ty, "input type inferred");
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(previous) => Err(CompileError::TypeConflict {
            rule_group: rule_group.to_owned(),
            input: name.to_owned(),
            previous,
            found: ty,
        }),
    }
}

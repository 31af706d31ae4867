//! Condition compiler: turns a `_condition` string into a target boolean expression
//! and records the type of every input it reads.
//!
//! The structured dialect parses the condition and rewrites the AST in this order:
//!
//! 1. `a ~= 'p'` becomes `match(a, "p")`.
//! 2. `concat(..)` becomes `concatString(..)`.
//! 3. `contains(group:g, ..)` becomes `groupContains("<rule group>", "g", ..)`.
//! 4. The rule group's seed is appended to `randomPerc` and `randomPercRange`.
//! 5. Inputs compared against a number literal are typed `Float64`.
//! 6. Remaining inputs are typed `String`.
//!
//! Rendering then binds inputs to `context.input["name"] as <Type>`, double-quotes
//! string literals and spells the connectives `&&`, `||` and `!`.

mod legacy;
mod passes;
mod render;

use std::collections::BTreeMap;

use tracing::trace;

use crate::parse::parse_condition;
use crate::{CompileError, Dialect, Expr, InputType, TypeRegistry, Value};

pub(crate) use passes::declare;

/// A compiled condition and the inputs it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    /// Boolean expression in the target syntax.
    pub expression: String,
    /// Every input referenced by the condition, with the type it is read as.
    pub inputs: BTreeMap<String, InputType>,
    /// How many bucketing calls received the rule group's seed.
    pub seed_injections: usize,
}

/// Compile a `_condition` value.
///
/// Inferred input types are declared in `registry`, which is shared by every condition
/// of a rule group.
///
/// # Errors
///
/// - [`CompileError::InvalidConditionKind`] if `condition` is not a string.
/// - [`CompileError::ConditionSyntax`] if the structured dialect cannot parse it.
/// - [`CompileError::TypeConflict`] if an input was already registered with another
///   type.
pub fn compile_condition(
    condition: &Value,
    registry: &mut TypeRegistry,
    rule_group: &str,
    seed: u64,
    dialect: Dialect,
) -> Result<CompiledCondition, CompileError> {
    let Value::String(source) = condition else {
        return Err(CompileError::InvalidConditionKind {
            rule_group: rule_group.to_owned(),
            actual: condition.kind(),
        });
    };
    compile_condition_str(source, registry, rule_group, seed, dialect)
}

/// Compile condition source text.
///
/// # Errors
///
/// See [`compile_condition`].
pub fn compile_condition_str(
    source: &str,
    registry: &mut TypeRegistry,
    rule_group: &str,
    seed: u64,
    dialect: Dialect,
) -> Result<CompiledCondition, CompileError> {
    let compiled = match dialect {
        Dialect::Structured => compile_structured(source, registry, rule_group, seed)?,
        Dialect::Legacy => legacy::compile(source, registry, rule_group, seed)?,
    };
    trace!(rule_group, condition = source, expression = %compiled.expression, "condition compiled");
    Ok(compiled)
}

fn compile_structured(
    source: &str,
    registry: &mut TypeRegistry,
    rule_group: &str,
    seed: u64,
) -> Result<CompiledCondition, CompileError> {
    let mut expr = parse_condition(source).map_err(|err| CompileError::ConditionSyntax {
        rule_group: rule_group.to_owned(),
        condition: source.to_owned(),
        source: err,
    })?;

    passes::rewrite_match(&mut expr);
    passes::rewrite_concat(&mut expr);
    passes::rewrite_group_contains(&mut expr, rule_group);
    let seed_injections = passes::inject_seeds(&mut expr, seed);
    passes::infer_numeric_inputs(&mut expr, registry, rule_group)?;
    passes::cast_remaining_inputs(&mut expr, registry, rule_group)?;

    let mut inputs = BTreeMap::new();
    expr.walk(&mut |e| {
        if let Expr::Input { name, ty } = e {
            inputs.insert(name.clone(), ty.unwrap_or(InputType::String));
        }
    });

    Ok(CompiledCondition {
        expression: render::render(&expr),
        inputs,
        seed_injections,
    })
}

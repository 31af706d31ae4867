//! Resolution of the reserved `_config` and `_groups` keys of a rule-group
//! document, and of the inputs a lazy group must validate upfront.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{CompileError, GroupSpec, RequiredInput, RuleGroupConfig, TypeRegistry, Value};

/// Read `_config` into a [`RuleGroupConfig`], filling defaults for absent keys.
///
/// `default_condition` may be a string or a bool (`true` becomes `"true"`). `seed` must
/// be a non-negative integer; a float without a fractional part is accepted. Unknown
/// keys are ignored.
pub(crate) fn resolve_config(
    rule_group: &str,
    document: &BTreeMap<String, Value>,
) -> Result<RuleGroupConfig, CompileError> {
    let mut config = RuleGroupConfig::default();
    let Some(raw) = document.get("_config") else {
        return Ok(config);
    };
    let Value::Map(entries) = raw else {
        return Err(config_error(rule_group, "_config", "a map", raw));
    };

    for (key, value) in entries {
        match key.as_str() {
            "default_condition" => {
                config.default_condition = match value {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(config_error(rule_group, key, "a string or a bool", other));
                    }
                };
            }
            "seed" => config.seed = seed(rule_group, value)?,
            "flatten" => config.flatten = flag(rule_group, key, value)?,
            "keep_first" => config.keep_first = flag(rule_group, key, value)?,
            "lazy_evaluation" => config.lazy_evaluation = flag(rule_group, key, value)?,
            other => debug!(rule_group, key = other, "ignoring unknown _config key"),
        }
    }
    Ok(config)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seed(rule_group: &str, value: &Value) -> Result<u64, CompileError> {
    match *value {
        Value::Int(i) if i >= 0 => Ok(i.unsigned_abs()),
        Value::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(config_error(rule_group, "seed", "a non-negative integer", value)),
    }
}

fn flag(rule_group: &str, key: &str, value: &Value) -> Result<bool, CompileError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(config_error(rule_group, key, "a bool", other)),
    }
}

fn config_error(
    rule_group: &str,
    key: &str,
    expected: &'static str,
    found: &Value,
) -> CompileError {
    CompileError::ConfigTypeError {
        rule_group: rule_group.to_owned(),
        key: key.to_owned(),
        expected,
        actual: found.kind(),
    }
}

/// Read `_groups` into named group specs.
///
/// An array of strings is an inline member set and a string is a file path. Group
/// names starting with `_` are skipped.
pub(crate) fn resolve_groups(
    rule_group: &str,
    document: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, GroupSpec>, CompileError> {
    let mut groups = BTreeMap::new();
    let Some(raw) = document.get("_groups") else {
        return Ok(groups);
    };
    let Value::Map(entries) = raw else {
        return Err(config_error(rule_group, "_groups", "a map", raw));
    };

    for (name, value) in entries {
        if name.starts_with('_') {
            continue;
        }
        let spec = match value {
            Value::String(path) => GroupSpec::FileBacked(path.clone()),
            Value::List(items) => {
                let members = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_owned))
                    .collect::<Option<BTreeSet<String>>>()
                    .ok_or_else(|| shape_error(rule_group, name))?;
                GroupSpec::Inline(members)
            }
            _ => return Err(shape_error(rule_group, name)),
        };
        debug!(rule_group, group = %name, loader = ?spec.loader(), "group resolved");
        groups.insert(name.clone(), spec);
    }
    Ok(groups)
}

fn shape_error(rule_group: &str, group: &str) -> CompileError {
    CompileError::InvalidGroupShape {
        rule_group: rule_group.to_owned(),
        group: group.to_owned(),
    }
}

/// One descriptor per typed input when the group evaluates lazily, none otherwise.
pub(crate) fn required_inputs(
    rule_group: &str,
    config: &RuleGroupConfig,
    registry: &TypeRegistry,
) -> Vec<RequiredInput> {
    if !config.lazy_evaluation {
        return Vec::new();
    }
    registry
        .iter()
        .map(|(input, input_type)| RequiredInput {
            rule_group: rule_group.to_owned(),
            input: input.to_owned(),
            input_type,
        })
        .collect()
}

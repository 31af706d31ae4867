//! Text-rewrite condition dialect.
//!
//! Conditions are rewritten by a fixed cascade of regular-expression substitutions
//! over the raw text. Type casts are applied by plain substring replacement of the
//! input name, so a name that occurs inside another token is rewritten there too.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use super::passes::declare;
use super::render::input_binding;
use super::CompiledCondition;
use crate::{CompileError, InputType, TypeRegistry};

const FLOAT_MARKER: &str = ".(Float64)";
const STRING_MARKER: &str = ".(String)";

static ASSIGN_OR_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'[^']*'|==|!=|>=|<=|~=|=").unwrap());

static MATCH_OP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(input:[a-z0-9_-]+)\s*~=\s*'(.+)'").unwrap());

static CONCAT_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bconcat\(").unwrap());

/// The member argument may itself be a call or a quoted literal, e.g.
/// `contains(group:g, concatString(input:a,'-'))`.
static GROUP_CONTAINS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"contains\(\s*group:([a-z0-9_-]+)\s*,\s*([0-9a-zA-Z:_,()'."\[\]-]+)\s*\)"#)
        .unwrap()
});

static RANDOM_PERC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"randomPerc\(\s*([0-9]+)\s*,\s*([0-9a-z:_-]+)\s*\)").unwrap()
});

static RANDOM_PERC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"randomPercRange\(\s*([0-9]+)\s*,\s*([0-9]+)\s*,\s*([0-9a-z:_-]+)\s*\)").unwrap()
});

static NUMERIC_COMPARISON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"input:([a-z0-9_-]+)\s*(?:[<>]=?|==|!=)\s*-?[0-9]+").unwrap());

static INPUT_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"input:([a-z0-9_.-]+)").unwrap());

static TYPED_INPUT_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"input:([a-z0-9_-]+)(?:\.\((String|Float64|Bool)\))?").unwrap()
});

static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']*)'").unwrap());

pub(crate) fn compile(
    condition: &str,
    registry: &mut TypeRegistry,
    rule_group: &str,
    seed: u64,
) -> Result<CompiledCondition, CompileError> {
    let mut inputs = BTreeMap::new();

    let text = ASSIGN_OR_STRING.replace_all(condition, |caps: &Captures| {
        if &caps[0] == "=" {
            "==".to_owned()
        } else {
            caps[0].to_owned()
        }
    });
    let text = MATCH_OP.replace_all(&text, "match(${1},\"${2}\")");
    let text = CONCAT_CALL.replace_all(&text, "concatString(");
    let text = GROUP_CONTAINS.replace_all(&text, |caps: &Captures| {
        format!("groupContains(\"{rule_group}\",\"{}\",{})", &caps[1], &caps[2])
    });

    let seed_injections =
        RANDOM_PERC.find_iter(&text).count() + RANDOM_PERC_RANGE.find_iter(&text).count();
    let text = RANDOM_PERC.replace_all(&text, |caps: &Captures| {
        format!("randomPerc({},{},{seed})", &caps[1], &caps[2])
    });
    let text = RANDOM_PERC_RANGE.replace_all(&text, |caps: &Captures| {
        format!("randomPercRange({},{},{},{seed})", &caps[1], &caps[2], &caps[3])
    });
    let mut text = text.into_owned();

    let mut numeric: Vec<String> = Vec::new();
    for caps in NUMERIC_COMPARISON.captures_iter(&text) {
        let name = caps[1].to_owned();
        if !numeric.contains(&name) {
            numeric.push(name);
        }
    }
    for name in numeric {
        debug!(rule_group, input = %name, "casting numeric input");
        text = text.replace(&name, &format!("{name}{FLOAT_MARKER}"));
        declare(registry, rule_group, &name, InputType::Float64)?;
        inputs.insert(name, InputType::Float64);
    }

    let refs: Vec<String> = INPUT_REF
        .captures_iter(&text)
        .map(|caps| caps[1].to_owned())
        .collect();
    for name in refs {
        if name.contains('.') {
            continue;
        }
        let bare = format!("input:{name}");
        text = text
            .replace(&bare, &format!("{bare}{STRING_MARKER}"))
            .replace(".(String).(String)", STRING_MARKER);
        declare(registry, rule_group, &name, InputType::String)?;
        inputs.insert(name, InputType::String);
    }

    let text = TYPED_INPUT_REF.replace_all(&text, |caps: &Captures| {
        let ty = caps
            .get(2)
            .and_then(|m| InputType::from_name(m.as_str()))
            .unwrap_or(InputType::String);
        input_binding(&caps[1], ty)
    });
    let text = SINGLE_QUOTED.replace_all(&text, "\"${1}\"");
    let expression = text.replace(" and ", " && ").replace(" or ", " || ");

    Ok(CompiledCondition {
        expression,
        inputs,
        seed_injections,
    })
}

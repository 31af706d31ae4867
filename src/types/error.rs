use thiserror::Error;

use super::input_type::InputType;
use super::value::ValueKind;
use crate::parse::ParseError;

/// Errors that abort a compilation run.
///
/// Node ids and registration order are shared by the whole run, so none of these
/// are recoverable per node: the first one stops compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid non-string _condition of kind {actual} in rule group '{rule_group}'")]
    InvalidConditionKind {
        rule_group: String,
        actual: ValueKind,
    },

    #[error(
        "input '{input}' was defined as '{previous}' and is now being redefined as '{found}' in rule group '{rule_group}'"
    )]
    TypeConflict {
        rule_group: String,
        input: String,
        previous: InputType,
        found: InputType,
    },

    #[error("_config '{key}' in rule group '{rule_group}' must be {expected}, found {actual}")]
    ConfigTypeError {
        rule_group: String,
        key: String,
        expected: &'static str,
        actual: ValueKind,
    },

    #[error(
        "_groups '{group}' in rule group '{rule_group}' is neither an array of strings nor a string with a file path"
    )]
    InvalidGroupShape { rule_group: String, group: String },

    #[error("couldn't derive a valid rule group name from source '{source_name}'")]
    MissingGroupName { source_name: String },

    #[error("invalid condition \"{condition}\" in rule group '{rule_group}': {source}")]
    ConditionSyntax {
        rule_group: String,
        condition: String,
        #[source]
        source: ParseError,
    },

    #[error("rule group '{rule_group}' must be a map at the top level, found {actual}")]
    InvalidDocument {
        rule_group: String,
        actual: ValueKind,
    },

    #[error("duplicate rule group name '{name}'")]
    DuplicateRuleGroup { name: String },
}

impl CompileError {
    /// The rule group the error was raised in, when there is one.
    #[must_use]
    pub fn rule_group(&self) -> Option<&str> {
        match self {
            CompileError::InvalidConditionKind { rule_group, .. }
            | CompileError::TypeConflict { rule_group, .. }
            | CompileError::ConfigTypeError { rule_group, .. }
            | CompileError::InvalidGroupShape { rule_group, .. }
            | CompileError::ConditionSyntax { rule_group, .. }
            | CompileError::InvalidDocument { rule_group, .. } => Some(rule_group),
            CompileError::DuplicateRuleGroup { name } => Some(name),
            CompileError::MissingGroupName { .. } => None,
        }
    }
}

//! Rule-group source documents.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::{CompileError, RullerError, Value};

static GROUP_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_-]+$").unwrap());

/// Derive a rule-group name from a source path: the file stem, which must consist of
/// lowercase letters, digits, `_` and `-`.
///
/// # Errors
///
/// Returns [`CompileError::MissingGroupName`] when the stem is missing or contains
/// other characters.
///
/// ```
/// use std::path::Path;
/// use ruller_dsl::source::derive_group_name;
///
/// assert_eq!(derive_group_name(Path::new("/opt/rules/menu.json")).unwrap(), "menu");
/// assert!(derive_group_name(Path::new("/opt/rules/Menu.json")).is_err());
/// ```
pub fn derive_group_name(path: &Path) -> Result<String, CompileError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| GROUP_NAME.is_match(stem))
        .map(str::to_owned)
        .ok_or_else(|| CompileError::MissingGroupName {
            source_name: path.display().to_string(),
        })
}

/// Decode JSON text into a [`Value`].
///
/// # Errors
///
/// Returns the JSON syntax error.
pub fn parse_document(json: &str) -> Result<Value, serde_json::Error> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    Ok(Value::from(raw))
}

/// Read a JSON source file and derive its rule-group name.
///
/// # Errors
///
/// Returns [`RullerError`] on a bad file name, an I/O failure, or invalid JSON.
pub fn load_source(path: &Path) -> Result<(String, Value), RullerError> {
    let name = derive_group_name(path)?;
    let text = std::fs::read_to_string(path)?;
    let document = parse_document(&text)?;
    info!(rule_group = %name, path = %path.display(), "loaded rule group source");
    Ok((name, document))
}

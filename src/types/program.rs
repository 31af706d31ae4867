use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::config::RuleGroupConfig;
use super::error::CompileError;
use super::group::GroupSpec;
use super::input_type::InputType;
use super::node::RuleNode;
use super::type_registry::TypeRegistry;
use super::value::Value;

/// Which condition rewriting implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Parse conditions into an AST and rewrite it. Casts are anchored to `input:`
    /// references.
    #[default]
    Structured,
    /// Rewrite condition text with the historical regex cascade, including its
    /// unanchored substring casts.
    Legacy,
}

/// Options shared by every rule group of a compilation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub dialect: Dialect,
    /// Add each node's condition source to its output as `_condition_debug`.
    pub condition_debug: bool,
}

/// Validation descriptor for an input the runtime must receive upfront.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RequiredInput {
    pub rule_group: String,
    pub input: String,
    pub input_type: InputType,
}

/// A compiled rule group: resolved options, groups, input types and ordered nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroupSpec {
    pub name: String,
    pub config: RuleGroupConfig,
    pub groups: BTreeMap<String, GroupSpec>,
    /// Types of every input read by this group's conditions.
    pub type_registry: TypeRegistry,
    /// Empty unless `config.lazy_evaluation` is set.
    pub required_inputs: Vec<RequiredInput>,
    /// Nodes in pre-order.
    pub nodes: Vec<RuleNode>,
}

/// One entry of the runtime registration sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration<'a> {
    pub rule_group: &'a str,
    pub node: String,
    pub parent: Option<String>,
}

/// Builder for a compilation run over several rule-group documents.
///
/// # Example
///
/// ```
/// use ruller_dsl::{ProgramBuilder, source};
///
/// let menu = source::parse_document(r#"{
///     "_config": { "seed": 42 },
///     "label": "root",
///     "_items": [ { "_condition": "input:age > 30", "label": "adults" } ]
/// }"#).unwrap();
///
/// let program = ProgramBuilder::new().rule_group("menu", menu).compile().unwrap();
/// let nodes = program.nodes();
/// assert_eq!(nodes.len(), 2);
/// assert_eq!(nodes[1].compiled_condition, r#"context.input["age"] as Float64 > 30"#);
/// ```
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    sources: Vec<(String, Value)>,
    options: CompileOptions,
}

impl ProgramBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoded rule-group document under `name`.
    #[must_use]
    pub fn rule_group(mut self, name: &str, document: Value) -> Self {
        self.sources.push((name.to_owned(), document));
        self
    }

    /// Read and decode a JSON file, naming the rule group after the file stem.
    ///
    /// # Errors
    ///
    /// Returns [`RullerError`](crate::RullerError) on I/O or JSON failure, or when no
    /// rule group name can be derived from the path.
    pub fn source_file(mut self, path: impl AsRef<Path>) -> Result<Self, crate::RullerError> {
        let (name, document) = crate::source::load_source(path.as_ref())?;
        self.sources.push((name, document));
        Ok(self)
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.options.dialect = dialect;
        self
    }

    #[must_use]
    pub fn condition_debug(mut self, enabled: bool) -> Self {
        self.options.condition_debug = enabled;
        self
    }

    /// Compile every added rule group, in name order.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] encountered.
    pub fn compile(self) -> Result<Program, CompileError> {
        crate::compile::compile(self.sources, self.options)
    }
}

/// The result of a compilation run, ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(crate) rule_groups: Vec<RuleGroupSpec>,
    pub(crate) types: TypeRegistry,
}

impl Program {
    /// Compile a single JSON document as rule group `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RullerError`](crate::RullerError) on JSON or compile failure.
    pub fn from_json_str(name: &str, json: &str) -> Result<Self, crate::RullerError> {
        let document = crate::source::parse_document(json)?;
        Ok(ProgramBuilder::new().rule_group(name, document).compile()?)
    }

    /// Load and compile a set of JSON files with default options.
    ///
    /// # Errors
    ///
    /// Returns [`RullerError`](crate::RullerError) on I/O, JSON, naming, or compile
    /// failure.
    pub fn from_files<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, crate::RullerError> {
        let mut builder = ProgramBuilder::new();
        for path in paths {
            builder = builder.source_file(path)?;
        }
        Ok(builder.compile()?)
    }

    /// Rule groups sorted by name.
    #[must_use]
    pub fn rule_groups(&self) -> &[RuleGroupSpec] {
        &self.rule_groups
    }

    #[must_use]
    pub fn rule_group(&self, name: &str) -> Option<&RuleGroupSpec> {
        self.rule_groups.iter().find(|g| g.name == name)
    }

    /// Every node of every rule group, in id order.
    #[must_use]
    pub fn nodes(&self) -> Vec<&RuleNode> {
        self.rule_groups.iter().flat_map(|g| g.nodes.iter()).collect()
    }

    /// Input types inferred across the whole run.
    #[must_use]
    pub fn input_types(&self) -> &TypeRegistry {
        &self.types
    }

    /// The order in which nodes must be registered with the runtime: every parent
    /// comes before its children.
    #[must_use]
    pub fn registration_order(&self) -> Vec<Registration<'_>> {
        self.nodes()
            .into_iter()
            .map(|n| Registration {
                rule_group: &n.rule_group,
                node: n.registration_name(),
                parent: n.parent.map(|p| p.to_string()),
            })
            .collect()
    }
}

#[cfg(feature = "binary-cache")]
impl Program {
    /// Serialize this compiled program to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the payload
    /// metadata so callers can tell when the sources changed.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a program previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on format,
    /// integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on encoding or I/O
    /// failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on I/O, format,
    /// integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Program({} rule groups, {} nodes, {} inputs)",
            self.rule_groups.len(),
            self.rule_groups.iter().map(|g| g.nodes.len()).sum::<usize>(),
            self.types.len(),
        )
    }
}

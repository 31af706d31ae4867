use std::collections::BTreeMap;

use super::output::OutputPlan;
use super::value::Value;

/// One compiled targeting rule.
///
/// Nodes are produced in pre-order: a node's `id` is greater than its parent's and
/// smaller than the id of every one of its descendants. Ids are allocated from a
/// counter shared by every rule group of a compilation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    pub id: u32,
    /// `None` for the root node of a rule group.
    pub parent: Option<u32>,
    pub rule_group: String,
    /// Condition source as written, or the group's default condition.
    pub condition_source: String,
    /// Whether `condition_source` came from the node's own `_condition`.
    pub explicit_condition: bool,
    /// Target boolean expression produced by the condition compiler.
    pub compiled_condition: String,
    /// Non-reserved keys of the node definition.
    pub static_attributes: BTreeMap<String, Value>,
    pub output: OutputPlan,
}

impl RuleNode {
    /// Parent id in the registration wire form, `-1` for roots.
    #[must_use]
    pub fn parent_id(&self) -> i64 {
        self.parent.map_or(-1, i64::from)
    }

    /// Name the node is registered under in the runtime.
    #[must_use]
    pub fn registration_name(&self) -> String {
        self.id.to_string()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

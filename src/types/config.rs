/// Seed used for percentage bucketing when `_config.seed` is absent.
pub const DEFAULT_SEED: u64 = 1234;

/// Condition compiled for nodes without an explicit `_condition`.
pub const DEFAULT_CONDITION: &str = "true";

/// Resolved per-rule-group options read from the document's `_config` map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleGroupConfig {
    /// Seed appended to every `randomPerc`/`randomPercRange` call of the group.
    pub seed: u64,
    /// Condition source used for nodes that do not declare one.
    pub default_condition: String,
    /// Merge the outputs of every matching node instead of taking one.
    pub flatten: bool,
    /// Stop at the first matching sibling.
    pub keep_first: bool,
    /// Defer required-input validation to first access.
    pub lazy_evaluation: bool,
}

impl Default for RuleGroupConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            default_condition: DEFAULT_CONDITION.to_owned(),
            flatten: false,
            keep_first: true,
            lazy_evaluation: false,
        }
    }
}

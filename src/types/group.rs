use std::collections::BTreeSet;

/// A named identifier set used by `contains(group:<name>, ...)` conditions.
///
/// File-backed groups are only recorded here; the runtime reads the file when it loads
/// the compiled program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupSpec {
    Inline(BTreeSet<String>),
    FileBacked(String),
}

/// How the runtime should register a group when the program is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLoader {
    /// Members passed as an array literal.
    Array,
    /// Members read from a file, one per line.
    File,
}

impl GroupSpec {
    #[must_use]
    pub fn loader(&self) -> GroupLoader {
        match self {
            GroupSpec::Inline(_) => GroupLoader::Array,
            GroupSpec::FileBacked(_) => GroupLoader::File,
        }
    }

    /// Inline members, or `None` for a file-backed group.
    #[must_use]
    pub fn members(&self) -> Option<&BTreeSet<String>> {
        match self {
            GroupSpec::Inline(members) => Some(members),
            GroupSpec::FileBacked(_) => None,
        }
    }
}

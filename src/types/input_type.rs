use std::fmt;

/// Primitive type asserted for a request input when it is read by a compiled condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum InputType {
    String,
    Float64,
    Bool,
}

impl InputType {
    /// The name used for this type in emitted code and in required-input descriptors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            InputType::String => "String",
            InputType::Float64 => "Float64",
            InputType::Bool => "Bool",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(InputType::String),
            "Float64" => Some(InputType::Float64),
            "Bool" => Some(InputType::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

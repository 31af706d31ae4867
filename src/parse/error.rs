use std::fmt;

/// A condition that could not be parsed, with the byte offset where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    offset: usize,
    detail: String,
}

impl ParseError {
    pub(crate) fn at(offset: usize, detail: impl Into<String>) -> Self {
        Self {
            offset,
            detail: detail.into(),
        }
    }

    /// Byte offset into the condition source.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "unexpected input at offset {}", self.offset)
        } else {
            write!(f, "{} at offset {}", self.detail, self.offset)
        }
    }
}

impl std::error::Error for ParseError {}

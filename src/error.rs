use thiserror::Error;

use crate::CompileError;

/// Unified error type covering compilation, JSON decoding, and I/O.
///
/// Returned by convenience methods like
/// [`Program::from_json_str()`](crate::Program::from_json_str) and
/// [`Program::from_files()`](crate::Program::from_files).
#[derive(Debug, Error)]
pub enum RullerError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

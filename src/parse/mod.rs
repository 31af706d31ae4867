mod error;
mod grammar;

pub use error::ParseError;

use crate::Expr;

/// Parse a condition string into an [`Expr`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid condition.
pub fn parse_condition(input: &str) -> Result<Expr, ParseError> {
    use winnow::Parser;
    grammar::condition
        .parse(input)
        .map_err(|e| ParseError::at(e.offset(), e.inner().to_string()))
}

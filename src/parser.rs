//! Program parser: comma separated arbitrary precision integers, usually one line of text.

use crate::error::ParseError;
use crate::types::Value;

/// Parse program text. Whitespace around values and a trailing newline are ignored.
pub fn parse_program(text: &str) -> Result<Vec<Value>, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    text.split(',')
        .enumerate()
        .map(|(index, token)| {
            token
                .trim()
                .parse::<Value>()
                .map_err(|_| ParseError::InvalidValue {
                    index,
                    token: token.trim().to_string(),
                })
        })
        .collect()
}

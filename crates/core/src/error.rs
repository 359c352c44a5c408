use serde::Serialize;

use crate::position::Position;

/// The first unexpected token or character of a strict parse.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("unexpected token '{text}' at {pos}")]
pub struct SyntaxError {
    /// The offending text; empty for an unexpected end of input.
    pub text: String,
    pub pos: Position,
    pub end_pos: Position,
}

impl SyntaxError {
    pub fn new(text: impl Into<String>, pos: Position, end_pos: Position) -> Self {
        SyntaxError {
            text: text.into(),
            pos,
            end_pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_text_and_position() {
        let err = SyntaxError::new("%", Position::new(2, 4), Position::new(2, 5));
        assert_eq!(err.to_string(), "unexpected token '%' at 2:4");
    }
}

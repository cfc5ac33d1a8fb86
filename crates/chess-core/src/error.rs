use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Illegal move '{token}' at ply {ply}")]
    IllegalMove { ply: usize, token: String },

    #[error("Unreadable token '{token}' at ply {ply}")]
    InvalidToken { ply: usize, token: String },

    #[error("Unreadable PGN: {0}")]
    Read(String),

    #[error("Unterminated variation in movetext")]
    UnterminatedVariation,
}

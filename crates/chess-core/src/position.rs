//! Position strings: rendering and small queries on FEN text.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode};

use crate::error::ParseError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Render a position as the normalized string used for all position matching.
pub fn position_string(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Parse a FEN into a playable standard-chess position.
pub fn setup_position(fen: &str) -> Result<Chess, ParseError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidFen(fen.to_string()))?;

    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|_| ParseError::InvalidFen(fen.to_string()))
}

/// Side to move of a FEN string, as a display word.
pub fn side_to_move(fen: &str) -> &'static str {
    match fen.split_whitespace().nth(1) {
        Some("b") => "Black",
        _ => "White",
    }
}

//! Finds a remembered position inside a newly loaded game.

use chess_core::{MoveIndex, NotationDocument, START_INDEX};

/// First move index whose position equals `target` exactly.
pub fn find_index(positions: &[String], target: &str) -> Option<MoveIndex> {
    positions
        .iter()
        .position(|p| p == target)
        .map(|offset| offset as MoveIndex - 1)
}

/// Move index in `document` showing `target`, or the start of the game when
/// the position never occurs.
pub fn resolve(target: &str, document: &NotationDocument) -> MoveIndex {
    match find_index(&document.positions, target) {
        Some(index) => index,
        None => {
            tracing::debug!(position = target, "Position not found in new game, starting from the beginning");
            START_INDEX
        }
    }
}

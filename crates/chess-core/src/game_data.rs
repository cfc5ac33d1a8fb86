use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Navigation index into a parsed game: `-1` is the starting position,
/// `i` is the position after ply `i + 1`.
pub type MoveIndex = i32;

/// The index of the starting position.
pub const START_INDEX: MoveIndex = -1;

/// A `{ ... }` comment embedded in the movetext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgnComment {
    /// Index of the ply the comment follows (`-1` when before the first move).
    pub move_index: MoveIndex,
    pub text: String,
}

/// A parsed PGN game. Immutable once built by [`crate::pgn::parse_pgn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotationDocument {
    pub raw_text: String,
    pub headers: BTreeMap<String, String>,
    /// `positions[0]` is the initial position, `positions[i]` the position
    /// after ply `i`.
    pub positions: Vec<String>,
    /// SAN of each played ply, `moves.len() == positions.len() - 1`.
    pub moves: Vec<String>,
    pub comments: Vec<PgnComment>,
}

impl NotationDocument {
    /// Number of plies played in the game.
    pub fn plies(&self) -> usize {
        self.moves.len()
    }

    /// Highest valid move index (`-1` for a game without moves).
    pub fn last_index(&self) -> MoveIndex {
        self.plies() as MoveIndex - 1
    }

    pub fn contains_index(&self, index: MoveIndex) -> bool {
        (START_INDEX..=self.last_index()).contains(&index)
    }

    /// Position shown at a move index.
    pub fn position_at(&self, index: MoveIndex) -> Option<&str> {
        if !self.contains_index(index) {
            return None;
        }
        self.positions
            .get((index + 1) as usize)
            .map(String::as_str)
    }

    /// SAN of the ply that led to the position at `index`.
    pub fn move_at(&self, index: MoveIndex) -> Option<&str> {
        if index < 0 {
            return None;
        }
        self.moves.get(index as usize).map(String::as_str)
    }

    pub fn initial_position(&self) -> &str {
        self.positions.first().map(String::as_str).unwrap_or_default()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Inline PGN comments attached to a move index, in document order.
    pub fn comments_at(&self, index: MoveIndex) -> impl Iterator<Item = &PgnComment> {
        self.comments.iter().filter(move |c| c.move_index == index)
    }

    pub fn info(&self) -> GameInfo {
        GameInfo::from_headers(&self.headers)
    }

    /// "Move k / N" label for a move index.
    pub fn move_label(&self, index: MoveIndex) -> String {
        format!("Move: {} / {}", index + 1, self.plies())
    }
}

/// Header values for display, with fallbacks for missing tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub event: String,
    pub site: String,
    pub date: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub eco: String,
}

impl GameInfo {
    pub fn from_headers(headers: &BTreeMap<String, String>) -> Self {
        let get = |key: &str, fallback: &str| {
            headers
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            event: get("Event", "Unknown Event"),
            site: get("Site", "Unknown Site"),
            date: get("Date", "Unknown Date"),
            white: get("White", "Unknown White"),
            black: get("Black", "Unknown Black"),
            result: get("Result", "Unknown Result"),
            eco: get("ECO", "-"),
        }
    }
}

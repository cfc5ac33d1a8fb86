//! Result types for the two per-position lookups: cloud evaluation and the
//! masters opening explorer.

use serde::{Deserialize, Serialize};
use shakmaty::san::San;
use shakmaty::uci::UciMove;

use chess_core::position::setup_position;

/// One principal variation from a cloud evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvLine {
    /// Space-separated UCI moves.
    pub moves: String,
    #[serde(default)]
    pub cp: Option<i32>,
    #[serde(default)]
    pub mate: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudEval {
    pub fen: String,
    #[serde(default)]
    pub knodes: u64,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub pvs: Vec<PvLine>,
}

impl CloudEval {
    /// First move of the best line, in SAN on the evaluated position.
    pub fn suggested_move(&self) -> Option<String> {
        let uci = self.pvs.first()?.moves.split_whitespace().next()?;
        let pos = setup_position(&self.fen).ok()?;
        let uci_move: UciMove = uci.parse().ok()?;
        let legal_move = uci_move.to_move(&pos).ok()?;
        Some(San::from_move(&pos, legal_move).to_string())
    }

    /// Best-line score in pawns, when it is not a mate score.
    pub fn score(&self) -> Option<f64> {
        self.pvs.first()?.cp.map(|cp| f64::from(cp) / 100.0)
    }

    pub fn summary(&self) -> String {
        let nodes = (self.knodes as f64 / 1000.0).round() as u64;
        format!("Depth: {} | Nodes: {}M", self.depth, nodes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerMove {
    pub uci: String,
    pub san: String,
    #[serde(default)]
    pub white: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub black: u64,
    #[serde(default)]
    pub average_rating: Option<u32>,
}

impl ExplorerMove {
    pub fn games(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlayer {
    pub name: String,
    #[serde(default)]
    pub rating: Option<u32>,
}

/// A master game that reached the explored position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopGame {
    pub id: String,
    #[serde(default)]
    pub winner: Option<String>,
    pub white: GamePlayer,
    pub black: GamePlayer,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub month: Option<String>,
    /// Move played from the explored position.
    #[serde(default)]
    pub uci: Option<String>,
}

impl TopGame {
    pub fn result(&self) -> &'static str {
        match self.winner.as_deref() {
            Some("white") => "1-0",
            Some("black") => "0-1",
            _ => "½-½",
        }
    }

    pub fn label(&self) -> String {
        let player = |p: &GamePlayer| match p.rating {
            Some(rating) => format!("{} ({})", p.name, rating),
            None => p.name.clone(),
        };
        format!("{} vs {} {}", player(&self.white), player(&self.black), self.result())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerResponse {
    #[serde(default)]
    pub white: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub black: u64,
    #[serde(default)]
    pub moves: Vec<ExplorerMove>,
    #[serde(default)]
    pub top_games: Vec<TopGame>,
}

impl ExplorerResponse {
    pub fn total_games(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

//! Saved viewing sessions.
//!
//! A snapshot keeps the notation text rather than the derived positions, so
//! restoring it re-parses and lands on the remembered position.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;
use crate::session::GameRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub game: GameRef,
    pub pgn: String,
    /// Explicit starting position the game was loaded with, if any.
    pub initial_fen: Option<String>,
    /// Position string that was on the board.
    pub position: Option<String>,
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<SessionSnapshot, ViewerError> {
    let file = File::open(path).map_err(|e| ViewerError::Snapshot(e.to_string()))?;
    let reader = BufReader::new(file);
    let snapshot: SessionSnapshot =
        bincode::deserialize_from(reader).map_err(|e| ViewerError::Snapshot(e.to_string()))?;
    Ok(snapshot)
}

pub fn save_snapshot<P: AsRef<Path>>(snapshot: &SessionSnapshot, path: P) -> Result<(), ViewerError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ViewerError::Snapshot(e.to_string()))?;
    }
    let file = File::create(path).map_err(|e| ViewerError::Snapshot(e.to_string()))?;
    bincode::serialize_into(BufWriter::new(file), snapshot)
        .map_err(|e| ViewerError::Snapshot(e.to_string()))?;
    tracing::debug!(path = %path.display(), "Session snapshot saved");
    Ok(())
}

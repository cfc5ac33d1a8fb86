//! Groups comments and annotations under the move index whose position they
//! reference.
//!
//! Matching is exact string equality on the position, and content whose
//! position does not occur in the game is left out of the grouping. The
//! grouping is always rebuilt from scratch after content changes.

use std::collections::BTreeMap;

use chess_core::MoveIndex;
use serde::Serialize;

use crate::content::{Annotation, Comment};
use crate::resolver::find_index;

/// Everything attached to one position of the current game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotatedPosition {
    pub comments: Vec<Comment>,
    pub annotations: Vec<Annotation>,
}

impl AnnotatedPosition {
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.annotations.is_empty()
    }
}

pub type Bindings = BTreeMap<MoveIndex, AnnotatedPosition>;

/// Build the index → content grouping for `positions`. Within a group,
/// items keep the order they arrived in.
pub fn bind(positions: &[String], comments: &[Comment], annotations: &[Annotation]) -> Bindings {
    let mut bindings = Bindings::new();

    for comment in comments {
        let Some(position) = comment.position.as_deref() else {
            tracing::debug!(comment_id = comment.id, "Comment has no position, not bound");
            continue;
        };
        match find_index(positions, position) {
            Some(index) => bindings.entry(index).or_default().comments.push(comment.clone()),
            None => tracing::debug!(
                comment_id = comment.id,
                position,
                "Comment position not in this game, not bound"
            ),
        }
    }

    for annotation in annotations {
        let position = annotation.target.position.as_str();
        match find_index(positions, position) {
            Some(index) => bindings.entry(index).or_default().annotations.push(annotation.clone()),
            None => tracing::debug!(
                annotation_id = annotation.id,
                position,
                "Annotation position not in this game, not bound"
            ),
        }
    }

    bindings
}

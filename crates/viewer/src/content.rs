//! User content attached to positions: comments and W3C-style annotations.
//!
//! Wire records mirror the content API payloads; the domain types are what
//! the binder groups by position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment from the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "username", default)]
    pub author: String,
    pub text: String,
    /// Position the comment is about, if any.
    #[serde(rename = "fen", default)]
    pub position: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationTarget {
    /// URI of the game the annotation was written against.
    pub document_source: String,
    pub position: String,
    pub move_number: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub target: AnnotationTarget,
}

impl Annotation {
    /// Whether `user` gets edit/delete affordances. The store enforces
    /// the real permission.
    pub fn is_editable_by(&self, user: Option<&str>) -> bool {
        user.is_some_and(|u| u == self.author)
    }
}

// ---- W3C annotation wire format ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: i64,
    #[serde(rename = "type", default = "default_annotation_type")]
    pub kind: String,
    #[serde(alias = "username", default)]
    pub creator: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub body: AnnotationBody,
    pub target: TargetRecord,
    #[serde(default)]
    pub motivation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRecord {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub source: String,
    pub state: TargetState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetState {
    pub fen: String,
    #[serde(default)]
    pub move_number: Option<i32>,
}

fn default_annotation_type() -> String {
    "Annotation".to_string()
}

impl From<AnnotationRecord> for Annotation {
    fn from(r: AnnotationRecord) -> Self {
        Self {
            id: r.id,
            author: r.creator,
            text: r.body.value,
            created_at: r.created,
            modified_at: r.modified,
            target: AnnotationTarget {
                document_source: r.target.source,
                position: r.target.state.fen,
                move_number: r.target.state.move_number,
            },
        }
    }
}

/// Payload for creating an annotation on the current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnotation {
    #[serde(skip)]
    pub game_id: String,
    pub fen: String,
    pub move_number: i32,
    pub text: String,
}

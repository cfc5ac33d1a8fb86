//! Outbound services the viewing session depends on.
//!
//! Methods return `impl Future + Send` so sessions can drive them from
//! spawned tasks.

use std::future::Future;

use crate::content::{Annotation, Comment, NewAnnotation};
use crate::error::FetchError;
use crate::evaluation::{CloudEval, ExplorerResponse};

pub mod content_api;
pub mod lichess;

pub use content_api::ContentApiClient;
pub use lichess::LichessClient;

/// Per-position lookups and master game retrieval.
pub trait PositionService: Send + Sync + 'static {
    fn explore(
        &self,
        fen: &str,
    ) -> impl Future<Output = Result<ExplorerResponse, FetchError>> + Send;

    fn cloud_eval(&self, fen: &str) -> impl Future<Output = Result<CloudEval, FetchError>> + Send;

    fn master_game_pgn(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// The store that owns comments and annotations.
pub trait ContentStore: Send + Sync + 'static {
    fn fetch_comments(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Vec<Comment>, FetchError>> + Send;

    fn fetch_annotations(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Vec<Annotation>, FetchError>> + Send;

    fn create_annotation(
        &self,
        annotation: &NewAnnotation,
    ) -> impl Future<Output = Result<Annotation, FetchError>> + Send;

    fn update_annotation(
        &self,
        annotation_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<Annotation, FetchError>> + Send;

    fn delete_annotation(
        &self,
        annotation_id: i64,
    ) -> impl Future<Output = Result<(), FetchError>> + Send;
}

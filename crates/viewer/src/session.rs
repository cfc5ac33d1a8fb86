//! A single viewing session: one loaded game, its navigation state, the
//! content bound to its positions and the per-position lookup caches.
//!
//! Every document load bumps a generation counter. Autoplay ticks and
//! content fetches capture the generation they were started under and become
//! no-ops once it has moved on, so a swapped or torn-down game never receives
//! late results. Of several overlapping content fetches, only the most
//! recently issued one is applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chess_core::position::side_to_move;
use chess_core::{parse_pgn_from, MoveIndex, NotationDocument, START_INDEX};
use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::binder::{bind, AnnotatedPosition, Bindings};
use crate::clients::{ContentStore, PositionService};
use crate::config::Config;
use crate::content::{Annotation, Comment, NewAnnotation};
use crate::error::ViewerError;
use crate::evaluation::{CloudEval, ExplorerResponse};
use crate::navigation::{NavState, Navigator, Tick};
use crate::position_cache::{CacheStatus, PositionCache};
use crate::resolver::resolve;
use crate::snapshot::SessionSnapshot;

/// Which game is on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameRef {
    /// A game from the content store, addressed by its store id.
    Archive(String),
    /// A masters database game, addressed by its 8-character id.
    Master(String),
}

impl GameRef {
    pub fn id(&self) -> &str {
        match self {
            GameRef::Archive(id) | GameRef::Master(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum ContentStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub autoplay_interval: Duration,
    pub current_user: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autoplay_interval: Duration::from_millis(2000),
            current_user: None,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            autoplay_interval: config.autoplay_interval(),
            current_user: config.current_user.clone(),
        }
    }
}

/// Everything the rendering layer needs for the current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub game: GameRef,
    pub position: String,
    pub move_index: MoveIndex,
    pub first_index: MoveIndex,
    pub last_index: MoveIndex,
    pub can_step_backward: bool,
    pub can_step_forward: bool,
    pub autoplay: bool,
    pub side_to_move: &'static str,
    pub last_move: Option<String>,
    pub move_label: String,
    pub annotated: AnnotatedPosition,
    pub pgn_comments: Vec<String>,
    pub content_status: ContentStatus,
    pub exploration: CacheStatus,
    pub evaluation: CacheStatus,
}

struct SessionState {
    generation: u64,
    load_request: u64,
    content_request: u64,
    game: Option<GameRef>,
    initial_fen: Option<String>,
    navigator: Navigator,
    comments: Vec<Comment>,
    annotations: Vec<Annotation>,
    bindings: Bindings,
    content_status: ContentStatus,
    autoplay_token: u64,
    autoplay_task: Option<AbortHandle>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            generation: 0,
            load_request: 0,
            content_request: 0,
            game: None,
            initial_fen: None,
            navigator: Navigator::new(),
            comments: Vec::new(),
            annotations: Vec::new(),
            bindings: Bindings::new(),
            content_status: ContentStatus::Idle,
            autoplay_token: 0,
            autoplay_task: None,
        }
    }

    fn cancel_autoplay(&mut self) {
        self.navigator.stop_autoplay();
        self.autoplay_token += 1;
        if let Some(task) = self.autoplay_task.take() {
            task.abort();
        }
    }

    fn clear_content(&mut self) {
        self.comments.clear();
        self.annotations.clear();
        self.bindings.clear();
        self.content_status = ContentStatus::Idle;
    }

    /// Swap in a new document. The autoplay timer is cancelled before any
    /// state is replaced.
    fn install(&mut self, game: GameRef, document: Arc<NotationDocument>, index: MoveIndex) {
        self.cancel_autoplay();
        self.generation += 1;
        self.navigator.load(document);
        self.navigator.go_to(index);
        self.game = Some(game);
        self.clear_content();
    }

    fn rebind(&mut self) {
        self.bindings = match self.navigator.document() {
            Some(doc) => bind(&doc.positions, &self.comments, &self.annotations),
            None => Bindings::new(),
        };
    }

    fn current_game_and_position(&self) -> Result<(GameRef, String, MoveIndex), ViewerError> {
        let game = self.game.clone().ok_or(ViewerError::NoGameLoaded)?;
        let position = self
            .navigator
            .current_position()
            .ok_or(ViewerError::NoGameLoaded)?
            .to_string();
        Ok((game, position, self.navigator.current_index()))
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Master game ids are exactly eight ASCII alphanumerics.
pub fn is_valid_master_game_id(id: &str) -> bool {
    id.len() == 8 && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub struct ViewingSession<C, P> {
    state: Arc<Mutex<SessionState>>,
    content: Arc<C>,
    positions: Arc<P>,
    exploration: PositionCache<ExplorerResponse>,
    evaluation: PositionCache<CloudEval>,
    options: SessionOptions,
}

impl<C: ContentStore, P: PositionService> ViewingSession<C, P> {
    pub fn new(content: C, positions: P, options: SessionOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            content: Arc::new(content),
            positions: Arc::new(positions),
            exploration: PositionCache::new("exploration"),
            evaluation: PositionCache::new("evaluation"),
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    // ---- Loading ----

    /// Load a game from scratch. Clears the position caches.
    pub fn load_game(&self, game: GameRef, pgn: &str) -> Result<(), ViewerError> {
        self.load_game_at(game, pgn, None, None).map(|_| ())
    }

    /// Load a game, optionally continuing from `initial_fen` and opening at
    /// the first occurrence of `target`. A parse failure leaves the session
    /// untouched.
    pub fn load_game_at(
        &self,
        game: GameRef,
        pgn: &str,
        initial_fen: Option<&str>,
        target: Option<&str>,
    ) -> Result<MoveIndex, ViewerError> {
        let document = parse_pgn_from(pgn, initial_fen)?;
        let index = target.map_or(START_INDEX, |t| resolve(t, &document));

        let mut state = self.lock();
        state.load_request += 1;
        state.install(game.clone(), Arc::new(document), index);
        state.initial_fen = initial_fen.map(str::to_string);
        self.exploration.clear();
        self.evaluation.clear();

        tracing::info!(
            game_id = game.id(),
            generation = state.generation,
            index,
            "Loaded game"
        );
        Ok(index)
    }

    /// Replace the current game with a master game, keeping the current
    /// position in view when the master game reaches it. Caches are kept.
    pub async fn switch_to_master_game(&self, master_id: &str) -> Result<MoveIndex, ViewerError> {
        if !is_valid_master_game_id(master_id) {
            return Err(ViewerError::InvalidMasterGameId);
        }

        let request = {
            let mut state = self.lock();
            state.load_request += 1;
            state.load_request
        };

        let pgn = self.positions.master_game_pgn(master_id).await?;
        let document = parse_pgn_from(&pgn, None)?;

        let mut state = self.lock();
        if state.load_request != request {
            tracing::debug!(master_id, "Discarding superseded master game load");
            return Err(ViewerError::Superseded);
        }

        let index = state
            .navigator
            .current_position()
            .map_or(START_INDEX, |target| resolve(target, &document));

        state.install(GameRef::Master(master_id.to_string()), Arc::new(document), index);
        state.initial_fen = None;

        tracing::info!(master_id, generation = state.generation, index, "Switched to master game");
        Ok(index)
    }

    /// Re-open a saved session at its remembered position.
    pub fn restore(&self, snapshot: &SessionSnapshot) -> Result<MoveIndex, ViewerError> {
        self.load_game_at(
            snapshot.game.clone(),
            &snapshot.pgn,
            snapshot.initial_fen.as_deref(),
            snapshot.position.as_deref(),
        )
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let state = self.lock();
        let document = state.navigator.document()?;
        Some(SessionSnapshot {
            game: state.game.clone()?,
            pgn: document.raw_text.clone(),
            initial_fen: state.initial_fen.clone(),
            position: state.navigator.current_position().map(str::to_string),
        })
    }

    /// Tear the session down: stop autoplay, invalidate in-flight work and
    /// drop all cached lookups.
    pub fn close(&self) {
        let mut state = self.lock();
        state.cancel_autoplay();
        state.generation += 1;
        state.load_request += 1;
        state.navigator.unload();
        state.game = None;
        state.initial_fen = None;
        state.clear_content();
        self.exploration.clear();
        self.evaluation.clear();
        tracing::info!(generation = state.generation, "Viewing session closed");
    }

    // ---- Navigation ----

    fn navigate(&self, op: impl FnOnce(&mut Navigator) -> bool) -> bool {
        let mut state = self.lock();
        let moved = op(&mut state.navigator);
        if moved {
            state.cancel_autoplay();
        }
        moved
    }

    pub fn go_to(&self, index: MoveIndex) -> bool {
        self.navigate(|nav| nav.go_to(index))
    }

    pub fn step_forward(&self) -> bool {
        self.navigate(Navigator::step_forward)
    }

    pub fn step_backward(&self) -> bool {
        self.navigate(Navigator::step_backward)
    }

    pub fn go_to_start(&self) -> bool {
        self.navigate(Navigator::go_to_start)
    }

    pub fn go_to_end(&self) -> bool {
        self.navigate(Navigator::go_to_end)
    }

    /// Start or stop autoplay. Must be called from within a tokio runtime.
    pub fn toggle_autoplay(&self) -> bool {
        let mut state = self.lock();
        if state.navigator.is_autoplay_active() {
            state.cancel_autoplay();
            return false;
        }
        if !state.navigator.toggle_autoplay() {
            return false;
        }
        self.spawn_autoplay(&mut state);
        true
    }

    fn spawn_autoplay(&self, state: &mut SessionState) {
        state.autoplay_token += 1;
        let token = state.autoplay_token;
        let generation = state.generation;
        let shared: Weak<Mutex<SessionState>> = Arc::downgrade(&self.state);
        let period = self.options.autoplay_interval;
        let first_tick = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(strong) = shared.upgrade() else { break };
                let mut state = lock_state(&strong);
                if state.generation != generation || state.autoplay_token != token {
                    break;
                }
                match state.navigator.tick() {
                    Tick::Advanced(index) => tracing::debug!(index, "Autoplay advanced"),
                    Tick::Finished | Tick::Inactive => {
                        tracing::debug!("Autoplay reached the last move");
                        state.autoplay_task = None;
                        break;
                    }
                }
            }
        });

        state.autoplay_task = Some(task.abort_handle());
    }

    // ---- Content ----

    /// Fetch comments and annotations for the current game and rebind them.
    /// Results arriving after a newer fetch or a game change are dropped.
    pub async fn refresh_content(&self) -> Result<(), ViewerError> {
        let (game_id, generation, request) = {
            let mut state = self.lock();
            let game_id = state.game.as_ref().ok_or(ViewerError::NoGameLoaded)?.id().to_string();
            state.content_request += 1;
            state.content_status = ContentStatus::Loading;
            (game_id, state.generation, state.content_request)
        };

        let fetched = futures::future::try_join(
            self.content.fetch_comments(&game_id),
            self.content.fetch_annotations(&game_id),
        )
        .await;

        let mut state = self.lock();
        if state.generation != generation || state.content_request != request {
            tracing::debug!(game_id = %game_id, request, "Discarding stale content fetch");
            return Ok(());
        }

        match fetched {
            Ok((comments, annotations)) => {
                state.comments = comments;
                state.annotations = annotations;
                state.rebind();
                state.content_status = ContentStatus::Loaded;
                tracing::debug!(
                    game_id = %game_id,
                    comments = state.comments.len(),
                    annotations = state.annotations.len(),
                    bound = state.bindings.len(),
                    "Content bound"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(game_id = %game_id, "Failed to fetch content: {e}");
                state.content_status = ContentStatus::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Annotate the current position. Bindings are refreshed from the store
    /// once the store has accepted the annotation.
    pub async fn create_annotation(&self, text: &str) -> Result<Annotation, ViewerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ViewerError::EmptyAnnotation);
        }

        let new_annotation = {
            let state = self.lock();
            let (game, fen, index) = state.current_game_and_position()?;
            NewAnnotation {
                game_id: game.id().to_string(),
                fen,
                move_number: index + 1,
                text: text.to_string(),
            }
        };

        let created = self.content.create_annotation(&new_annotation).await?;
        tracing::info!(annotation_id = created.id, "Annotation created");
        self.refresh_content().await?;
        Ok(created)
    }

    pub async fn update_annotation(&self, annotation_id: i64, text: &str) -> Result<Annotation, ViewerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ViewerError::EmptyAnnotation);
        }

        let updated = self.content.update_annotation(annotation_id, text).await?;
        tracing::info!(annotation_id, "Annotation updated");
        self.refresh_content().await?;
        Ok(updated)
    }

    pub async fn delete_annotation(&self, annotation_id: i64) -> Result<(), ViewerError> {
        self.content.delete_annotation(annotation_id).await?;
        tracing::info!(annotation_id, "Annotation deleted");
        self.refresh_content().await
    }

    pub fn can_edit(&self, annotation: &Annotation) -> bool {
        annotation.is_editable_by(self.options.current_user.as_deref())
    }

    // ---- Position lookups ----

    fn current_position(&self) -> Result<String, ViewerError> {
        self.lock()
            .navigator
            .current_position()
            .map(str::to_string)
            .ok_or(ViewerError::NoGameLoaded)
    }

    /// Masters explorer statistics for the current position.
    pub async fn explore_current(&self) -> Result<Arc<ExplorerResponse>, ViewerError> {
        let fen = self.current_position()?;
        let service = Arc::clone(&self.positions);
        let result = self
            .exploration
            .get_or_fetch(&fen, move |fen| async move { service.explore(&fen).await })
            .await?;
        Ok(result)
    }

    /// Cloud evaluation for the current position.
    pub async fn evaluate_current(&self) -> Result<Arc<CloudEval>, ViewerError> {
        let fen = self.current_position()?;
        let service = Arc::clone(&self.positions);
        let result = self
            .evaluation
            .get_or_fetch(&fen, move |fen| async move { service.cloud_eval(&fen).await })
            .await?;
        Ok(result)
    }

    pub fn exploration_cache(&self) -> &PositionCache<ExplorerResponse> {
        &self.exploration
    }

    pub fn evaluation_cache(&self) -> &PositionCache<CloudEval> {
        &self.evaluation
    }

    // ---- Emitted state ----

    pub fn nav_state(&self) -> NavState {
        self.lock().navigator.state()
    }

    pub fn current_index(&self) -> MoveIndex {
        self.lock().navigator.current_index()
    }

    pub fn is_autoplay_active(&self) -> bool {
        self.lock().navigator.is_autoplay_active()
    }

    pub fn document(&self) -> Option<Arc<NotationDocument>> {
        self.lock().navigator.document().cloned()
    }

    pub fn game(&self) -> Option<GameRef> {
        self.lock().game.clone()
    }

    pub fn bindings(&self) -> Bindings {
        self.lock().bindings.clone()
    }

    pub fn content_status(&self) -> ContentStatus {
        self.lock().content_status.clone()
    }

    pub fn view(&self) -> Option<ViewState> {
        let state = self.lock();
        let nav = &state.navigator;
        let document = nav.document()?;
        let game = state.game.clone()?;
        let index = nav.current_index();
        let position = nav.current_position()?.to_string();

        Some(ViewState {
            game,
            move_index: index,
            first_index: START_INDEX,
            last_index: document.last_index(),
            can_step_backward: nav.can_step_backward(),
            can_step_forward: nav.can_step_forward(),
            autoplay: nav.is_autoplay_active(),
            side_to_move: side_to_move(&position),
            last_move: document.move_at(index).map(str::to_string),
            move_label: document.move_label(index),
            annotated: state.bindings.get(&index).cloned().unwrap_or_default(),
            pgn_comments: document.comments_at(index).map(|c| c.text.clone()).collect(),
            content_status: state.content_status.clone(),
            exploration: self.exploration.status(&position),
            evaluation: self.evaluation.status(&position),
            position,
        })
    }
}

impl<C, P> Drop for ViewingSession<C, P> {
    fn drop(&mut self) {
        lock_state(&self.state).cancel_autoplay();
    }
}

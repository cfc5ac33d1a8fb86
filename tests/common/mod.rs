#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use viewer::clients::{ContentStore, PositionService};
use viewer::content::{Annotation, AnnotationTarget, Comment, NewAnnotation};
use viewer::evaluation::{CloudEval, ExplorerResponse, PvLine};
use viewer::{FetchError, SessionOptions, ViewingSession};

pub const RUY_LOPEZ: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 1-0";
pub const CURRENT_USER: &str = "alice";

pub type TestSession = ViewingSession<FakeContentStore, FakePositionService>;

/// Build a session over the given fakes with a 2s autoplay interval.
pub fn session(content: &FakeContentStore, positions: &FakePositionService) -> TestSession {
    ViewingSession::new(
        content.clone(),
        positions.clone(),
        SessionOptions {
            autoplay_interval: Duration::from_millis(2000),
            current_user: Some(CURRENT_USER.to_string()),
        },
    )
}

pub fn comment(id: i64, position: &str) -> Comment {
    Comment {
        id,
        author: "bob".to_string(),
        text: format!("comment {id}"),
        position: Some(position.to_string()),
        image: None,
    }
}

pub fn annotation(id: i64, author: &str, position: &str) -> Annotation {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Annotation {
        id,
        author: author.to_string(),
        text: format!("annotation {id}"),
        created_at: at,
        modified_at: at,
        target: AnnotationTarget {
            document_source: "games/1".to_string(),
            position: position.to_string(),
            move_number: None,
        },
    }
}

/// Wait on `gate` when one is installed.
async fn pass(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

// ---------------------------------------------------------------------------
// Content store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ContentData {
    comments: Mutex<HashMap<String, Vec<Comment>>>,
    annotations: Mutex<HashMap<String, Vec<Annotation>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    created: Mutex<Vec<NewAnnotation>>,
    fail: AtomicBool,
    next_id: AtomicI64,
    fetches: AtomicUsize,
}

/// In-memory content store. Clones share state.
#[derive(Clone, Default)]
pub struct FakeContentStore {
    data: Arc<ContentData>,
}

impl FakeContentStore {
    pub fn with_comments(&self, game_id: &str, comments: Vec<Comment>) -> &Self {
        self.data.comments.lock().unwrap().insert(game_id.to_string(), comments);
        self
    }

    pub fn with_annotations(&self, game_id: &str, annotations: Vec<Annotation>) -> &Self {
        self.data.annotations.lock().unwrap().insert(game_id.to_string(), annotations);
        self
    }

    /// Hold fetches for `game_id` until permits are added to the returned gate.
    pub fn gate(&self, game_id: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.data.gates.lock().unwrap().insert(game_id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn fail(&self, fail: bool) {
        self.data.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.data.fetches.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<NewAnnotation> {
        self.data.created.lock().unwrap().clone()
    }

    pub fn annotations(&self, game_id: &str) -> Vec<Annotation> {
        self.data.annotations.lock().unwrap().get(game_id).cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<(), FetchError> {
        if self.data.fail.load(Ordering::SeqCst) {
            Err(FetchError::Status(500))
        } else {
            Ok(())
        }
    }
}

impl ContentStore for FakeContentStore {
    async fn fetch_comments(&self, game_id: &str) -> Result<Vec<Comment>, FetchError> {
        self.data.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.data.gates.lock().unwrap().get(game_id).cloned();
        pass(gate).await;
        self.check()?;
        Ok(self.data.comments.lock().unwrap().get(game_id).cloned().unwrap_or_default())
    }

    async fn fetch_annotations(&self, game_id: &str) -> Result<Vec<Annotation>, FetchError> {
        self.check()?;
        Ok(self.annotations(game_id))
    }

    async fn create_annotation(&self, new: &NewAnnotation) -> Result<Annotation, FetchError> {
        self.check()?;
        let id = self.data.next_id.fetch_add(1, Ordering::SeqCst) + 100;
        let mut created = annotation(id, CURRENT_USER, &new.fen);
        created.text = new.text.clone();
        created.target.move_number = Some(new.move_number);

        self.data.created.lock().unwrap().push(new.clone());
        self.data
            .annotations
            .lock()
            .unwrap()
            .entry(new.game_id.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_annotation(&self, annotation_id: i64, text: &str) -> Result<Annotation, FetchError> {
        self.check()?;
        let mut all = self.data.annotations.lock().unwrap();
        let found = all
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|a| a.id == annotation_id)
            .ok_or_else(|| FetchError::NotFound("Annotation".to_string()))?;
        found.text = text.to_string();
        Ok(found.clone())
    }

    async fn delete_annotation(&self, annotation_id: i64) -> Result<(), FetchError> {
        self.check()?;
        let mut all = self.data.annotations.lock().unwrap();
        let mut removed = false;
        for list in all.values_mut() {
            let before = list.len();
            list.retain(|a| a.id != annotation_id);
            removed |= list.len() != before;
        }
        if removed {
            Ok(())
        } else {
            Err(FetchError::NotFound("Annotation".to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Position service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PositionData {
    master_games: Mutex<HashMap<String, String>>,
    explore_gate: Mutex<Option<Arc<Semaphore>>>,
    master_gate: Mutex<Option<Arc<Semaphore>>>,
    explore_calls: AtomicUsize,
    eval_calls: AtomicUsize,
    master_calls: AtomicUsize,
}

/// Canned explorer/evaluation/master-game service. Clones share state.
#[derive(Clone, Default)]
pub struct FakePositionService {
    data: Arc<PositionData>,
}

impl FakePositionService {
    pub fn with_master_game(&self, id: &str, pgn: &str) -> &Self {
        self.data.master_games.lock().unwrap().insert(id.to_string(), pgn.to_string());
        self
    }

    pub fn gate_explore(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.data.explore_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_master(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.data.master_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn explore_calls(&self) -> usize {
        self.data.explore_calls.load(Ordering::SeqCst)
    }

    pub fn eval_calls(&self) -> usize {
        self.data.eval_calls.load(Ordering::SeqCst)
    }

    pub fn master_calls(&self) -> usize {
        self.data.master_calls.load(Ordering::SeqCst)
    }
}

impl PositionService for FakePositionService {
    async fn explore(&self, _fen: &str) -> Result<ExplorerResponse, FetchError> {
        let call = self.data.explore_calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        let gate = self.data.explore_gate.lock().unwrap().clone();
        pass(gate).await;
        Ok(ExplorerResponse {
            white: call,
            draws: 0,
            black: 0,
            moves: Vec::new(),
            top_games: Vec::new(),
        })
    }

    async fn cloud_eval(&self, fen: &str) -> Result<CloudEval, FetchError> {
        self.data.eval_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CloudEval {
            fen: fen.to_string(),
            knodes: 5000,
            depth: 30,
            pvs: vec![PvLine { moves: "g1f3".to_string(), cp: Some(25), mate: None }],
        })
    }

    async fn master_game_pgn(&self, game_id: &str) -> Result<String, FetchError> {
        self.data.master_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.data.master_gate.lock().unwrap().clone();
        pass(gate).await;
        self.data
            .master_games
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound("Game".to_string()))
    }
}

//! Move navigation state machine.
//!
//! Holds the loaded document, the current move index and the autoplay flag.
//! It never suspends; the periodic autoplay timer lives in the session, which
//! calls [`Navigator::tick`] on every period.

use std::sync::Arc;

use chess_core::{MoveIndex, NotationDocument, START_INDEX};

/// Observable navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Ready,
    AtMove(MoveIndex),
}

/// Outcome of one autoplay period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Advanced(MoveIndex),
    /// Already at the last move; autoplay has been switched off.
    Finished,
    Inactive,
}

#[derive(Debug)]
pub struct Navigator {
    document: Option<Arc<NotationDocument>>,
    current_index: MoveIndex,
    autoplay: bool,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            document: None,
            current_index: START_INDEX,
            autoplay: false,
        }
    }

    /// Replace the document and reset to the starting position.
    pub fn load(&mut self, document: Arc<NotationDocument>) {
        self.document = Some(document);
        self.current_index = START_INDEX;
        self.autoplay = false;
    }

    pub fn unload(&mut self) {
        *self = Self::new();
    }

    pub fn document(&self) -> Option<&Arc<NotationDocument>> {
        self.document.as_ref()
    }

    pub fn state(&self) -> NavState {
        match self.document {
            None => NavState::Idle,
            Some(_) if self.current_index == START_INDEX => NavState::Ready,
            Some(_) => NavState::AtMove(self.current_index),
        }
    }

    pub fn current_index(&self) -> MoveIndex {
        self.current_index
    }

    pub fn current_position(&self) -> Option<&str> {
        self.document.as_ref()?.position_at(self.current_index)
    }

    /// Inclusive `(first, last)` index range of the loaded document.
    pub fn bounds(&self) -> Option<(MoveIndex, MoveIndex)> {
        self.document.as_ref().map(|d| (START_INDEX, d.last_index()))
    }

    pub fn is_autoplay_active(&self) -> bool {
        self.autoplay
    }

    pub fn can_step_forward(&self) -> bool {
        self.in_range(self.current_index + 1)
    }

    pub fn can_step_backward(&self) -> bool {
        self.in_range(self.current_index - 1)
    }

    fn in_range(&self, index: MoveIndex) -> bool {
        self.document
            .as_ref()
            .is_some_and(|d| d.contains_index(index))
    }

    /// Jump to `index`. Out-of-range targets leave the state untouched and
    /// return `false`; a successful jump stops autoplay.
    pub fn go_to(&mut self, index: MoveIndex) -> bool {
        if !self.in_range(index) {
            return false;
        }
        self.current_index = index;
        self.autoplay = false;
        true
    }

    pub fn step_forward(&mut self) -> bool {
        self.go_to(self.current_index + 1)
    }

    pub fn step_backward(&mut self) -> bool {
        self.go_to(self.current_index - 1)
    }

    pub fn go_to_start(&mut self) -> bool {
        self.go_to(START_INDEX)
    }

    pub fn go_to_end(&mut self) -> bool {
        match self.bounds() {
            Some((_, last)) => self.go_to(last),
            None => false,
        }
    }

    /// Flip autoplay, returning the new flag. Without a document autoplay
    /// stays off.
    pub fn toggle_autoplay(&mut self) -> bool {
        self.autoplay = !self.autoplay && self.document.is_some();
        self.autoplay
    }

    pub fn stop_autoplay(&mut self) {
        self.autoplay = false;
    }

    /// Advance one ply on behalf of the autoplay timer.
    pub fn tick(&mut self) -> Tick {
        if !self.autoplay {
            return Tick::Inactive;
        }
        if !self.can_step_forward() {
            self.autoplay = false;
            return Tick::Finished;
        }
        self.current_index += 1;
        Tick::Advanced(self.current_index)
    }
}

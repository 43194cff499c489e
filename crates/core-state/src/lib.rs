//! Grid state machine: cursor, word slots, sentence mode, connectivity, and lookahead cache.
//!
//! `GridState` is one long-lived value owned by the event loop. It is mutated only through
//! the methods below, and each method replaces the fields it touches in one step, so a reader
//! never observes a half-applied update.
//!
//! Core invariants (hold after every public call):
//! * `cursor < TOTAL_CELLS`; it resolves to the refresh slot or a valid word index.
//! * `words.len() == cached_words.len() == WORD_SLOTS` (truncated or padded with "").
//! * Any replacement of `words` resets the cursor to 0, so a position chosen against old
//!   content is never reinterpreted against new content.
//!
//! Fetch path:
//! * `begin_fetch` shows the pending state (loading, all slots empty) before the request
//!   leaves. Selections made while pending resolve to empty words, a no-op upstream.
//! * `resolve_fetch` folds the outcome in atomically. Failure clears loading, marks the backend
//!   disconnected, and leaves the grid as it was (empty if `begin_fetch` ran).
//! * `fetch_new_words` composes both for callers that own the state across the await.
//!   The event loop uses the split form so cursor movement keeps working while a request is
//!   outstanding.

use core_wire::{PredictionRequest, PredictionResponse, PredictionService, WireError};
use std::collections::HashMap;
use tracing::{debug, warn};

mod chat;
pub mod defaults;
pub mod layout;

pub use chat::{ChatLog, ChatMessage, ends_sentence};
pub use layout::{GRID_SIDE, GridLayout, REFRESH_INDEX, Slot, TOTAL_CELLS, WORD_SLOTS};

/// Whether the grid is offering sentence openers or continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SentenceStart,
    Continuing,
}

impl Mode {
    pub fn from_sentence_start(is_sentence_start: bool) -> Self {
        if is_sentence_start {
            Mode::SentenceStart
        } else {
            Mode::Continuing
        }
    }

    pub fn is_sentence_start(&self) -> bool {
        matches!(self, Mode::SentenceStart)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::SentenceStart => "sentence_start",
            Mode::Continuing => "continuing",
        }
    }
}

/// Truncate or pad to exactly `WORD_SLOTS` entries.
fn fill_slots<I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = words.into_iter().take(WORD_SLOTS).collect();
    out.resize(WORD_SLOTS, String::new());
    out
}

fn empty_slots() -> Vec<String> {
    vec![String::new(); WORD_SLOTS]
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    layout: GridLayout,
    cursor: usize,
    words: Vec<String>,
    cached_words: Vec<String>,
    mode: Mode,
    is_loading: bool,
    backend_connected: bool,
    lookahead: HashMap<String, Vec<String>>,
    last_generation_latency_ms: Option<u64>,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new()
    }
}

impl GridState {
    /// Startup state: sentence starters, sentence-start mode, backend not yet confirmed.
    pub fn new() -> Self {
        let starters = defaults::sentence_starters();
        Self {
            layout: GridLayout,
            cursor: 0,
            words: fill_slots(starters.clone()),
            cached_words: fill_slots(starters),
            mode: Mode::SentenceStart,
            is_loading: false,
            backend_connected: false,
            lookahead: HashMap::new(),
            last_generation_latency_ms: None,
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn cached_words(&self) -> &[String] {
        &self.cached_words
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_backend_connected(&self) -> bool {
        self.backend_connected
    }

    pub fn lookahead(&self) -> &HashMap<String, Vec<String>> {
        &self.lookahead
    }

    pub fn last_generation_latency_ms(&self) -> Option<u64> {
        self.last_generation_latency_ms
    }

    /// True when the word shown at `word_index` also appears in the prefetch list.
    /// Informational only (used for display).
    pub fn is_cached(&self, word_index: usize) -> bool {
        match self.words.get(word_index) {
            Some(word) if !word.is_empty() => self.cached_words.iter().any(|c| c == word),
            _ => false,
        }
    }

    /// Word under the cursor: `None` on the refresh slot, `Some("")` for an unpopulated slot.
    pub fn current_word(&self) -> Option<&str> {
        let idx = self.layout.word_index(self.cursor)?;
        Some(self.words.get(idx).map(String::as_str).unwrap_or(""))
    }

    pub fn is_on_refresh_button(&self) -> bool {
        self.cursor == self.layout.refresh_index()
    }

    pub fn move_right(&mut self) {
        self.cursor = self.layout.right_of(self.cursor);
        tracing::trace!(target: "grid.cursor", cursor = self.cursor, "move_right");
    }

    pub fn move_down(&mut self) {
        self.cursor = self.layout.below(self.cursor);
        tracing::trace!(target: "grid.cursor", cursor = self.cursor, "move_down");
    }

    /// Replace the word list. `cached` replaces the prefetch list only when supplied.
    pub fn set_words(&mut self, words: Vec<String>, cached: Option<Vec<String>>) {
        self.words = fill_slots(words);
        if let Some(cached) = cached {
            self.cached_words = fill_slots(cached);
        }
        self.cursor = 0;
        debug!(target: "grid.state", populated = self.populated(), "set_words");
    }

    /// Swap in the lookahead entry for `word`. Returns false (and changes nothing) when no
    /// non-empty entry exists.
    pub fn set_words_from_lookahead(&mut self, word: &str) -> bool {
        let next = match self.lookahead.get(word) {
            Some(next) if !next.is_empty() => next.clone(),
            _ => {
                debug!(target: "grid.state", "lookahead_miss");
                return false;
            }
        };
        self.words = fill_slots(next.clone());
        self.cached_words = fill_slots(next);
        self.cursor = 0;
        debug!(target: "grid.state", populated = self.populated(), "lookahead_hit");
        true
    }

    pub fn set_lookahead(&mut self, map: HashMap<String, Vec<String>>) {
        self.lookahead = map;
    }

    pub fn set_generation_latency(&mut self, ms: Option<u64>) {
        self.last_generation_latency_ms = ms;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_backend_connected(&mut self, connected: bool) {
        if self.backend_connected != connected {
            debug!(target: "grid.state", connected, "connectivity_changed");
        }
        self.backend_connected = connected;
    }

    /// Drop the pending indicator without touching content; a newer request superseded the
    /// one that set it.
    pub fn clear_loading(&mut self) {
        self.is_loading = false;
    }

    /// Local "grid pending" signal: every slot empty, cursor home. Issues no request.
    pub fn refresh_grid(&mut self) {
        self.words = empty_slots();
        self.cursor = 0;
    }

    /// Network-independent reset used the moment a sentence completes.
    pub fn reset_to_sentence_starters(&mut self) {
        let starters = defaults::sentence_starters();
        self.words = fill_slots(starters.clone());
        self.cached_words = fill_slots(starters);
        self.mode = Mode::SentenceStart;
        self.cursor = 0;
        self.is_loading = false;
    }

    /// Fill the grid with the built-in list for the current mode (backend unavailable).
    pub fn show_offline_words(&mut self) {
        let list = match self.mode {
            Mode::SentenceStart => defaults::sentence_starters(),
            Mode::Continuing => defaults::continuation_words(),
        };
        self.words = fill_slots(list.clone());
        self.cached_words = fill_slots(list);
        self.cursor = 0;
        debug!(target: "grid.state", mode = self.mode.as_str(), "offline_words_shown");
    }

    /// Enter the visible pending state ahead of an authoritative request.
    pub fn begin_fetch(&mut self) {
        self.is_loading = true;
        self.words = empty_slots();
        self.cursor = 0;
    }

    /// Fold an authoritative response (or its failure) into the grid. Returns true on success.
    pub fn resolve_fetch(
        &mut self,
        outcome: &Result<PredictionResponse, WireError>,
        is_sentence_start: bool,
    ) -> bool {
        match outcome {
            Ok(response) => {
                self.words = fill_slots(response.words.iter().cloned());
                self.cached_words = fill_slots(response.cached_words.iter().cloned());
                self.lookahead.clear();
                self.last_generation_latency_ms = response.latency_ms();
                self.cursor = 0;
                self.is_loading = false;
                self.backend_connected = true;
                self.mode = Mode::from_sentence_start(is_sentence_start);
                debug!(
                    target: "grid.state",
                    populated = self.populated(),
                    mode = self.mode.as_str(),
                    "fetch_resolved"
                );
                true
            }
            Err(err) => {
                self.is_loading = false;
                self.backend_connected = false;
                warn!(
                    target: "grid.state",
                    kind = err.kind().as_str(),
                    %err,
                    "fetch_failed"
                );
                false
            }
        }
    }

    /// Apply a refresh response: words and cached list swap in, the lookahead map and latency
    /// are replaced from the response. Loading and connectivity are left alone.
    pub fn apply_refresh(&mut self, response: &PredictionResponse) {
        self.set_words(
            response.words.clone(),
            Some(response.cached_words.clone()),
        );
        self.lookahead = response.lookahead();
        self.last_generation_latency_ms = response.latency_ms();
    }

    /// Authoritative refresh for an exclusive owner: pending state, request, resolution.
    /// There is no retry here.
    pub async fn fetch_new_words<S>(&mut self, service: &S, request: &PredictionRequest) -> bool
    where
        S: PredictionService + ?Sized,
    {
        self.begin_fetch();
        let outcome = service.fetch_words(request).await;
        self.resolve_fetch(&outcome, request.is_sentence_start)
    }

    fn populated(&self) -> usize {
        self.words.iter().filter(|w| !w.is_empty()).count()
    }
}

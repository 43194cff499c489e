//! Generation orchestrator: decides when to call the prediction backend and folds the results
//! back into `GridState`.
//!
//! Backend calls run as spawned tokio tasks. Each task reports through the
//! `GenerationEvent` channel returned by `GenerationOrchestrator::new`; the event loop hands
//! those events back to `handle_event`, so the grid is only ever mutated from the loop.
//!
//! Ordering: every call that may write grid content carries a `RequestTicket`. With
//! `suppress_stale_responses` on, a response whose ticket is no longer current is dropped
//! without touching any flag.

use core_state::{ChatLog, GridState, Mode, ends_sentence};
use core_wire::{PredictionRequest, PredictionResponse, PredictionService, WireError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod selection;
mod sequencer;

pub use selection::{Activation, ActivationOutcome, handle_activation};
pub use sequencer::{RequestSequencer, RequestTicket};

pub static STALE_RESPONSES_DROPPED: AtomicU64 = AtomicU64::new(0);
pub static CACHE_WARM_FAILURES: AtomicU64 = AtomicU64::new(0);

/// How a word fetch presents itself while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStyle {
    /// Grid blanked and `is_loading` set before the request leaves.
    Authoritative,
    /// Grid left as is (the sentence-start follow-up after a reset).
    Background,
}

#[derive(Debug)]
pub enum GenerationEvent {
    HealthChecked {
        healthy: bool,
    },
    WordsFetched {
        ticket: RequestTicket,
        style: FetchStyle,
        request: PredictionRequest,
        result: Result<PredictionResponse, WireError>,
    },
    Refreshed {
        ticket: RequestTicket,
        result: Result<PredictionResponse, WireError>,
    },
}

impl GenerationEvent {
    pub fn ticket(&self) -> Option<RequestTicket> {
        match self {
            GenerationEvent::HealthChecked { .. } => None,
            GenerationEvent::WordsFetched { ticket, .. }
            | GenerationEvent::Refreshed { ticket, .. } => Some(*ticket),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub suppress_stale_responses: bool,
    pub warm_cache: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            suppress_stale_responses: true,
            warm_cache: true,
        }
    }
}

/// What `on_word_selected` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFetch {
    Offline,
    TerminalWord,
    LookaheadHit,
    Requested(RequestTicket),
}

/// What `on_refresh` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    OfflineWords,
    Requested(RequestTicket),
}

/// Wire request for the current conversation.
pub fn request_for(chat: &ChatLog, is_sentence_start: bool) -> PredictionRequest {
    PredictionRequest::new(
        chat.history(),
        chat.current_sentence().to_vec(),
        is_sentence_start,
    )
}

pub struct GenerationOrchestrator {
    service: Arc<dyn PredictionService>,
    tx: mpsc::UnboundedSender<GenerationEvent>,
    sequencer: RequestSequencer,
    options: GenerationOptions,
}

impl GenerationOrchestrator {
    pub fn new(
        service: Arc<dyn PredictionService>,
        options: GenerationOptions,
    ) -> (Self, mpsc::UnboundedReceiver<GenerationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            service,
            tx,
            sequencer: RequestSequencer::new(options.suppress_stale_responses),
            options,
        };
        (orchestrator, rx)
    }

    /// Probe backend health off-loop; the result arrives as `HealthChecked`.
    pub fn check_health(&self) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let healthy = service.check_health().await;
            let _ = tx.send(GenerationEvent::HealthChecked { healthy });
        });
    }

    pub fn on_health_checked(
        &mut self,
        healthy: bool,
        grid: &mut GridState,
        chat: &ChatLog,
    ) -> Option<RequestTicket> {
        info!(target: "generation.health", healthy, "health_checked");
        grid.set_backend_connected(healthy);
        if healthy {
            Some(self.fetch_new_words(grid, chat))
        } else {
            None
        }
    }

    /// Authoritative fetch for the current mode: pending state now, resolution on arrival.
    pub fn fetch_new_words(&mut self, grid: &mut GridState, chat: &ChatLog) -> RequestTicket {
        let request = request_for(chat, grid.mode().is_sentence_start());
        grid.begin_fetch();
        self.spawn_fetch(request, FetchStyle::Authoritative)
    }

    /// Called after `word` has been appended to the sentence.
    pub fn on_word_selected(
        &mut self,
        word: &str,
        grid: &mut GridState,
        chat: &ChatLog,
    ) -> SelectionFetch {
        if !grid.is_backend_connected() {
            debug!(target: "generation.fetch", "selection_offline");
            return SelectionFetch::Offline;
        }
        if ends_sentence(word) {
            return SelectionFetch::TerminalWord;
        }
        if grid.set_words_from_lookahead(word) {
            grid.set_mode(Mode::Continuing);
            grid.clear_loading();
            self.sequencer.invalidate();
            return SelectionFetch::LookaheadHit;
        }
        SelectionFetch::Requested(self.fetch_new_words(grid, chat))
    }

    /// Reset to starters immediately, then ask for starters in the background if connected.
    pub fn on_sentence_complete(
        &mut self,
        grid: &mut GridState,
        chat: &ChatLog,
    ) -> Option<RequestTicket> {
        grid.reset_to_sentence_starters();
        self.sequencer.invalidate();
        if !grid.is_backend_connected() {
            return None;
        }
        Some(self.spawn_fetch(request_for(chat, true), FetchStyle::Background))
    }

    /// Fetch-and-swap alternatives; offline, fall back to the built-in list for the mode.
    pub fn on_refresh(&mut self, grid: &mut GridState, chat: &ChatLog) -> RefreshOutcome {
        if !grid.is_backend_connected() {
            grid.show_offline_words();
            return RefreshOutcome::OfflineWords;
        }
        let request = request_for(chat, grid.mode().is_sentence_start());
        let ticket = self.sequencer.issue();
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        debug!(target: "generation.refresh", ticket = ticket.id(), "refresh_requested");
        tokio::spawn(async move {
            let result = service.refresh_words(&request).await;
            let _ = tx.send(GenerationEvent::Refreshed { ticket, result });
        });
        RefreshOutcome::Requested(ticket)
    }

    /// Fold a completed backend call into the grid. Returns false when nothing visible changed.
    pub fn handle_event(
        &mut self,
        event: GenerationEvent,
        grid: &mut GridState,
        chat: &ChatLog,
    ) -> bool {
        if let Some(ticket) = event.ticket()
            && !self.sequencer.accepts(ticket)
        {
            STALE_RESPONSES_DROPPED.fetch_add(1, Ordering::Relaxed);
            debug!(target: "generation.fetch", ticket = ticket.id(), "stale_response_dropped");
            return false;
        }
        match event {
            GenerationEvent::HealthChecked { healthy } => {
                self.on_health_checked(healthy, grid, chat);
                true
            }
            GenerationEvent::WordsFetched {
                ticket,
                style,
                request,
                result,
            } => {
                let applied = match (&result, style) {
                    (Err(err), FetchStyle::Background) => {
                        grid.set_backend_connected(false);
                        warn!(
                            target: "generation.fetch",
                            ticket = ticket.id(),
                            kind = err.kind().as_str(),
                            %err,
                            "background_fetch_failed"
                        );
                        false
                    }
                    _ => grid.resolve_fetch(&result, request.is_sentence_start),
                };
                debug!(
                    target: "generation.fetch",
                    ticket = ticket.id(),
                    applied,
                    latency_ms = grid.last_generation_latency_ms(),
                    "fetch_completed"
                );
                if applied && self.options.warm_cache {
                    self.warm_cache(request);
                }
                true
            }
            GenerationEvent::Refreshed { ticket, result } => {
                grid.clear_loading();
                match result {
                    Ok(response) => {
                        grid.apply_refresh(&response);
                        debug!(
                            target: "generation.refresh",
                            ticket = ticket.id(),
                            lookahead_entries = grid.lookahead().len(),
                            "refresh_applied"
                        );
                        true
                    }
                    Err(err) => {
                        warn!(
                            target: "generation.refresh",
                            ticket = ticket.id(),
                            kind = err.kind().as_str(),
                            %err,
                            "refresh_failed"
                        );
                        false
                    }
                }
            }
        }
    }

    /// Best-effort prefetch hint. Detached; nothing it does reaches grid state.
    pub fn warm_cache(&self, request: PredictionRequest) {
        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            if let Err(err) = service.generate_cache(&request).await {
                CACHE_WARM_FAILURES.fetch_add(1, Ordering::Relaxed);
                warn!(target: "generation.cache", kind = err.kind().as_str(), %err, "cache_warm_failed");
            }
        });
    }

    fn spawn_fetch(&mut self, request: PredictionRequest, style: FetchStyle) -> RequestTicket {
        let ticket = self.sequencer.issue();
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        debug!(
            target: "generation.fetch",
            ticket = ticket.id(),
            ?style,
            sentence_len = request.current_sentence.len(),
            history_len = request.chat_history.len(),
            "fetch_requested"
        );
        tokio::spawn(async move {
            let result = service.fetch_words(&request).await;
            let _ = tx.send(GenerationEvent::WordsFetched {
                ticket,
                style,
                request,
                result,
            });
        });
        ticket
    }
}

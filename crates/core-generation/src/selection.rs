//! Selection surface: discrete switch activations turned into grid and orchestrator calls.

use crate::{GenerationOrchestrator, RefreshOutcome, SelectionFetch};
use core_state::{ChatLog, GridState, Mode};
use tracing::debug;

/// A discrete switch activation. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    MoveRight,
    MoveDown,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Moved { cursor: usize },
    Refresh(RefreshOutcome),
    /// Select landed on an unpopulated slot.
    EmptySlot,
    WordAdded(SelectionFetch),
    SentenceCompleted,
}

pub fn handle_activation(
    activation: Activation,
    grid: &mut GridState,
    chat: &mut ChatLog,
    orchestrator: &mut GenerationOrchestrator,
) -> ActivationOutcome {
    match activation {
        Activation::MoveRight => {
            grid.move_right();
            ActivationOutcome::Moved {
                cursor: grid.cursor_position(),
            }
        }
        Activation::MoveDown => {
            grid.move_down();
            ActivationOutcome::Moved {
                cursor: grid.cursor_position(),
            }
        }
        Activation::Select => select(grid, chat, orchestrator),
    }
}

fn select(
    grid: &mut GridState,
    chat: &mut ChatLog,
    orchestrator: &mut GenerationOrchestrator,
) -> ActivationOutcome {
    let word = match grid.current_word() {
        None => {
            grid.refresh_grid();
            return ActivationOutcome::Refresh(orchestrator.on_refresh(grid, chat));
        }
        Some("") => return ActivationOutcome::EmptySlot,
        Some(word) => word.to_string(),
    };
    debug!(target: "grid.state", word = %word, "word_selected");
    if chat.add_word(&word) {
        grid.set_mode(Mode::SentenceStart);
        orchestrator.on_sentence_complete(grid, chat);
        ActivationOutcome::SentenceCompleted
    } else {
        grid.set_mode(Mode::Continuing);
        ActivationOutcome::WordAdded(orchestrator.on_word_selected(&word, grid, chat))
    }
}

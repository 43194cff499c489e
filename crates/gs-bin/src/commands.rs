//! One-shot backend subcommands. Each makes a single call, prints a short report and exits
//! without touching the terminal UI.

use anyhow::{Result, bail};
use clap::Subcommand;
use core_wire::{PredictionRequest, PredictionService, ResetBranchRequest};
use std::io::Write;
use tracing::info;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    /// Probe the backend health endpoint.
    Health,
    /// Print the backend's cached and already-used words.
    Cache,
    /// Forget which words the backend has already offered.
    ClearUsed,
    /// Regenerate predictions for a sentence branch starting at FIRST_WORD.
    ResetBranch {
        first_word: String,
        /// Words already in the sentence, in order.
        #[arg(long = "sentence", num_args = 1..)]
        sentence: Vec<String>,
    },
}

impl BackendCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendCommand::Health => "health",
            BackendCommand::Cache => "cache",
            BackendCommand::ClearUsed => "clear_used",
            BackendCommand::ResetBranch { .. } => "reset_branch",
        }
    }
}

fn word_line(label: &str, words: &[String]) -> String {
    if words.is_empty() {
        format!("{label} (0): -")
    } else {
        format!("{label} ({}): {}", words.len(), words.join(" "))
    }
}

pub async fn run_command<W: Write>(
    cmd: &BackendCommand,
    service: &dyn PredictionService,
    base_url: &str,
    out: &mut W,
) -> Result<()> {
    info!(target: "runtime.command", command = cmd.as_str(), base_url, "command_start");
    match cmd {
        BackendCommand::Health => {
            if !service.check_health().await {
                bail!("backend unreachable at {base_url}");
            }
            writeln!(out, "backend reachable at {base_url}")?;
        }
        BackendCommand::Cache => {
            let snapshot = service.cache_snapshot().await?;
            writeln!(out, "{}", word_line("cached", &snapshot.cached_words))?;
            writeln!(out, "{}", word_line("used", &snapshot.used_words))?;
        }
        BackendCommand::ClearUsed => {
            service.clear_used().await?;
            writeln!(out, "used words cleared")?;
        }
        BackendCommand::ResetBranch {
            first_word,
            sentence,
        } => {
            let req = ResetBranchRequest {
                context: PredictionRequest::new(Vec::new(), sentence.clone(), sentence.is_empty()),
                first_word: first_word.clone(),
            };
            let res = service.reset_branch(&req).await?;
            writeln!(out, "{}", word_line("words", &res.words))?;
        }
    }
    info!(target: "runtime.command", command = cmd.as_str(), "command_complete");
    Ok(())
}

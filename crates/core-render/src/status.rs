//! Header and status line composition.
//!
//! Two-stage pipeline: `compose_status` produces ordered `StatusSegment`s from a
//! `StatusContext`, `format_status` renders them. Tests assert on segments where the exact
//! glyphs do not matter.

use core_state::{GridState, Mode};

/// What the status line needs from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusContext {
    pub mode: Mode,
    pub connected: bool,
    pub loading: bool,
    pub latency_ms: Option<u64>,
}

impl StatusContext {
    pub fn from_grid(grid: &GridState) -> Self {
        Self {
            mode: grid.mode(),
            connected: grid.is_backend_connected(),
            loading: grid.is_loading(),
            latency_ms: grid.last_generation_latency_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment {
    Connection(bool),
    Loading,
    Lookahead(u64),
}

pub fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::SentenceStart => "Start your sentence",
        Mode::Continuing => "Continue...",
    }
}

/// Header line: mode label plus the offline badge.
pub fn header_line(ctx: &StatusContext) -> String {
    let mut s = String::from(mode_label(ctx.mode));
    if !ctx.connected {
        s.push_str("  [Offline mode]");
    }
    s
}

pub fn compose_status(ctx: &StatusContext) -> Vec<StatusSegment> {
    let mut out = Vec::with_capacity(3);
    out.push(StatusSegment::Connection(ctx.connected));
    if ctx.loading {
        out.push(StatusSegment::Loading);
    }
    if let Some(ms) = ctx.latency_ms {
        out.push(StatusSegment::Lookahead(ms));
    }
    out
}

pub fn format_status(segments: &[StatusSegment]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(segments.len());
    for seg in segments {
        parts.push(match seg {
            StatusSegment::Connection(true) => "● AI Connected".to_string(),
            StatusSegment::Connection(false) => "○ Offline".to_string(),
            StatusSegment::Loading => "Loading...".to_string(),
            StatusSegment::Lookahead(ms) => format!("Lookahead: {ms}ms"),
        });
    }
    parts.join(" | ")
}

pub fn build_status(ctx: &StatusContext) -> String {
    format_status(&compose_status(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> StatusContext {
        StatusContext {
            mode: Mode::SentenceStart,
            connected: true,
            loading: false,
            latency_ms: None,
        }
    }

    #[test]
    fn connected_idle_status_is_minimal() {
        assert_eq!(build_status(&ctx()), "● AI Connected");
    }

    #[test]
    fn loading_and_latency_are_appended_in_order() {
        let c = StatusContext {
            loading: true,
            latency_ms: Some(120),
            ..ctx()
        };
        assert_eq!(
            compose_status(&c),
            vec![
                StatusSegment::Connection(true),
                StatusSegment::Loading,
                StatusSegment::Lookahead(120),
            ]
        );
        assert_eq!(
            build_status(&c),
            "● AI Connected | Loading... | Lookahead: 120ms"
        );
    }

    #[test]
    fn offline_header_carries_badge() {
        let c = StatusContext {
            connected: false,
            mode: Mode::Continuing,
            ..ctx()
        };
        assert_eq!(header_line(&c), "Continue...  [Offline mode]");
        assert_eq!(build_status(&c), "○ Offline");
        assert_eq!(header_line(&ctx()), "Start your sentence");
    }

    #[test]
    fn context_reads_grid_flags() {
        let grid = GridState::new();
        let c = StatusContext::from_grid(&grid);
        assert_eq!(c.mode, Mode::SentenceStart);
        assert!(!c.connected);
        assert!(!c.loading);
        assert_eq!(c.latency_ms, None);
    }
}

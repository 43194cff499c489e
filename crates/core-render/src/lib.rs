//! Rendering for the scanning grid: pure frame composition plus a crossterm painter.
//!
//! Pipeline:
//! 1. `frame::compose_frame` turns `GridState` + `ChatLog` into positioned `FrameLine`s.
//! 2. `GridRenderer::paint` diffs the frame against the previous one and emits only changed
//!    rows through `writer::Writer`, falling back to a full clear on the first frame or after
//!    a resize.
//!
//! Invariants:
//! - At most one highlighted cell per frame (the cursor).
//! - Every emitted line fits the terminal width in display columns.
//! - A row present in the previous frame but absent now is cleared.

use anyhow::Result;
use bitflags::bitflags;
use std::io::Write;
use unicode_width::UnicodeWidthChar;

pub mod frame;
pub mod status;
pub mod terminal;
pub mod writer;

pub use frame::{FrameLine, GridFrame, Highlight, compose_frame};
pub use terminal::{CrosstermBackend, TerminalBackend, TerminalGuard};

use writer::Writer;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const ACTIVE  = 0b0000_0001; // under the scanning cursor
        const REFRESH = 0b0000_0010;
        const CACHED  = 0b0000_0100; // word also present in the prefetch list
        const EMPTY   = 0b0000_1000;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderMetrics {
    pub full_frames: u64,
    pub partial_frames: u64,
    pub lines_repainted: u64,
}

/// Split `text` at display column `col`. A wide character straddling `col` goes right.
fn split_at_col(text: &str, col: usize) -> (&str, &str) {
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if used + w > col {
            return text.split_at(idx);
        }
        used += w;
    }
    (text, "")
}

fn emit_line(w: &mut Writer, line: &FrameLine) {
    w.move_to(0, line.row);
    w.clear_line();
    match line.highlight {
        Some(hl) => {
            let (before, rest) = split_at_col(&line.text, usize::from(hl.start_col));
            let (marked, after) =
                split_at_col(rest, usize::from(hl.end_col.saturating_sub(hl.start_col)));
            w.print(before);
            w.print_reversed(marked);
            w.print(after);
        }
        None => w.print(line.text.as_str()),
    }
}

#[derive(Debug, Default)]
pub struct GridRenderer {
    prev: Option<GridFrame>,
    metrics: RenderMetrics,
}

impl GridRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> RenderMetrics {
        self.metrics
    }

    /// Forget the previous frame so the next paint clears the screen.
    pub fn invalidate(&mut self) {
        self.prev = None;
    }

    /// Build the commands that bring the terminal from the previous frame to `frame`.
    pub fn plan(&mut self, frame: &GridFrame) -> Writer {
        let mut w = Writer::new();
        let full = self
            .prev
            .as_ref()
            .is_none_or(|p| p.cols != frame.cols || p.rows != frame.rows);
        let mut repainted = 0u64;
        if full {
            w.clear_all();
            for line in &frame.lines {
                emit_line(&mut w, line);
                repainted += 1;
            }
            self.metrics.full_frames += 1;
        } else if let Some(prev) = &self.prev {
            for line in &frame.lines {
                if prev.line_at(line.row) != Some(line) {
                    emit_line(&mut w, line);
                    repainted += 1;
                }
            }
            for old in &prev.lines {
                if frame.line_at(old.row).is_none() {
                    w.move_to(0, old.row);
                    w.clear_line();
                    repainted += 1;
                }
            }
            self.metrics.partial_frames += 1;
        }
        self.metrics.lines_repainted += repainted;
        tracing::trace!(target: "render.frame", full, repainted, "frame_planned");
        self.prev = Some(frame.clone());
        w
    }

    pub fn paint<W: Write>(&mut self, frame: &GridFrame, out: &mut W) -> Result<()> {
        self.plan(frame).flush_to(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::{ChatLog, GridState};
    use writer::Command;

    #[test]
    fn split_at_col_handles_wide_chars() {
        assert_eq!(split_at_col("abcdef", 2), ("ab", "cdef"));
        assert_eq!(split_at_col("日本語", 3), ("日", "本語"));
        assert_eq!(split_at_col("ab", 5), ("ab", ""));
    }

    #[test]
    fn highlight_wraps_only_the_active_cell() {
        let line = FrameLine {
            row: 2,
            text: " I    The  ".to_string(),
            highlight: Some(Highlight {
                start_col: 0,
                end_col: 5,
            }),
        };
        let mut w = Writer::new();
        emit_line(&mut w, &line);
        assert_eq!(
            w.commands(),
            [
                Command::MoveTo(0, 2),
                Command::ClearLine,
                Command::PrintReversed(" I   ".into()),
                Command::Print(" The  ".into()),
            ]
        );
    }

    #[test]
    fn first_frame_is_full_then_only_changes_repaint() {
        let mut grid = GridState::new();
        let chat = ChatLog::new();
        let mut renderer = GridRenderer::new();

        let first = compose_frame(&grid, &chat, 80, 24);
        let plan = renderer.plan(&first);
        assert_eq!(plan.commands()[0], Command::ClearAll);

        grid.move_down();
        let second = compose_frame(&grid, &chat, 80, 24);
        let plan = renderer.plan(&second);
        assert!(!plan.commands().contains(&Command::ClearAll));
        let repainted_rows: Vec<u16> = plan
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::MoveTo(0, y) => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(repainted_rows, [2, 4], "old and new cursor rows only");

        let metrics = renderer.metrics();
        assert_eq!(metrics.full_frames, 1);
        assert_eq!(metrics.partial_frames, 1);
    }

    #[test]
    fn resize_forces_full_repaint() {
        let grid = GridState::new();
        let chat = ChatLog::new();
        let mut renderer = GridRenderer::new();
        renderer.plan(&compose_frame(&grid, &chat, 80, 24));
        let plan = renderer.plan(&compose_frame(&grid, &chat, 100, 30));
        assert_eq!(plan.commands()[0], Command::ClearAll);
        assert_eq!(renderer.metrics().full_frames, 2);
    }

    #[test]
    fn paint_writes_frame_text() {
        let grid = GridState::new();
        let mut renderer = GridRenderer::new();
        let mut out = Vec::new();
        renderer
            .paint(&compose_frame(&grid, &ChatLog::new(), 80, 24), &mut out)
            .unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("Start your sentence"));
        assert!(s.contains("Offline"));
    }
}

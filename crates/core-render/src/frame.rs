//! Pure frame composition: grid state + chat log -> positioned text lines.
//!
//! Layout (top to bottom): header, blank, four grid rows separated by blank rows, sentence
//! line, transcript, status line pinned to the last terminal row. Every line is clipped to the
//! terminal width by display columns; nothing here touches the terminal.

use crate::CellFlags;
use crate::status::{StatusContext, build_status, header_line};
use core_state::{ChatLog, GRID_SIDE, GridState, Slot, TOTAL_CELLS};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const REFRESH_LABEL: &str = "↻ Refresh";
pub const MIN_CELL_WIDTH: usize = 6;
pub const MAX_CELL_WIDTH: usize = 18;
const CELL_GAP: usize = 1;
const GRID_TOP: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub label: String,
    pub flags: CellFlags,
}

/// Half-open column range `[start_col, end_col)` drawn in reverse video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub start_col: u16,
    pub end_col: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine {
    pub row: u16,
    pub text: String,
    pub highlight: Option<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFrame {
    pub cols: u16,
    pub rows: u16,
    pub cells: Vec<CellView>,
    pub lines: Vec<FrameLine>,
}

impl GridFrame {
    pub fn line_at(&self, row: u16) -> Option<&FrameLine> {
        self.lines.iter().find(|l| l.row == row)
    }
}

pub fn cell_views(grid: &GridState) -> Vec<CellView> {
    let layout = grid.layout();
    (0..TOTAL_CELLS)
        .map(|idx| {
            let mut flags = CellFlags::empty();
            if idx == grid.cursor_position() {
                flags |= CellFlags::ACTIVE;
            }
            let label = match layout.slot(idx) {
                Slot::Refresh => {
                    flags |= CellFlags::REFRESH;
                    REFRESH_LABEL.to_string()
                }
                Slot::Word(w) => {
                    let word = grid.words().get(w).map(String::as_str).unwrap_or("");
                    if word.is_empty() {
                        flags |= CellFlags::EMPTY;
                        let placeholder = if grid.is_loading() { "..." } else { "" };
                        placeholder.to_string()
                    } else {
                        if grid.is_cached(w) {
                            flags |= CellFlags::CACHED;
                        }
                        word.to_string()
                    }
                }
            };
            CellView { label, flags }
        })
        .collect()
}

/// Cell width for a terminal `cols` wide.
pub fn cell_width(cols: u16) -> usize {
    let gaps = CELL_GAP * (GRID_SIDE - 1);
    (usize::from(cols).saturating_sub(gaps) / GRID_SIDE).clamp(MIN_CELL_WIDTH, MAX_CELL_WIDTH)
}

/// Clip `text` to `width` display columns, marking truncation with `…`.
pub fn clip(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// `clip` then pad with spaces to exactly `width` columns.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = clip(text, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat_n(' ', pad));
    out
}

fn cell_text(cell: &CellView, width: usize) -> String {
    let content = if cell.flags.contains(CellFlags::CACHED) {
        format!("{}*", cell.label)
    } else {
        cell.label.clone()
    };
    format!(" {} ", fit(&content, width.saturating_sub(2)))
}

fn grid_line(
    cells: &[CellView],
    row: usize,
    cw: usize,
    cols: usize,
) -> (String, Option<Highlight>) {
    let mut text = String::new();
    let mut highlight = None;
    for col in 0..GRID_SIDE {
        let cell = &cells[row * GRID_SIDE + col];
        let start = col * (cw + CELL_GAP);
        if col > 0 {
            text.push(' ');
        }
        text.push_str(&cell_text(cell, cw));
        if cell.flags.contains(CellFlags::ACTIVE) && start < cols {
            let end = (start + cw).min(cols);
            highlight = Some(Highlight {
                start_col: start as u16,
                end_col: end as u16,
            });
        }
    }
    (clip(&text, cols), highlight)
}

pub fn compose_frame(grid: &GridState, chat: &ChatLog, cols: u16, rows: u16) -> GridFrame {
    let width = usize::from(cols);
    let cells = cell_views(grid);
    let cw = cell_width(cols);
    let ctx = StatusContext::from_grid(grid);
    let mut lines = Vec::new();

    lines.push(FrameLine {
        row: 0,
        text: clip(&header_line(&ctx), width),
        highlight: None,
    });

    for r in 0..GRID_SIDE {
        let (text, highlight) = grid_line(&cells, r, cw, width);
        lines.push(FrameLine {
            row: GRID_TOP + (r as u16) * 2,
            text,
            highlight,
        });
    }

    let sentence_row = GRID_TOP + (GRID_SIDE as u16) * 2;
    let sentence = if chat.current_sentence().is_empty() {
        "_".to_string()
    } else {
        chat.current_sentence().join(" ")
    };
    lines.push(FrameLine {
        row: sentence_row,
        text: clip(&format!("Sentence: {sentence}"), width),
        highlight: None,
    });

    // Transcript fills whatever remains above the status row, newest messages last.
    let transcript_top = sentence_row + 2;
    let status_row = rows.saturating_sub(1);
    if transcript_top < status_row {
        let room = usize::from(status_row - transcript_top);
        let messages = chat.messages();
        let skip = messages.len().saturating_sub(room);
        for (i, msg) in messages.iter().skip(skip).enumerate() {
            let who = if msg.is_user { "You" } else { "Partner" };
            lines.push(FrameLine {
                row: transcript_top + i as u16,
                text: clip(&format!("{who}: {}", msg.text), width),
                highlight: None,
            });
        }
    }

    lines.retain(|l| l.row < status_row);
    if rows > 0 {
        lines.push(FrameLine {
            row: status_row,
            text: clip(&build_status(&ctx), width),
            highlight: None,
        });
    }

    GridFrame {
        cols,
        rows,
        cells,
        lines,
    }
}

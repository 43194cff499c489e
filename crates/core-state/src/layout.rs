//! Fixed 4×4 cell layout with one reserved refresh slot.
//!
//! Invariants:
//! * Exactly one refresh slot, at `REFRESH_INDEX`, for the lifetime of the process.
//! * Every other grid index maps to a unique word index in `0..WORD_SLOTS`.

pub const GRID_SIDE: usize = 4;
pub const TOTAL_CELLS: usize = GRID_SIDE * GRID_SIDE;
pub const WORD_SLOTS: usize = TOTAL_CELLS - 1;
/// Top-right corner.
pub const REFRESH_INDEX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Refresh,
    Word(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridLayout;

impl GridLayout {
    pub const fn refresh_index(&self) -> usize {
        REFRESH_INDEX
    }

    /// Resolve a grid index (taken modulo the cell count) to its slot.
    pub fn slot(&self, grid_index: usize) -> Slot {
        let idx = grid_index % TOTAL_CELLS;
        match idx.cmp(&REFRESH_INDEX) {
            std::cmp::Ordering::Less => Slot::Word(idx),
            std::cmp::Ordering::Equal => Slot::Refresh,
            std::cmp::Ordering::Greater => Slot::Word(idx - 1),
        }
    }

    pub fn word_index(&self, grid_index: usize) -> Option<usize> {
        match self.slot(grid_index) {
            Slot::Word(i) => Some(i),
            Slot::Refresh => None,
        }
    }

    /// One column right, wrapping within the row.
    pub fn right_of(&self, grid_index: usize) -> usize {
        let pos = grid_index % TOTAL_CELLS;
        let row = pos / GRID_SIDE;
        let col = (pos % GRID_SIDE + 1) % GRID_SIDE;
        row * GRID_SIDE + col
    }

    /// One row down, wrapping within the column.
    pub fn below(&self, grid_index: usize) -> usize {
        let pos = grid_index % TOTAL_CELLS;
        let row = (pos / GRID_SIDE + 1) % GRID_SIDE;
        let col = pos % GRID_SIDE;
        row * GRID_SIDE + col
    }
}

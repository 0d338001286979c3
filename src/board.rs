// src/board.rs
// This module tracks which cells of a player's card have been called.

use crate::card::Card;
use crate::defs::{Number, FREE_COL, FREE_ROW, GRID_SIZE};

/// One boolean per card cell, index-aligned with `Card`.
/// The free cell is marked from creation and nothing is ever unmarked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkGrid([[bool; GRID_SIZE]; GRID_SIZE]);

impl MarkGrid {
    pub fn new() -> Self {
        let mut marks = [[false; GRID_SIZE]; GRID_SIZE];
        marks[FREE_ROW][FREE_COL] = true;
        MarkGrid(marks)
    }

    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.0[row][col]
    }

    pub fn marked_count(&self) -> usize {
        self.0.iter().flatten().filter(|marked| **marked).count()
    }

    /// Mark every cell of `card` holding `number`; returns how many cells
    /// changed. Numbers absent from the card are a no-op.
    pub fn mark(&mut self, card: &Card, number: Number) -> usize {
        let mut newly_marked = 0;
        for (row, col) in card.positions_of(number) {
            if !self.0[row][col] {
                self.0[row][col] = true;
                newly_marked += 1;
            }
        }
        newly_marked
    }

    /// A full row or a full column. Diagonals do not count.
    pub fn has_bingo(&self) -> bool {
        let full_row = self.0.iter().any(|row| row.iter().all(|marked| *marked));
        let full_col = (0..GRID_SIZE).any(|col| self.0.iter().all(|row| row[col]));
        full_row || full_col
    }

    /// Rows whose cells are all marked, for highlighting.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..GRID_SIZE)
            .filter(|&row| self.0[row].iter().all(|marked| *marked))
            .collect()
    }

    /// Columns whose cells are all marked, for highlighting.
    pub fn complete_cols(&self) -> Vec<usize> {
        (0..GRID_SIZE)
            .filter(|&col| self.0.iter().all(|row| row[col]))
            .collect()
    }
}

impl Default for MarkGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Mark `number` on an optionally installed card. Missing card or grid is
/// a silent no-op, as is a number the card does not hold.
pub fn mark_number(card: Option<&Card>, marks: Option<&mut MarkGrid>, number: Number) -> usize {
    match (card, marks) {
        (Some(card), Some(marks)) => marks.mark(card, number),
        _ => 0,
    }
}

/// An installed card together with its marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerBoard {
    card: Card,
    marks: MarkGrid,
}

impl PlayerBoard {
    /// Install a parsed card with a fresh grid (free cell marked).
    pub fn new(card: Card) -> Self {
        PlayerBoard { card, marks: MarkGrid::new() }
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn marks(&self) -> &MarkGrid {
        &self.marks
    }

    pub fn parts_mut(&mut self) -> (&Card, &mut MarkGrid) {
        (&self.card, &mut self.marks)
    }

    pub fn mark(&mut self, number: Number) -> usize {
        self.marks.mark(&self.card, number)
    }

    pub fn replace_marks(&mut self, marks: MarkGrid) {
        self.marks = marks;
    }

    pub fn has_bingo(&self) -> bool {
        self.marks.has_bingo()
    }
}

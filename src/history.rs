// src/history.rs
// Call history: full replay for late joiners and incremental live calls.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{mark_number, MarkGrid};
use crate::card::Card;
use crate::defs::{Band, Number, HISTORY_SEPARATOR};

/// One called ball. The letter is always derived from the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    band: Band,
    number: Number,
}

impl Call {
    pub fn new(number: Number) -> Option<Self> {
        Band::of(number).map(|band| Call { band, number })
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn number(&self) -> Number {
        self.number
    }

    /// Display token, e.g. `G50`.
    pub fn token(&self) -> String {
        format!("{}{}", self.band, self.number)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.band, self.number)
    }
}

/// Ordered calls of the current game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallHistory(Vec<Call>);

impl CallHistory {
    pub fn new() -> Self {
        CallHistory(Vec::new())
    }

    /// Build a history from raw numbers, dropping those outside 1..=75.
    pub fn from_numbers(numbers: &[Number]) -> Self {
        CallHistory(numbers.iter().filter_map(|&number| Call::new(number)).collect())
    }

    pub fn push(&mut self, call: Call) {
        self.0.push(call);
    }

    pub fn contains(&self, number: Number) -> bool {
        self.0.iter().any(|call| call.number == number)
    }

    pub fn calls(&self) -> &[Call] {
        &self.0
    }

    pub fn numbers(&self) -> Vec<Number> {
        self.0.iter().map(Call::number).collect()
    }

    pub fn last(&self) -> Option<&Call> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Human-readable list in arrival order, e.g. `B5, I20, N33`.
    pub fn display(&self) -> String {
        self.0
            .iter()
            .map(Call::token)
            .collect::<Vec<_>>()
            .join(HISTORY_SEPARATOR)
    }
}

/// Rebuild marks and display history from an ordered list of called
/// numbers. The history is built from scratch, never appended to.
pub fn replay_history(card: &Card, numbers: &[Number]) -> (MarkGrid, CallHistory) {
    let history = CallHistory::from_numbers(numbers);
    let mut marks = MarkGrid::new();
    for call in history.calls() {
        marks.mark(card, call.number());
    }
    (marks, history)
}

/// Apply one live call: append it to the history, mark the card if one is
/// installed, and return the call for "last call" display.
pub fn apply_call(
    card: Option<&Card>,
    marks: Option<&mut MarkGrid>,
    history: &mut CallHistory,
    call: Call,
) -> Call {
    history.push(call);
    mark_number(card, marks, call.number());
    call
}

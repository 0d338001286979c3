// src/defs.rs
// Shared constants and the number/band mapping for the bingo game.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type Number = u8;

pub const GRID_SIZE: usize = 5;
pub const FREE_ROW: usize = 2;
pub const FREE_COL: usize = 2;

pub const FIRSTNUMBER: Number = 1;
pub const LASTNUMBER: Number = 75;
pub const BAND_WIDTH: Number = 15;

pub const HISTORY_SEPARATOR: &str = ", ";

/// One of the five column bands of a 75-ball card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    B,
    I,
    N,
    G,
    O,
}

impl Band {
    pub const ALL: [Band; GRID_SIZE] = [Band::B, Band::I, Band::N, Band::G, Band::O];

    /// Band a called number belongs to, or `None` outside 1..=75.
    pub fn of(number: Number) -> Option<Band> {
        if !(FIRSTNUMBER..=LASTNUMBER).contains(&number) {
            return None;
        }
        Some(Self::ALL[((number - FIRSTNUMBER) / BAND_WIDTH) as usize])
    }

    pub fn letter(self) -> char {
        match self {
            Band::B => 'B',
            Band::I => 'I',
            Band::N => 'N',
            Band::G => 'G',
            Band::O => 'O',
        }
    }

    pub fn from_letter(letter: &str) -> Option<Band> {
        match letter.trim() {
            "B" | "b" => Some(Band::B),
            "I" | "i" => Some(Band::I),
            "N" | "n" => Some(Band::N),
            "G" | "g" => Some(Band::G),
            "O" | "o" => Some(Band::O),
            _ => None,
        }
    }

    /// Column index of this band on a card.
    pub fn column(self) -> usize {
        self as usize
    }

    /// Inclusive number range of this band.
    pub fn range(self) -> std::ops::RangeInclusive<Number> {
        let start = FIRSTNUMBER + self as Number * BAND_WIDTH;
        start..=start + BAND_WIDTH - 1
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Letter of the band `number` falls in.
pub fn band_of(number: Number) -> Option<&'static str> {
    Band::of(number).map(|band| match band {
        Band::B => "B",
        Band::I => "I",
        Band::N => "N",
        Band::G => "G",
        Band::O => "O",
    })
}

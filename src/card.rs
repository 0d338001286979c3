// src/card.rs
// This module turns the server's textual card into a typed 5x5 grid and,
// on the server side, deals new cards and renders them back to text.

use std::error::Error;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::defs::{Band, Number, FREE_COL, FREE_ROW, GRID_SIZE};

const CARD_HEADER: &str = "B  I  N  G  O";
const FREE_TOKENS: [&str; 2] = ["*", "X"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Number(Number),
    Free,
}

impl Cell {
    // Only the leading digits count ("12abc" is 12). A token without a
    // positive leading integer degrades to the free marker so a damaged
    // card still renders.
    fn from_token(token: &str) -> Self {
        if FREE_TOKENS.contains(&token) {
            return Cell::Free;
        }
        let digits = token
            .find(|c: char| !c.is_ascii_digit())
            .map_or(token, |end| &token[..end]);
        match digits.parse::<Number>() {
            Ok(0) | Err(_) => Cell::Free,
            Ok(number) => Cell::Number(number),
        }
    }

    pub fn number(&self) -> Option<Number> {
        match self {
            Cell::Number(number) => Some(*number),
            Cell::Free => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }
}

/// A player's card. Immutable once built; marks live in `board::MarkGrid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

impl Card {
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Every (row, col) holding `number`. The card may repeat a number,
    /// so this never stops at the first hit.
    pub fn positions_of(&self, number: Number) -> Vec<(usize, usize)> {
        let mut positions = Vec::new();
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if *cell == Cell::Number(number) {
                    positions.push((row, col));
                }
            }
        }
        positions
    }

    pub fn contains(&self, number: Number) -> bool {
        self.cells.iter().flatten().any(|cell| *cell == Cell::Number(number))
    }

    /// Text form sent to players: a header line, then five rows with the
    /// center rendered as `*`.
    pub fn to_text(&self) -> String {
        let mut lines = vec![CARD_HEADER.to_string()];
        for (row, cells) in self.cells.iter().enumerate() {
            let values: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(col, cell)| match cell {
                    Cell::Number(number) if (row, col) != (FREE_ROW, FREE_COL) => number.to_string(),
                    _ => FREE_TOKENS[0].to_string(),
                })
                .collect();
            lines.push(values.join(" "));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    TooFewLines { found: usize },
    ShortRow { row: usize, found: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooFewLines { found } => {
                write!(f, "card text has {found} non-blank lines, expected a header and {GRID_SIZE} rows")
            }
            ParseError::ShortRow { row, found } => {
                write!(f, "card row {row} has {found} values, expected {GRID_SIZE}")
            }
        }
    }
}

impl Error for ParseError {}

/// Parse the textual card pushed by the server.
///
/// Blank lines are skipped, the first remaining line is a header and is
/// discarded, and the next five lines each contribute their first five
/// whitespace-separated tokens. Nothing is returned unless all 25 cells
/// were read.
pub fn parse_card(text: &str) -> Result<Card, ParseError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < GRID_SIZE + 1 {
        return Err(ParseError::TooFewLines { found: lines.len() });
    }

    let mut cells = [[Cell::Free; GRID_SIZE]; GRID_SIZE];
    for (row, line) in lines[1..=GRID_SIZE].iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < GRID_SIZE {
            return Err(ParseError::ShortRow { row, found: tokens.len() });
        }
        for (col, token) in tokens.iter().take(GRID_SIZE).enumerate() {
            cells[row][col] = Cell::from_token(token);
        }
    }

    Ok(Card { cells })
}

/// Deals standard 75-ball cards: column `c` holds five distinct numbers
/// from band `c`, the center is free.
#[derive(Debug, Clone, Default)]
pub struct CardGenerator;

impl CardGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self) -> Card {
        self.generate_with(&mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        let mut cells = [[Cell::Free; GRID_SIZE]; GRID_SIZE];

        for band in Band::ALL {
            let mut column: Vec<Number> = band.range().collect();
            column.shuffle(rng);
            for (row, number) in column.into_iter().take(GRID_SIZE).enumerate() {
                cells[row][band.column()] = Cell::Number(number);
            }
        }

        cells[FREE_ROW][FREE_COL] = Cell::Free;
        Card { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "B I N G O\n1 16 31 46 61\n2 17 32 47 62\n3 18 * 48 63\n4 19 34 49 64\n5 20 35 50 65";

    #[test]
    fn test_parse_valid_card() {
        let card = parse_card(SAMPLE).unwrap();
        assert_eq!(card.cell(0, 0), Cell::Number(1));
        assert_eq!(card.cell(0, 4), Cell::Number(61));
        assert_eq!(card.cell(4, 4), Cell::Number(65));
        assert_eq!(card.cell(FREE_ROW, FREE_COL), Cell::Free);
    }

    #[test]
    fn test_parse_free_tokens_and_fallback() {
        let text = "header\n1 2 3 4 5\n6 7 8 9 10\n11 12 X 14 15\n16 abc 18 -4 20\n21 22 23 24 0";
        let card = parse_card(text).unwrap();
        assert!(card.cell(2, 2).is_free());
        assert!(card.cell(3, 1).is_free());
        assert!(card.cell(3, 3).is_free());
        assert!(card.cell(4, 4).is_free());
        assert_eq!(card.cell(3, 2), Cell::Number(18));
    }

    #[test]
    fn test_parse_reads_leading_digits() {
        let text = "header
12abc 2 3 4 5
6 7.9 8 9 10
11 12 * 14 15
16 0x1F 18 19 20
21 22 23 24 999";
        let card = parse_card(text).unwrap();
        assert_eq!(card.cell(0, 0), Cell::Number(12));
        assert_eq!(card.cell(1, 1), Cell::Number(7));
        assert!(card.cell(3, 1).is_free());
        assert!(card.cell(4, 4).is_free());
        assert_eq!(card.positions_of(12), vec![(0, 0), (2, 1)]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_crlf() {
        let text = "\r\nB I N G O\r\n\r\n1 16 31 46 61\r\n2 17 32 47 62\r\n  \r\n3 18 * 48 63\r\n4 19 34 49 64\r\n5 20 35 50 65\r\n";
        let card = parse_card(text).unwrap();
        assert_eq!(card, parse_card(SAMPLE).unwrap());
    }

    #[test]
    fn test_parse_ignores_extra_tokens_and_lines() {
        let text = format!("{SAMPLE} 99\ntrailing line");
        let card = parse_card(&text).unwrap();
        assert_eq!(card.cell(4, 4), Cell::Number(65));
    }

    #[test]
    fn test_parse_too_few_lines() {
        let text = "B I N G O\n1 16 31 46 61\n2 17 32 47 62\n3 18 * 48 63\n4 19 34 49 64";
        assert_eq!(parse_card(text), Err(ParseError::TooFewLines { found: 5 }));
        assert_eq!(parse_card(""), Err(ParseError::TooFewLines { found: 0 }));
    }

    #[test]
    fn test_parse_short_row() {
        let text = "B I N G O\n1 16 31 46 61\n2 17 32 47 62\n3 18 * 48\n4 19 34 49 64\n5 20 35 50 65";
        assert_eq!(parse_card(text), Err(ParseError::ShortRow { row: 2, found: 4 }));
    }

    #[test]
    fn test_positions_of_finds_duplicates() {
        let text = "h\n7 7 1 2 3\n4 5 6 8 9\n10 11 * 12 13\n14 15 16 17 18\n19 20 21 22 7";
        let card = parse_card(text).unwrap();
        assert_eq!(card.positions_of(7), vec![(0, 0), (0, 1), (4, 4)]);
        assert!(card.positions_of(99).is_empty());
        assert!(card.contains(22));
    }

    #[test]
    fn test_generated_card_respects_bands() {
        let generator = CardGenerator::new();
        for _ in 0..20 {
            let card = generator.generate();
            assert!(card.cell(FREE_ROW, FREE_COL).is_free());
            for band in Band::ALL {
                let mut seen = Vec::new();
                for row in 0..GRID_SIZE {
                    if let Some(number) = card.cell(row, band.column()).number() {
                        assert!(band.range().contains(&number));
                        assert!(!seen.contains(&number));
                        seen.push(number);
                    }
                }
            }
        }
    }

    #[test]
    fn test_generated_text_parses_back() {
        let card = CardGenerator::new().generate();
        let text = card.to_text();
        assert!(text.starts_with(CARD_HEADER));
        assert_eq!(text.lines().count(), GRID_SIZE + 1);
        assert_eq!(parse_card(&text).unwrap(), card);
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::ShortRow { row: 1, found: 3 };
        assert_eq!(err.to_string(), "card row 1 has 3 values, expected 5");
    }
}

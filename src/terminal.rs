// src/terminal.rs
// Terminal output for the bingo clients and the key handling of their loops.

use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};

use crate::board::PlayerBoard;
use crate::card::Cell;
use crate::defs::{Band, GRID_SIZE, Number};
use crate::session::Session;
use crate::status::GameStatus;

const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_YELLOW: &str = "\x1b[1;33m";
const BOLD_MAGENTA: &str = "\x1b[1;35m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Start,
    Refresh,
    Exit,
    Nothing,
}

pub fn clear_screen() {
    print!("\x1Bc");
}

fn paint(text: &str, color: &str) -> String {
    format!("{color}{text}{RESET}")
}

/// The card as a grid: the last call in green, cells on a complete line in
/// magenta, other marked cells in yellow.
pub fn render_card(board: &PlayerBoard, last_call: Option<Number>) -> String {
    let marks = board.marks();
    let rows = marks.complete_rows();
    let cols = marks.complete_cols();

    let mut out = String::new();
    for band in Band::ALL {
        out.push_str(&format!(" {:>2} ", band.letter()));
    }
    out.push('\n');

    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let cell = board.card().cell(row, col);
            let text = match cell {
                Cell::Number(number) => format!("{number:>2}"),
                Cell::Free => " *".to_string(),
            };
            let painted = if !marks.is_marked(row, col) {
                text
            } else if cell.number().is_some() && cell.number() == last_call {
                paint(&text, BOLD_GREEN)
            } else if rows.contains(&row) || cols.contains(&col) {
                paint(&text, BOLD_MAGENTA)
            } else {
                paint(&text, BOLD_YELLOW)
            };
            out.push_str(&format!(" {painted} "));
        }
        out.push('\n');
    }
    out
}

/// Full client screen for a session.
pub fn render_session(session: &Session) -> String {
    let mut out = String::new();

    let name = session.player_name().unwrap_or("Observer");
    out.push_str(&format!("{name}    Players connected: {}\n", session.players_count()));
    out.push_str(&format!("{}\n\n", session.status_message()));

    match session.board() {
        Some(board) => {
            let last = session.last_call().map(|call| call.number());
            out.push_str(&render_card(board, last));
        }
        None => {
            if let Some(error) = session.card_error() {
                out.push_str(&format!("No card: {error}\n"));
            }
        }
    }

    out.push('\n');
    if let Some(token) = session.last_call_token() {
        out.push_str(&format!("Last call: {}\n", paint(&token, BOLD_GREEN)));
    }
    if !session.history().is_empty() {
        out.push_str(&format!("Called ({}): {}\n", session.history().len(), session.history_display()));
    }
    if session.has_bingo() && session.status() != GameStatus::Idle {
        out.push_str(&format!("\n{}\n", paint("BINGO!!!", BOLD_YELLOW)));
    }
    out
}

pub fn show_session(session: &Session, hint: &str) {
    clear_screen();
    println!("{}", render_session(session));
    println!("{hint}");
}

/// Wait up to `timeout` for a key press. ENTER starts, F5 refreshes, ESC
/// exits; anything else is ignored.
pub fn poll_key(timeout: Duration) -> std::io::Result<KeyAction> {
    enable_raw_mode()?;
    let result = read_key(timeout);
    disable_raw_mode()?;
    result
}

fn read_key(timeout: Duration) -> std::io::Result<KeyAction> {
    if !event::poll(timeout)? {
        return Ok(KeyAction::Nothing);
    }
    match event::read()? {
        // Only key presses, not releases
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => Ok(key_action(key_event.code)),
        _ => Ok(KeyAction::Nothing),
    }
}

fn key_action(code: KeyCode) -> KeyAction {
    match code {
        KeyCode::Enter => KeyAction::Start,
        KeyCode::F(5) => KeyAction::Refresh,
        KeyCode::Esc => KeyAction::Exit,
        _ => KeyAction::Nothing,
    }
}

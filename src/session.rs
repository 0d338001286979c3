// src/session.rs
// The per-client session: owns the card, marks, call history and status,
// and routes each inbound event to the component responsible for it.
//
// Handlers are plain state transitions; rendering reads the session after
// each `apply` and never mutates it.

use crate::board::PlayerBoard;
use crate::card::{parse_card, ParseError};
use crate::defs::{Band, Number};
use crate::events::{InboundEvent, WireNumber};
use crate::history::{apply_call, replay_history, Call, CallHistory};
use crate::logging::{log_info, log_warning};
use crate::status::{GameStatus, StatusProjection};

pub const CARD_READY_MESSAGE: &str = "Card ready. Waiting for calls...";
pub const CARD_ERROR_MESSAGE: &str = "Error building the card.";

/// What a single `apply` did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    CardInstalled,
    CardRejected(ParseError),
    HistoryReplayed { calls: usize },
    Called(Call),
    DuplicateCall(Number),
    InvalidCall(WireNumber),
    Cleared,
    WinnerDeclared,
    GameOver,
    PlayersCount(u32),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    player_name: Option<String>,
    board: Option<PlayerBoard>,
    card_error: Option<ParseError>,
    history: CallHistory,
    last_call: Option<Call>,
    status: StatusProjection,
    players_count: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and apply a raw wire event. Undecodable events are logged
    /// and dropped.
    pub fn apply_value(&mut self, value: serde_json::Value) -> Option<SessionUpdate> {
        match InboundEvent::from_value(value) {
            Ok(event) => Some(self.apply(event)),
            Err(e) => {
                log_warning(&e);
                None
            }
        }
    }

    pub fn apply(&mut self, event: InboundEvent) -> SessionUpdate {
        match event {
            InboundEvent::Card { name, text } => self.install_card(name, text),
            InboundEvent::History { numbers } => self.replay(&numbers),
            InboundEvent::Ball { letter, number } => self.call(&letter, number),
            InboundEvent::Winner { message } => {
                self.status.winner(message);
                SessionUpdate::WinnerDeclared
            }
            InboundEvent::GameOver { message } => {
                self.status.game_over(message);
                SessionUpdate::GameOver
            }
            InboundEvent::GameStarted {} => {
                self.clear();
                self.status.game_started();
                SessionUpdate::Cleared
            }
            InboundEvent::PlayersCount { count } => {
                self.players_count = count.unwrap_or(0);
                SessionUpdate::PlayersCount(self.players_count)
            }
        }
    }

    /// Drop everything tied to the previous round. Safe to repeat.
    pub fn clear(&mut self) {
        self.board = None;
        self.card_error = None;
        self.history.clear();
        self.last_call = None;
    }

    fn install_card(&mut self, name: Option<String>, text: String) -> SessionUpdate {
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            self.player_name = Some(name);
        }

        match parse_card(&text) {
            Ok(card) => {
                self.board = Some(PlayerBoard::new(card));
                self.card_error = None;
                self.history.clear();
                self.last_call = None;
                self.status.set_message(CARD_READY_MESSAGE);
                SessionUpdate::CardInstalled
            }
            Err(e) => {
                log_warning(&format!("Rejected card: {e}"));
                self.board = None;
                self.card_error = Some(e.clone());
                self.status.set_message(CARD_ERROR_MESSAGE);
                SessionUpdate::CardRejected(e)
            }
        }
    }

    fn replay(&mut self, numbers: &[WireNumber]) -> SessionUpdate {
        // Entries that cannot be a ball are dropped; the rest still replay
        let valid: Vec<Number> = numbers
            .iter()
            .filter_map(|&number| Number::try_from(number).ok())
            .collect();

        match self.board.as_mut() {
            Some(board) => {
                let (marks, history) = replay_history(board.card(), &valid);
                board.replace_marks(marks);
                self.history = history;
            }
            None => self.history = CallHistory::from_numbers(&valid),
        }

        if self.history.len() != numbers.len() {
            log_warning(&format!(
                "History carried {} numbers outside 1..=75",
                numbers.len() - self.history.len()
            ));
        }

        self.last_call = self.history.last().copied();
        if !self.history.is_empty() {
            self.status.call_received();
        }
        SessionUpdate::HistoryReplayed { calls: self.history.len() }
    }

    fn call(&mut self, letter: &str, number: WireNumber) -> SessionUpdate {
        let Some(call) = Number::try_from(number).ok().and_then(Call::new) else {
            log_warning(&format!("Ignoring call for out-of-range number {number}"));
            return SessionUpdate::InvalidCall(number);
        };

        if Band::from_letter(letter) != Some(call.band()) {
            log_warning(&format!("Call letter '{letter}' does not match {}, using {}", number, call.band()));
        }

        if self.history.contains(call.number()) {
            log_info(&format!("Duplicate call {} ignored", call.token()));
            return SessionUpdate::DuplicateCall(call.number());
        }

        let (card, marks) = match self.board.as_mut() {
            Some(board) => {
                let (card, marks) = board.parts_mut();
                (Some(card), Some(marks))
            }
            None => (None, None),
        };
        apply_call(card, marks, &mut self.history, call);

        self.last_call = Some(call);
        self.status.call_received();
        SessionUpdate::Called(call)
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn set_player_name(&mut self, name: &str) {
        self.player_name = Some(name.to_string());
    }

    pub fn board(&self) -> Option<&PlayerBoard> {
        self.board.as_ref()
    }

    pub fn card_error(&self) -> Option<&ParseError> {
        self.card_error.as_ref()
    }

    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    pub fn history_display(&self) -> String {
        self.history.display()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.last_call
    }

    pub fn last_call_token(&self) -> Option<String> {
        self.last_call.map(|call| call.token())
    }

    pub fn status(&self) -> GameStatus {
        self.status.status()
    }

    pub fn status_message(&self) -> &str {
        self.status.message()
    }

    pub fn players_count(&self) -> u32 {
        self.players_count
    }

    pub fn has_bingo(&self) -> bool {
        self.board.as_ref().is_some_and(PlayerBoard::has_bingo)
    }
}

// src/status.rs
// Game lifecycle projection, independent of the card and its marks.

use serde::{Deserialize, Serialize};

pub const DEFAULT_WINNER_MESSAGE: &str = "We have a winner!";
pub const DEFAULT_GAME_OVER_MESSAGE: &str = "Game over.";
pub const GAME_STARTED_MESSAGE: &str = "Game in progress...";
pub const CALLS_RUNNING_MESSAGE: &str = "Calls in progress...";
pub const WAITING_MESSAGE: &str = "Waiting for the game to start...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Idle,
    InProgress,
    WinnerDeclared,
    Over,
}

/// Lifecycle inputs the projector reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Started,
    CallReceived,
    Winner,
    GameOver,
}

impl GameStatus {
    pub fn next(self, event: Lifecycle) -> GameStatus {
        match (self, event) {
            // A new round always starts over, whatever came before
            (_, Lifecycle::Started) => GameStatus::InProgress,
            // Late joiners see calls before any start event
            (GameStatus::Idle, Lifecycle::CallReceived) => GameStatus::InProgress,
            (status, Lifecycle::CallReceived) => status,
            (GameStatus::Over, Lifecycle::Winner) => GameStatus::Over,
            (_, Lifecycle::Winner) => GameStatus::WinnerDeclared,
            (_, Lifecycle::GameOver) => GameStatus::Over,
        }
    }

    pub fn is_round_finished(self) -> bool {
        matches!(self, GameStatus::WinnerDeclared | GameStatus::Over)
    }
}

/// Status plus the user-facing text shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusProjection {
    status: GameStatus,
    message: String,
}

impl StatusProjection {
    pub fn new() -> Self {
        StatusProjection {
            status: GameStatus::Idle,
            message: WAITING_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn game_started(&mut self) {
        self.status = self.status.next(Lifecycle::Started);
        self.message = GAME_STARTED_MESSAGE.to_string();
    }

    pub fn call_received(&mut self) {
        self.status = self.status.next(Lifecycle::CallReceived);
        if self.status == GameStatus::InProgress {
            self.message = CALLS_RUNNING_MESSAGE.to_string();
        }
    }

    pub fn winner(&mut self, message: Option<String>) {
        self.status = self.status.next(Lifecycle::Winner);
        self.message = non_empty_or(message, DEFAULT_WINNER_MESSAGE);
    }

    pub fn game_over(&mut self, message: Option<String>) {
        self.status = self.status.next(Lifecycle::GameOver);
        self.message = non_empty_or(message, DEFAULT_GAME_OVER_MESSAGE);
    }
}

impl Default for StatusProjection {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_or(message: Option<String>, default: &str) -> String {
    message
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(GameStatus::Idle.next(Lifecycle::Started), GameStatus::InProgress);
        assert_eq!(GameStatus::InProgress.next(Lifecycle::Winner), GameStatus::WinnerDeclared);
        assert_eq!(GameStatus::InProgress.next(Lifecycle::GameOver), GameStatus::Over);
        assert_eq!(GameStatus::WinnerDeclared.next(Lifecycle::GameOver), GameStatus::Over);
        assert_eq!(GameStatus::WinnerDeclared.next(Lifecycle::Started), GameStatus::InProgress);
        assert_eq!(GameStatus::Over.next(Lifecycle::Started), GameStatus::InProgress);
        assert_eq!(GameStatus::Over.next(Lifecycle::Winner), GameStatus::Over);
    }

    #[test]
    fn test_call_while_idle_starts_round() {
        assert_eq!(GameStatus::Idle.next(Lifecycle::CallReceived), GameStatus::InProgress);
        assert_eq!(GameStatus::Over.next(Lifecycle::CallReceived), GameStatus::Over);
        assert_eq!(GameStatus::WinnerDeclared.next(Lifecycle::CallReceived), GameStatus::WinnerDeclared);
    }

    #[test]
    fn test_default_messages() {
        let mut projection = StatusProjection::new();
        assert_eq!(projection.status(), GameStatus::Idle);

        projection.winner(None);
        assert_eq!(projection.message(), DEFAULT_WINNER_MESSAGE);

        projection.game_over(Some("   ".to_string()));
        assert_eq!(projection.message(), DEFAULT_GAME_OVER_MESSAGE);
        assert!(projection.status().is_round_finished());
    }

    #[test]
    fn test_explicit_messages() {
        let mut projection = StatusProjection::new();
        projection.game_started();
        assert_eq!(projection.message(), GAME_STARTED_MESSAGE);
        projection.call_received();
        assert_eq!(projection.message(), CALLS_RUNNING_MESSAGE);
        projection.winner(Some("Player 2 has BINGO!".to_string()));
        assert_eq!(projection.status(), GameStatus::WinnerDeclared);
        assert_eq!(projection.message(), "Player 2 has BINGO!");
    }

    #[test]
    fn test_call_after_winner_keeps_message() {
        let mut projection = StatusProjection::new();
        projection.game_started();
        projection.winner(Some("done".to_string()));
        projection.call_received();
        assert_eq!(projection.message(), "done");
    }
}

// src/game.rs
// Server-side round state: registered players and their cards, the pouch,
// drawn numbers, and one event feed per subscriber. Feeds are append-only
// within a round and emptied when the next round starts.
//
// All state sits behind a single mutex so a draw, its marks and its
// broadcast are observed atomically by pollers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::json;

use crate::board::{MarkGrid, PlayerBoard};
use crate::card::CardGenerator;
use crate::defs::Number;
use crate::events::{EventBatch, InboundEvent, JoinResponse, WireNumber};
use crate::logging::{log_info, log_warning};
use crate::pouch::Pouch;

/// Subscriber id of the administrative feed.
pub const ADMIN_ID: &str = "admin";

pub const NO_WINNER_MESSAGE: &str = "No more balls. Game over (no winner).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Called(Number),
    Won { number: Number, winner: String },
    Exhausted,
}

/// One subscriber's events. Cursors are absolute positions, so dropping
/// an old round only moves `base` and live cursors stay valid.
#[derive(Default)]
struct Feed {
    base: usize,
    events: Vec<InboundEvent>,
}

impl Feed {
    fn push(&mut self, event: InboundEvent) {
        self.events.push(event);
    }

    fn end(&self) -> usize {
        self.base + self.events.len()
    }

    /// Events after `cursor`, or `None` when the cursor falls outside the
    /// retained window.
    fn since(&self, cursor: usize) -> Option<&[InboundEvent]> {
        if cursor < self.base || cursor > self.end() {
            return None;
        }
        Some(&self.events[cursor - self.base..])
    }

    fn trim(&mut self) {
        self.base = self.end();
        self.events.clear();
    }
}

struct Player {
    name: String,
    board: PlayerBoard,
    feed: Feed,
}

struct GameState {
    id: String,
    created_at: SystemTime,
    players: BTreeMap<String, Player>,
    admin_feed: Feed,
    pouch: Pouch,
    drawn: Vec<Number>,
    started: bool,
    running: bool,
    winner_message: Option<String>,
    over_message: Option<String>,
    next_player_number: u32,
}

impl GameState {
    fn new() -> Self {
        GameState {
            id: new_game_id(),
            created_at: SystemTime::now(),
            players: BTreeMap::new(),
            admin_feed: Feed::default(),
            pouch: Pouch::new(),
            drawn: Vec::new(),
            started: false,
            running: false,
            winner_message: None,
            over_message: None,
            next_player_number: 1,
        }
    }

    fn broadcast(&mut self, event: InboundEvent) {
        for player in self.players.values_mut() {
            player.feed.push(event.clone());
        }
        self.admin_feed.push(event);
    }

    fn trim_feeds(&mut self) {
        for player in self.players.values_mut() {
            player.feed.trim();
        }
        self.admin_feed.trim();
    }

    fn broadcast_players_count(&mut self) {
        let count = self.players.len() as u32;
        self.broadcast(InboundEvent::PlayersCount { count: Some(count) });
    }

    fn finish(&mut self, winner: Option<&str>) {
        self.running = false;
        let message = match winner {
            Some(name) => format!("Game finished. Winner: {name}."),
            None => NO_WINNER_MESSAGE.to_string(),
        };
        self.over_message = Some(message.clone());
        self.broadcast(InboundEvent::GameOver { message: Some(message) });
    }

    // Everything a fresh or reconnecting subscriber needs, in the order
    // the live feed would have delivered it.
    fn snapshot(&self, player: Option<&Player>) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        if self.started {
            events.push(InboundEvent::GameStarted {});
        }
        if let Some(player) = player {
            events.push(InboundEvent::Card {
                name: Some(player.name.clone()),
                text: player.board.card().to_text(),
            });
        }
        if !self.drawn.is_empty() {
            let numbers = self.drawn.iter().map(|&number| WireNumber::from(number)).collect();
            events.push(InboundEvent::History { numbers });
        }
        if let Some(message) = &self.winner_message {
            events.push(InboundEvent::Winner { message: Some(message.clone()) });
        }
        if let Some(message) = &self.over_message {
            events.push(InboundEvent::GameOver { message: Some(message.clone()) });
        }
        events.push(InboundEvent::PlayersCount { count: Some(self.players.len() as u32) });
        events
    }
}

/// Shared handle on the game; clones refer to the same state.
#[derive(Clone)]
pub struct Game {
    state: Arc<Mutex<GameState>>,
    generator: CardGenerator,
}

impl Game {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GameState::new())),
            generator: CardGenerator::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GameState>, String> {
        self.state.lock().map_err(|_| "Failed to lock game state".to_string())
    }

    pub fn id(&self) -> String {
        self.lock().map(|state| state.id.clone()).unwrap_or_default()
    }

    /// Get a human-readable creation time string
    pub fn created_at_string(&self) -> String {
        let Ok(state) = self.lock() else {
            return "Unknown time".to_string();
        };
        match state.created_at.duration_since(std::time::UNIX_EPOCH) {
            Ok(duration) => {
                let datetime: DateTime<Utc> = DateTime::from_timestamp(duration.as_secs() as i64, 0)
                    .unwrap_or_else(Utc::now);
                datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
            }
            Err(_) => "Unknown time".to_string(),
        }
    }

    /// Register a player and deal a card. Mid-round joiners get their card
    /// pre-marked with the numbers already drawn.
    pub fn join(&self, name: Option<String>) -> Result<JoinResponse, String> {
        let mut state = self.lock()?;

        let number = state.next_player_number;
        state.next_player_number += 1;
        let name = name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Player {number}"));

        let mut rng = rand::rng();
        let player_id = loop {
            let candidate = format!("player_{:08x}", rng.random::<u32>());
            if !state.players.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut board = PlayerBoard::new(self.generator.generate());
        for &number in &state.drawn {
            board.mark(number);
        }

        state.players.insert(player_id.clone(), Player { name: name.clone(), board, feed: Feed::default() });
        state.broadcast_players_count();
        log_info(&format!("Player joined: {name} ({player_id}), {} connected", state.players.len()));

        Ok(JoinResponse { player_id, name })
    }

    pub fn leave(&self, player_id: &str) -> Result<(), String> {
        let mut state = self.lock()?;
        match state.players.remove(player_id) {
            Some(player) => {
                state.broadcast_players_count();
                log_info(&format!("Player left: {} ({player_id})", player.name));
                Ok(())
            }
            None => Err(format!("Player '{player_id}' not found")),
        }
    }

    /// Events for `subscriber` after `since`. Without a cursor, or with a
    /// cursor outside the retained feed (past the end, or from a previous
    /// round), a reconstruction snapshot is returned instead.
    pub fn events(&self, subscriber: &str, since: Option<usize>) -> Result<EventBatch, String> {
        let state = self.lock()?;

        let (feed, player) = if subscriber == ADMIN_ID {
            (&state.admin_feed, None)
        } else {
            let player = state
                .players
                .get(subscriber)
                .ok_or_else(|| format!("Subscriber '{subscriber}' not found"))?;
            (&player.feed, Some(player))
        };

        let next = feed.end();
        match since.and_then(|cursor| feed.since(cursor)) {
            Some(events) => Ok(EventBatch::from_events(events, next)),
            None => Ok(EventBatch::from_events(&state.snapshot(player), next)),
        }
    }

    /// Begin a new round: fresh pouch, fresh cards for everyone.
    pub fn start_round(&self) -> Result<String, String> {
        let mut state = self.lock()?;
        if state.running {
            return Err("A game is already running".to_string());
        }

        state.id = new_game_id();
        state.created_at = SystemTime::now();
        state.pouch = Pouch::new();
        state.drawn.clear();
        state.winner_message = None;
        state.over_message = None;
        state.started = true;
        state.running = true;

        // Cursors left behind in the old round get a snapshot instead
        state.trim_feeds();
        state.broadcast(InboundEvent::GameStarted {});
        for player in state.players.values_mut() {
            player.board = PlayerBoard::new(self.generator.generate());
            player.feed.push(InboundEvent::Card {
                name: Some(player.name.clone()),
                text: player.board.card().to_text(),
            });
        }

        log_info(&format!("Round started: {} with {} players", state.id, state.players.len()));
        Ok(state.id.clone())
    }

    /// Draw one ball, mark every card and broadcast the call. Returns
    /// `None` when no round is running.
    pub fn draw_next(&self) -> Result<Option<DrawOutcome>, String> {
        let mut state = self.lock()?;
        if !state.running {
            return Ok(None);
        }

        let Some(number) = state.pouch.extract() else {
            state.finish(None);
            log_info("Pouch is empty, round over without winner");
            return Ok(Some(DrawOutcome::Exhausted));
        };

        state.drawn.push(number);
        for player in state.players.values_mut() {
            player.board.mark(number);
        }

        let letter = crate::defs::band_of(number).unwrap_or_default().to_string();
        state.broadcast(InboundEvent::Ball { letter: letter.clone(), number: WireNumber::from(number) });
        log_info(&format!("Called {letter}{number}"));

        let winner = state
            .players
            .values()
            .find(|player| player.board.has_bingo())
            .map(|player| player.name.clone());

        match winner {
            Some(name) => {
                let message = format!("{name} has BINGO!");
                state.winner_message = Some(message.clone());
                state.broadcast(InboundEvent::Winner { message: Some(message) });
                state.finish(Some(&name));
                log_info(&format!("BINGO for {name} after {} calls", state.drawn.len()));
                Ok(Some(DrawOutcome::Won { number, winner: name }))
            }
            None => Ok(Some(DrawOutcome::Called(number))),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().map(|state| state.running).unwrap_or(false)
    }

    pub fn players_count(&self) -> usize {
        self.lock().map(|state| state.players.len()).unwrap_or(0)
    }

    pub fn drawn_numbers(&self) -> Vec<Number> {
        self.lock().map(|state| state.drawn.clone()).unwrap_or_default()
    }

    /// Server-side marks of a player's card.
    pub fn player_marks(&self, player_id: &str) -> Option<MarkGrid> {
        let state = self.lock().ok()?;
        state.players.get(player_id).map(|player| player.board.marks().clone())
    }

    pub fn status_json(&self) -> serde_json::Value {
        let Ok(state) = self.lock() else {
            return json!({ "status": "unavailable" });
        };
        let status = if state.running {
            "running"
        } else if state.started {
            "finished"
        } else {
            "waiting"
        };
        json!({
            "status": status,
            "game_id": state.id,
            "players": state.players.len(),
            "numbers_drawn": state.drawn.len(),
            "server": "tokio-hyper"
        })
    }

    /// Get game information as a formatted string for debugging/logging
    pub fn game_info(&self) -> String {
        format!(
            "Game[id={}, created={}, players={}, drawn={}, running={}]",
            self.id(),
            self.created_at_string(),
            self.players_count(),
            self.drawn_numbers().len(),
            self.is_running()
        )
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

fn new_game_id() -> String {
    let mut rng = rand::rng();
    format!("game_{:08x}", rng.random::<u32>())
}

/// Drive a started round to completion, one call per `interval`.
pub async fn run_round(game: Game, interval: Duration) {
    loop {
        match game.draw_next() {
            Ok(Some(DrawOutcome::Called(_))) => {}
            Ok(Some(DrawOutcome::Won { .. } | DrawOutcome::Exhausted)) | Ok(None) => break,
            Err(e) => {
                log_warning(&format!("Round stopped: {e}"));
                break;
            }
        }
        tokio::time::sleep(interval).await;
    }
    log_info(&format!("Round finished: {}", game.game_info()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::status::GameStatus;

    fn decode(batch: EventBatch) -> Vec<InboundEvent> {
        batch
            .events
            .into_iter()
            .map(|value| InboundEvent::from_value(value).unwrap())
            .collect()
    }

    fn play_out(game: &Game) -> DrawOutcome {
        loop {
            match game.draw_next().unwrap() {
                Some(DrawOutcome::Called(_)) => continue,
                Some(outcome) => return outcome,
                None => panic!("round is not running"),
            }
        }
    }

    #[test]
    fn test_game_creation() {
        let game = Game::new();
        assert!(game.id().starts_with("game_"));
        assert_eq!(game.id().len(), 13);
        assert!(game.created_at_string().contains("UTC"));
        assert!(!game.is_running());
        assert_eq!(game.players_count(), 0);
        assert_eq!(game.status_json()["status"], "waiting");
    }

    #[test]
    fn test_join_assigns_default_names() {
        let game = Game::new();
        let first = game.join(None).unwrap();
        let second = game.join(Some("  ".to_string())).unwrap();
        let third = game.join(Some("Ana".to_string())).unwrap();
        assert_eq!(first.name, "Player 1");
        assert_eq!(second.name, "Player 2");
        assert_eq!(third.name, "Ana");
        assert_ne!(first.player_id, second.player_id);
        assert_eq!(game.players_count(), 3);
    }

    #[test]
    fn test_snapshot_before_start() {
        let game = Game::new();
        let player = game.join(None).unwrap();
        let events = decode(game.events(&player.player_id, None).unwrap());
        assert!(matches!(events[0], InboundEvent::Card { .. }));
        assert_eq!(events.last(), Some(&InboundEvent::PlayersCount { count: Some(1) }));

        let admin = decode(game.events(ADMIN_ID, None).unwrap());
        assert_eq!(admin, vec![InboundEvent::PlayersCount { count: Some(1) }]);
    }

    #[test]
    fn test_unknown_subscriber() {
        let game = Game::new();
        assert!(game.events("player_nobody", None).is_err());
        assert!(game.leave("player_nobody").is_err());
    }

    #[test]
    fn test_feed_cursor_returns_only_new_events() {
        let game = Game::new();
        let player = game.join(None).unwrap();
        let first = game.events(&player.player_id, None).unwrap();
        let cursor = first.next;

        game.start_round().unwrap();
        game.draw_next().unwrap();

        let batch = game.events(&player.player_id, Some(cursor)).unwrap();
        let events = decode(batch.clone());
        assert_eq!(events[0], InboundEvent::GameStarted {});
        assert!(matches!(events[1], InboundEvent::Card { .. }));
        assert!(matches!(events[2], InboundEvent::Ball { .. }));

        let empty = game.events(&player.player_id, Some(batch.next)).unwrap();
        assert!(empty.events.is_empty());
        assert_eq!(empty.next, batch.next);
    }

    #[test]
    fn test_start_rejected_while_running() {
        let game = Game::new();
        game.start_round().unwrap();
        assert!(game.start_round().is_err());
        assert!(game.is_running());
    }

    #[test]
    fn test_round_without_players_exhausts_pouch() {
        let game = Game::new();
        game.start_round().unwrap();
        assert_eq!(play_out(&game), DrawOutcome::Exhausted);
        assert_eq!(game.drawn_numbers().len(), 75);
        assert!(!game.is_running());
        assert_eq!(game.draw_next().unwrap(), None);

        let admin = decode(game.events(ADMIN_ID, None).unwrap());
        assert!(admin.contains(&InboundEvent::GameOver { message: Some(NO_WINNER_MESSAGE.to_string()) }));
    }

    #[test]
    fn test_round_with_player_ends_in_bingo() {
        let game = Game::new();
        let player = game.join(Some("Ana".to_string())).unwrap();
        game.start_round().unwrap();

        match play_out(&game) {
            DrawOutcome::Won { winner, .. } => assert_eq!(winner, "Ana"),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(game.player_marks(&player.player_id).unwrap().has_bingo());
        assert_eq!(game.status_json()["status"], "finished");
    }

    #[test]
    fn test_live_feed_and_snapshot_agree_with_server() {
        let game = Game::new();
        let player = game.join(None).unwrap();

        let mut live = Session::new();
        let first = game.events(&player.player_id, None).unwrap();
        for value in first.events {
            live.apply_value(value);
        }

        game.start_round().unwrap();
        for _ in 0..10 {
            game.draw_next().unwrap();
        }

        let batch = game.events(&player.player_id, Some(first.next)).unwrap();
        for value in batch.events {
            live.apply_value(value);
        }

        let mut reconnected = Session::new();
        for value in game.events(&player.player_id, None).unwrap().events {
            reconnected.apply_value(value);
        }

        let server_marks = game.player_marks(&player.player_id).unwrap();
        assert_eq!(live.board().unwrap().marks(), &server_marks);
        assert_eq!(reconnected.board().unwrap().marks(), &server_marks);
        assert_eq!(live.history(), reconnected.history());
        assert_eq!(live.history().numbers(), game.drawn_numbers());
        assert_eq!(live.status(), reconnected.status());
    }

    #[test]
    fn test_late_joiner_snapshot_replays_history() {
        let game = Game::new();
        game.start_round().unwrap();
        for _ in 0..5 {
            game.draw_next().unwrap();
        }

        let player = game.join(None).unwrap();
        let mut session = Session::new();
        for value in game.events(&player.player_id, None).unwrap().events {
            session.apply_value(value);
        }

        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.history().numbers(), game.drawn_numbers());
        assert_eq!(session.board().unwrap().marks(), &game.player_marks(&player.player_id).unwrap());
    }

    #[test]
    fn test_new_round_drops_previous_feed() {
        let game = Game::new();
        let player = game.join(None).unwrap();
        let behind = game.events(&player.player_id, None).unwrap().next;

        game.start_round().unwrap();
        play_out(&game);
        let caught_up = game.events(&player.player_id, Some(behind)).unwrap().next;
        assert!(caught_up > behind);

        game.start_round().unwrap();
        {
            let state = game.state.lock().unwrap();
            assert_eq!(state.players[&player.player_id].feed.events.len(), 2);
            assert_eq!(state.admin_feed.events.len(), 1);
        }

        let live = decode(game.events(&player.player_id, Some(caught_up)).unwrap());
        assert_eq!(live.len(), 2);
        assert_eq!(live[0], InboundEvent::GameStarted {});
        assert!(matches!(live[1], InboundEvent::Card { .. }));

        let batch = game.events(&player.player_id, Some(behind)).unwrap();
        assert_eq!(batch.next, caught_up + 2);
        let snapshot = decode(batch);
        assert_eq!(snapshot[0], InboundEvent::GameStarted {});
        assert!(matches!(snapshot[1], InboundEvent::Card { .. }));
        assert_eq!(snapshot.last(), Some(&InboundEvent::PlayersCount { count: Some(1) }));
    }

    #[test]
    fn test_feed_window() {
        let mut feed = Feed::default();
        feed.push(InboundEvent::GameStarted {});
        feed.trim();
        feed.push(InboundEvent::PlayersCount { count: Some(1) });
        assert_eq!(feed.end(), 2);
        assert!(feed.since(0).is_none());
        assert_eq!(feed.since(1).map(<[InboundEvent]>::len), Some(1));
        assert_eq!(feed.since(2).map(<[InboundEvent]>::len), Some(0));
        assert!(feed.since(3).is_none());
    }

    #[test]
    fn test_leave_updates_count() {
        let game = Game::new();
        let stays = game.join(None).unwrap();
        let goes = game.join(None).unwrap();
        let cursor = game.events(&stays.player_id, None).unwrap().next;

        game.leave(&goes.player_id).unwrap();
        let events = decode(game.events(&stays.player_id, Some(cursor)).unwrap());
        assert_eq!(events, vec![InboundEvent::PlayersCount { count: Some(1) }]);
    }
}

// src/events.rs
// Wire events exchanged between the server and its player/admin clients.
//
// Every event is a JSON object tagged by its "event" field, e.g.
//   {"event":"ball","letter":"G","number":50}
//   {"event":"game_started"}
// Optional fields fall back to their defaults when absent.

use serde::{Deserialize, Serialize};

/// Numbers as they travel on the wire. Wider than `Number` so that a bad
/// entry is rejected by the session, not by the decoder.
pub type WireNumber = i64;

/// Events pushed by the server and consumed by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundEvent {
    Card {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        text: String,
    },
    History {
        #[serde(default)]
        numbers: Vec<WireNumber>,
    },
    Ball {
        #[serde(default)]
        letter: String,
        number: WireNumber,
    },
    Winner {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GameOver {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GameStarted {},
    PlayersCount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u32>,
    },
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Card { .. } => "card",
            InboundEvent::History { .. } => "history",
            InboundEvent::Ball { .. } => "ball",
            InboundEvent::Winner { .. } => "winner",
            InboundEvent::GameOver { .. } => "game_over",
            InboundEvent::GameStarted {} => "game_started",
            InboundEvent::PlayersCount { .. } => "players_count",
        }
    }

    /// Decode one event; anything malformed is returned as an error string
    /// so callers can log and skip it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, String> {
        let raw = value.to_string();
        serde_json::from_value(value).map_err(|e| format!("undecodable event {raw}: {e}"))
    }
}

/// Commands sent by the administrative role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundEvent {
    StartGame {},
}

/// Body of `GET /events/{subscriber}`. Events stay raw JSON so one bad
/// event does not poison the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<serde_json::Value>,
    pub next: usize,
}

impl EventBatch {
    pub fn from_events(events: &[InboundEvent], next: usize) -> Self {
        EventBatch {
            events: events
                .iter()
                .filter_map(|event| serde_json::to_value(event).ok())
                .collect(),
            next,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub player_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub accepted: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// src/clients/api_client.rs
// HTTP API client for bingo game communication

use std::error::Error;

use super::common::{build_http_client, get_json, is_not_found, post_json};
use crate::config::ClientConfig;
use crate::events::{CommandResponse, EventBatch, JoinRequest, JoinResponse, OutboundEvent};
use crate::game::ADMIN_ID;
use crate::logging::log_warning;
use crate::session::{Session, SessionUpdate};

#[derive(Debug, Clone)]
pub struct BingoApi {
    server_url: String,
    http_client: reqwest::Client,
}

impl BingoApi {
    pub fn new(config: &ClientConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            server_url: config.server_url(),
            http_client: build_http_client(config.timeout)?,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Register as a player. An empty name lets the server pick one.
    pub async fn join(&self, name: Option<&str>) -> Result<JoinResponse, Box<dyn Error>> {
        let request = JoinRequest {
            name: name.map(str::to_string).filter(|name| !name.is_empty()),
        };
        post_json(&self.http_client, &format!("{}/join", self.server_url), &request).await
    }

    pub async fn leave(&self, player_id: &str) -> Result<(), Box<dyn Error>> {
        let url = format!("{}/leave/{player_id}", self.server_url);
        let _: serde_json::Value = post_json(&self.http_client, &url, &()).await?;
        Ok(())
    }

    /// Fetch the events after `since`, or a snapshot when `since` is `None`.
    pub async fn poll_events(&self, subscriber: &str, since: Option<usize>) -> Result<EventBatch, Box<dyn Error>> {
        let url = match since {
            Some(cursor) => format!("{}/events/{subscriber}?since={cursor}", self.server_url),
            None => format!("{}/events/{subscriber}", self.server_url),
        };
        get_json(&self.http_client, &url).await
    }

    /// Ask the server to start a round. A refusal is not an error: it comes
    /// back with `accepted == false` and the server's reason.
    pub async fn start_game(&self) -> Result<CommandResponse, Box<dyn Error>> {
        let response = self
            .http_client
            .post(format!("{}/command", self.server_url))
            .json(&OutboundEvent::StartGame {})
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|_| Box::<dyn Error>::from(format!("start_game failed with status {status}: {text}")))
    }

    pub async fn server_status(&self) -> Result<serde_json::Value, Box<dyn Error>> {
        get_json(&self.http_client, &format!("{}/status", self.server_url)).await
    }
}

/// A subscriber's view of its feed: the cursor plus the session the events
/// are applied to.
#[derive(Debug, Clone)]
pub struct Subscription {
    subscriber: String,
    cursor: Option<usize>,
    session: Session,
}

impl Subscription {
    pub fn player(player_id: &str, name: &str) -> Self {
        let mut session = Session::new();
        session.set_player_name(name);
        Self { subscriber: player_id.to_string(), cursor: None, session }
    }

    pub fn admin() -> Self {
        Self { subscriber: ADMIN_ID.to_string(), cursor: None, session: Session::new() }
    }

    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Forget the cursor so the next poll rebuilds the session from a snapshot.
    pub fn resync(&mut self) {
        self.cursor = None;
    }

    /// Apply one batch; returns what each event did.
    pub fn apply_batch(&mut self, batch: EventBatch) -> Vec<SessionUpdate> {
        let updates = batch
            .events
            .into_iter()
            .filter_map(|value| self.session.apply_value(value))
            .collect();
        self.cursor = Some(batch.next);
        updates
    }

    /// Poll the server once and apply whatever arrived.
    pub async fn pump(&mut self, api: &BingoApi) -> Result<Vec<SessionUpdate>, Box<dyn Error>> {
        let batch = api.poll_events(&self.subscriber, self.cursor).await?;
        Ok(self.apply_batch(batch))
    }

    /// Join again under the current player name and start over from the
    /// new player's snapshot.
    pub async fn rejoin(&mut self, api: &BingoApi) -> Result<JoinResponse, Box<dyn Error>> {
        let name = self.session.player_name().map(str::to_string);
        let joined = api.join(name.as_deref()).await?;
        *self = Subscription::player(&joined.player_id, &joined.name);
        Ok(joined)
    }

    /// `pump`, except that a player the server no longer knows (it was
    /// restarted) joins again and rebuilds from the new snapshot.
    pub async fn pump_or_rejoin(&mut self, api: &BingoApi) -> Result<Vec<SessionUpdate>, Box<dyn Error>> {
        match self.pump(api).await {
            Err(e) if self.subscriber != ADMIN_ID && is_not_found(e.as_ref()) => {
                log_warning(&format!("{e}, joining again"));
                self.rejoin(api).await?;
                self.pump(api).await
            }
            result => result,
        }
    }
}

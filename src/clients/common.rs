// src/clients/common.rs
// HTTP utilities shared between client applications

use std::error::Error;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::ErrorResponse;

/// An error status answered by the server
#[derive(Debug)]
pub struct ServerError {
    pub status: reqwest::StatusCode,
    pub message: String,
}

impl ServerError {
    pub fn is_not_found(&self) -> bool {
        self.status == reqwest::StatusCode::NOT_FOUND
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server error ({}): {}", self.status, self.message)
    }
}

impl Error for ServerError {}

/// True when `error` is the server saying it does not know the resource
pub fn is_not_found(error: &(dyn Error + 'static)) -> bool {
    error.downcast_ref::<ServerError>().is_some_and(ServerError::is_not_found)
}

/// Build the HTTP client every request of a client application goes through
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// HTTP GET request returning JSON
pub async fn get_json<T>(client: &reqwest::Client, url: &str) -> Result<T, Box<dyn Error>>
where
    T: for<'de> Deserialize<'de>,
{
    let response = client.get(url).send().await?;
    read_json(response).await
}

/// HTTP POST request with JSON body
pub async fn post_json<T, U>(client: &reqwest::Client, url: &str, body: &T) -> Result<U, Box<dyn Error>>
where
    T: Serialize,
    U: for<'de> Deserialize<'de>,
{
    let response = client.post(url).json(body).send().await?;
    read_json(response).await
}

async fn read_json<T>(response: reqwest::Response) -> Result<T, Box<dyn Error>>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    // Prefer the server's own error message when it sent one
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(error) => error.error,
        Err(_) => "HTTP request failed".to_string(),
    };
    Err(Box::new(ServerError { status, message }))
}

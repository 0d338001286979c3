// src/server.rs
// HTTP front of the game: players join, every subscriber polls its event
// feed, and the admin starts rounds.
//
// Routes:
//   POST /join                    {"name": ...}        -> JoinResponse
//   POST /leave/{player_id}                             -> {"left": id}
//   GET  /events/{subscriber}?since=N                   -> EventBatch
//   POST /command                 {"event":"start_game"} -> CommandResponse
//   GET  /status                                        -> game status

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Bytes, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::events::{CommandResponse, ErrorResponse, JoinRequest, OutboundEvent};
use crate::game::{run_round, Game};
use crate::logging::{log_error_stderr, log_info, log_warning};

// Start the HTTP server with Tokio
pub fn start_server(config: ServerConfig, game: Game) -> (tokio::task::JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown_signal);

    let handle = tokio::spawn(async move {
        let ip = config.host.parse::<std::net::IpAddr>().unwrap_or([127, 0, 0, 1].into());
        let addr = SocketAddr::from((ip, config.port));
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                log_error_stderr(&format!("Failed to start API server: {e}"));
                return;
            }
        };

        log_info(&format!("Server listening on http://{addr}"));
        let interval = Duration::from_millis(config.call_interval_ms);
        serve(listener, game, interval, shutdown_clone).await;
    });

    (handle, shutdown_signal)
}

/// Accept connections on `listener` until `shutdown` is raised.
pub async fn serve(listener: TcpListener, game: Game, interval: Duration, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        // Accept with a timeout so the shutdown flag is rechecked
        let accept_result = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, _))) => {
                let game = game.clone();
                let io = TokioIo::new(stream);

                tokio::spawn(async move {
                    let service = service_fn(move |req| handle_request(req, game.clone(), interval));

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        log_error_stderr(&format!("Error serving connection: {err:?}"));
                    }
                });
            }
            Ok(Err(e)) => {
                log_error_stderr(&format!("Error accepting connection: {e}"));
                break;
            }
            Err(_) => {}
        }
    }
    log_info("API Server shutting down...");
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    game: Game,
    interval: Duration,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let body = match req.collect().await {
        Ok(body) => body.to_bytes(),
        Err(_) => return Ok(error_response(StatusCode::BAD_REQUEST, "Failed to read request body")),
    };

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/join") => handle_join(&body, &game),
        (&Method::POST, path) if path.starts_with("/leave/") => handle_leave(&path[7..], &game),
        (&Method::GET, path) if path.starts_with("/events/") => {
            handle_events(&path[8..], query.as_deref(), &game)
        }
        (&Method::POST, "/command") => {
            let (response, started) = handle_command(&body, &game);
            if started {
                tokio::spawn(run_round(game.clone(), interval));
            }
            response
        }
        (&Method::GET, "/status") => json_response(StatusCode::OK, &game.status_json()),
        _ => error_response(StatusCode::NOT_FOUND, "Endpoint not found"),
    };

    Ok(response)
}

fn handle_join(body: &Bytes, game: &Game) -> Response<Full<Bytes>> {
    let request: JoinRequest = if body.is_empty() {
        JoinRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON in request body"),
        }
    };

    match game.join(request.name) {
        Ok(joined) => json_response(StatusCode::OK, &joined),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

fn handle_leave(player_id: &str, game: &Game) -> Response<Full<Bytes>> {
    match game.leave(player_id) {
        Ok(()) => json_response(StatusCode::OK, &json!({ "left": player_id })),
        Err(e) => error_response(StatusCode::NOT_FOUND, &e),
    }
}

fn handle_events(subscriber: &str, query: Option<&str>, game: &Game) -> Response<Full<Bytes>> {
    let since = match parse_since(query) {
        Ok(since) => since,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    match game.events(subscriber, since) {
        Ok(batch) => json_response(StatusCode::OK, &batch),
        Err(e) => error_response(StatusCode::NOT_FOUND, &e),
    }
}

// Returns the response and whether a round was started.
fn handle_command(body: &Bytes, game: &Game) -> (Response<Full<Bytes>>, bool) {
    let command: OutboundEvent = match serde_json::from_slice(body) {
        Ok(command) => command,
        Err(_) => return (error_response(StatusCode::BAD_REQUEST, "Unknown or malformed command"), false),
    };

    match command {
        OutboundEvent::StartGame {} => match game.start_round() {
            Ok(game_id) => {
                let reply = CommandResponse { accepted: true, message: format!("Game started: {game_id}") };
                (json_response(StatusCode::OK, &reply), true)
            }
            Err(e) => {
                log_warning(&format!("start_game rejected: {e}"));
                let reply = CommandResponse { accepted: false, message: e };
                (json_response(StatusCode::CONFLICT, &reply), false)
            }
        },
    }
}

fn parse_since(query: Option<&str>) -> Result<Option<usize>, String> {
    let Some(query) = query else {
        return Ok(None);
    };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("since=") {
            return value
                .parse::<usize>()
                .map(Some)
                .map_err(|_| format!("Invalid cursor '{value}'"));
        }
    }
    Ok(None)
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &ErrorResponse { error: message.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBatch, InboundEvent, JoinResponse};

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_since() {
        assert_eq!(parse_since(None), Ok(None));
        assert_eq!(parse_since(Some("since=4")), Ok(Some(4)));
        assert_eq!(parse_since(Some("x=1&since=0")), Ok(Some(0)));
        assert_eq!(parse_since(Some("x=1")), Ok(None));
        assert!(parse_since(Some("since=-1")).is_err());
    }

    #[tokio::test]
    async fn test_join_with_empty_body() {
        let game = Game::new();
        let response = handle_join(&Bytes::new(), &game);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let joined: JoinResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(joined.name, "Player 1");
    }

    #[tokio::test]
    async fn test_join_rejects_bad_json() {
        let game = Game::new();
        let response = handle_join(&Bytes::from_static(b"{name"), &game);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn test_events_for_unknown_subscriber() {
        let game = Game::new();
        let response = handle_events("player_missing", None, &game);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_command_twice() {
        let game = Game::new();
        let body = Bytes::from_static(br#"{"event":"start_game"}"#);

        let (first, started) = handle_command(&body, &game);
        assert!(started);
        assert_eq!(body_json(first).await["accepted"], true);

        let (second, started) = handle_command(&body, &game);
        assert!(!started);
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["accepted"], false);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let game = Game::new();
        let (response, started) = handle_command(&Bytes::from_static(br#"{"event":"pause"}"#), &game);
        assert!(!started);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_round_over_http() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = Arc::new(AtomicBool::new(false));
        let server = tokio::spawn(serve(listener, Game::new(), Duration::from_millis(1), Arc::clone(&shutdown)));

        let http = reqwest::Client::new();
        let joined: JoinResponse = http
            .post(format!("{base}/join"))
            .json(&json!({ "name": "Ana" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(joined.name, "Ana");

        let started: CommandResponse = http
            .post(format!("{base}/command"))
            .json(&OutboundEvent::StartGame {})
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(started.accepted);

        let mut finished = false;
        for _ in 0..200 {
            let status: serde_json::Value =
                http.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
            if status["status"] == "finished" {
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(finished);

        let batch: EventBatch = http
            .get(format!("{base}/events/{}", joined.player_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let events: Vec<InboundEvent> =
            batch.events.into_iter().map(|value| InboundEvent::from_value(value).unwrap()).collect();
        assert!(events.contains(&InboundEvent::Winner { message: Some("Ana has BINGO!".to_string()) }));

        shutdown.store(true, Ordering::Relaxed);
        server.await.unwrap();
    }
}

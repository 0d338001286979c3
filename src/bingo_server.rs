// src/bingo_server.rs
// Entry point of the bingo server: loads the configuration, serves the
// game over HTTP and stops on ESC. Without a console it runs until killed.

use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;

use bingo::config::ServerConfig;
use bingo::game::Game;
use bingo::logging::{log_error, log_info};
use bingo::server;
use bingo::terminal::{self, KeyAction};

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo Server - Deal cards, call numbers and announce winners")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Port to listen on (overrides conf/server.conf)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = ServerConfig::load_or_default();
    if let Some(port) = args.port {
        config.port = port;
    }

    let game = Game::new();
    log_info(&format!("Created new game instance: {}", game.game_info()));
    log_info(&format!("One call every {} ms", config.call_interval_ms));

    let (server_handle, shutdown_signal) = server::start_server(config, game.clone());

    println!("Press ESC to stop the server");
    loop {
        if server_handle.is_finished() {
            break;
        }
        match terminal::poll_key(Duration::from_millis(200)) {
            Ok(KeyAction::Exit) => {
                shutdown_signal.store(true, Ordering::Relaxed);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                log_info(&format!("Console input unavailable ({e}), serving until killed"));
                break;
            }
        }
    }

    if let Err(e) = server_handle.await {
        log_error(&format!("Server task failed: {e}"));
    }
    log_info(&format!("Final state: {}", game.game_info()));
}

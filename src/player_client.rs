// src/player_client.rs
//
// Terminal bingo player. Joins the server, receives a card and follows the
// round live: calls are marked as they arrive and a reconnect rebuilds the
// card from the server's snapshot.
//
// Interactive Controls:
// - F5: Resync from a fresh server snapshot
// - ESC: Leave the game and exit
//
// CLI Options:
// - --name: Player name (falls back to client_name in conf/client.conf)
// - --exit: Show the current state once and exit

use std::error::Error;
use std::time::Duration;

use clap::Parser;

use bingo::clients::api_client::{BingoApi, Subscription};
use bingo::config::ClientConfig;
use bingo::logging::{log_to_stderr, log_warning};
use bingo::terminal::{self, KeyAction};

const HINT: &str = "ESC: leave the game    F5: refresh";

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo Player Client - Join a game and follow your card live")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Player name (the server assigns one when empty)
    #[arg(long)]
    name: Option<String>,

    /// Exit after displaying the current state (no interactive loop)
    #[arg(long)]
    exit: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match run_player(args).await {
        Ok(_) => {
            println!("Player client finished.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_player(args: Args) -> Result<(), Box<dyn Error>> {
    // Log lines would tear the redrawn screen
    log_to_stderr(true);
    terminal::clear_screen();

    let config = ClientConfig::load_or_default();
    let api = BingoApi::new(&config)?;

    println!("Bingo Player");
    print!("Connecting to server at {}...", api.server_url());
    if let Err(e) = api.server_status().await {
        eprintln!("Error. Failed to connect to server: {e}");
        eprintln!("Make sure the bingo server is running on {}", api.server_url());
        return Err(e);
    }
    println!("Ok.");

    let name = args.name.unwrap_or_else(|| config.client_name.clone());
    let joined = api.join(Some(&name)).await?;
    let mut subscription = Subscription::player(&joined.player_id, &joined.name);

    subscription.pump(&api).await?;
    terminal::show_session(subscription.session(), HINT);

    if args.exit {
        return api.leave(subscription.subscriber()).await;
    }

    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let mut connected = true;
    loop {
        match terminal::poll_key(poll_interval)? {
            KeyAction::Exit => break,
            KeyAction::Refresh => subscription.resync(),
            KeyAction::Start | KeyAction::Nothing => {}
        }

        match subscription.pump_or_rejoin(&api).await {
            Ok(updates) => {
                if !updates.is_empty() || !connected {
                    terminal::show_session(subscription.session(), HINT);
                }
                connected = true;
            }
            Err(e) => {
                if connected {
                    log_warning(&format!("Lost contact with the server: {e}"));
                }
                connected = false;
                // Rebuild from a snapshot once the server answers again
                subscription.resync();
            }
        }
    }

    if let Err(e) = api.leave(subscription.subscriber()).await {
        log_warning(&format!("Failed to leave cleanly: {e}"));
    }
    Ok(())
}

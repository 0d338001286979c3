// src/admin_client.rs
//
// Terminal admin console. Follows the admin feed (calls, winner, players
// connected) and starts rounds.
//
// Interactive Controls:
// - ENTER: Start a new round
// - F5: Resync from a fresh server snapshot
// - ESC: Exit the console
//
// CLI Options:
// - --start: Start a round right away
// - --exit: Show the current state once and exit

use std::error::Error;
use std::time::Duration;

use clap::Parser;

use bingo::clients::api_client::{BingoApi, Subscription};
use bingo::config::ClientConfig;
use bingo::logging::{log_to_stderr, log_warning};
use bingo::terminal::{self, KeyAction};

const HINT: &str = "ENTER: start a round    F5: refresh    ESC: exit";

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo Admin Client - Start rounds and watch the calls")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Start a round before entering the console
    #[arg(long)]
    start: bool,

    /// Exit after displaying the current state (no interactive loop)
    #[arg(long)]
    exit: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match run_admin(args).await {
        Ok(_) => {
            println!("Admin client finished.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn start_round(api: &BingoApi) -> String {
    match api.start_game().await {
        Ok(reply) if reply.accepted => reply.message,
        Ok(reply) => format!("Start refused: {}", reply.message),
        Err(e) => format!("Start failed: {e}"),
    }
}

async fn run_admin(args: Args) -> Result<(), Box<dyn Error>> {
    log_to_stderr(true);
    terminal::clear_screen();

    let config = ClientConfig::load_or_default();
    let api = BingoApi::new(&config)?;

    println!("Bingo Admin");
    print!("Connecting to server at {}...", api.server_url());
    if let Err(e) = api.server_status().await {
        eprintln!("Error. Failed to connect to server: {e}");
        eprintln!("Make sure the bingo server is running on {}", api.server_url());
        return Err(e);
    }
    println!("Ok.");

    let mut subscription = Subscription::admin();
    let mut notice = String::new();

    if args.start {
        notice = start_round(&api).await;
    }

    subscription.pump(&api).await?;
    terminal::show_session(subscription.session(), &format!("{notice}\n{HINT}"));

    if args.exit {
        return Ok(());
    }

    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    loop {
        let mut redraw = false;
        match terminal::poll_key(poll_interval)? {
            KeyAction::Exit => break,
            KeyAction::Start => {
                notice = start_round(&api).await;
                redraw = true;
            }
            KeyAction::Refresh => subscription.resync(),
            KeyAction::Nothing => {}
        }

        match subscription.pump(&api).await {
            Ok(updates) => redraw |= !updates.is_empty(),
            Err(e) => {
                log_warning(&format!("Polling failed: {e}"));
                subscription.resync();
            }
        }

        if redraw {
            terminal::show_session(subscription.session(), &format!("{notice}\n{HINT}"));
        }
    }

    Ok(())
}

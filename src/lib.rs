// lib.rs
// Library modules for the bingo game

pub mod defs;
pub mod logging;
pub mod config;
pub mod card;
pub mod board;
pub mod history;
pub mod status;
pub mod events;
pub mod session;
pub mod pouch;
pub mod game;
pub mod server;
pub mod terminal;
pub mod clients;

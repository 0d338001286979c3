// src/clients/mod.rs
// Client library shared by the player and admin binaries.
//
// - common: HTTP helpers over reqwest
// - api_client: the bingo endpoints and the polling subscription that feeds a Session

pub mod common;
pub mod api_client;

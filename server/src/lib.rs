//! # Card Duel Server Library
//!
//! This library provides the session server for a two-player, turn-based card
//! battle. It accepts text connections, pairs waiting players into matches,
//! runs every match as its own locked state machine, and relays chat and
//! actions between the two participants.
//!
//! ## Core Responsibilities
//!
//! ### Player Registry
//! Tracks every connected player from the name handshake until disconnect:
//! - Player ID assignment and capacity enforcement
//! - Lobby-wide chat for players that are not in a match
//! - Cleanup of the player's queue entry, match and outbound channel
//!
//! ### Matchmaking
//! A bounded FIFO queue feeds a single pairing loop. A player left waiting
//! alone is put back at the end of the queue after the pairing timeout, so
//! nobody starves and nothing spins.
//!
//! ### Match Sessions
//! Each match owns both hands, both life totals and the turn indicator behind
//! its own mutex. Independent matches never contend with each other.
//!
//! ## Concurrency Model
//!
//! There is no global lock. Locking is scoped to the smallest resource:
//! - the registry lock
//! - the queue's channel
//! - each player's own state lock
//! - each match's lock
//! - the booster inventory lock
//!
//! A path that needs a player and its match takes the player lock, releases
//! it, then takes the match lock. Lines sent while a lock is held go through
//! non-blocking outbound lanes, so a slow socket never stalls a match.
//!
//! ## Module Organization
//!
//! - `catalog`: card definitions, rarities and damage values
//! - `inventory`: the shared booster pack pool
//! - `player`: player state and the two-lane outbound path
//! - `registry`: connected players
//! - `queue`: the matchmaking queue with ticketed entries
//! - `session`: the per-match state machine
//! - `lobby`: shared context and the game operations
//! - `matchmaking`: the pairing loop
//! - `relay`: per-connection reader, command dispatch and writer
//! - `probe`: the UDP `ping`/`pong` latency responder
//! - `network`: listeners and task startup
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory;
pub mod lobby;
pub mod matchmaking;
pub mod network;
pub mod player;
pub mod probe;
pub mod queue;
pub mod registry;
pub mod relay;
pub mod session;
pub mod utils;

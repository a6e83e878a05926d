//! # Card Duel Client Library
//!
//! A terminal client for the card duel server. It relays typed lines to the
//! server, prints what the server sends back, and can measure the round trip
//! to the server's UDP latency probe.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! The TCP session: name handshake, line forwarding and the local commands
//! `/exit` and `/latencia`.
//!
//! ### Latency Module (`latency`)
//! A single `ping`/`pong` exchange with a fixed timeout. A lost or wrong
//! reply is reported as "latency unavailable" rather than an error.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:4000", "127.0.0.1:4001").await?;
//!     client
//!         .run(Some("Alice".into()), BufReader::new(tokio::io::stdin()), tokio::io::stdout())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod latency;
pub mod network;

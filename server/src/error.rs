//! Error types for the game server
//!
//! [`GameError`] covers everything that is reported back to a player as a
//! text line while the connection stays open. [`ServerError`] covers startup
//! failures that end the process.

use shared::CardId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("It is not your turn")]
    NotYourTurn,
    #[error("Card {0} is not in your hand")]
    CardNotInHand(CardId),
    #[error("You are not in a match")]
    NotInMatch,
    #[error("No boosters available")]
    NoBoostersAvailable,
    #[error("Queue full, try again later")]
    QueueFull,
    #[error("You are already in a match")]
    AlreadyInMatch,
    #[error("You are already in the queue")]
    AlreadyQueued,
    #[error("You are not in the queue")]
    NotQueued,
    #[error("Server full")]
    ServerFull,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub(crate) fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        ServerError::Bind {
            addr: addr.into(),
            source,
        }
    }
}

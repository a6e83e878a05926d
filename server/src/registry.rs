//! Registry of connected players
//!
//! This module tracks every player from registration to removal:
//! - Player ID assignment and capacity enforcement
//! - Membership queries used by cleanup paths
//! - Lobby-wide broadcast to players that are not in a match
//!
//! The registry only owns membership. Match cleanup on removal is driven by
//! [`crate::lobby::Lobby::remove_player`], which calls into the registry first.

use crate::error::GameError;
use crate::player::{Outbound, Player, PlayerId};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Roster {
    players: HashMap<PlayerId, Arc<Player>>,
    next_player_id: u64,
}

/// All connected players, indexed by their unique ID
pub struct PlayerRegistry {
    roster: RwLock<Roster>,
    /// Maximum number of concurrent players allowed
    max_players: usize,
}

impl PlayerRegistry {
    /// Creates an empty registry; player IDs start from 1
    pub fn new(max_players: usize) -> Self {
        Self {
            roster: RwLock::new(Roster {
                players: HashMap::new(),
                next_player_id: 1,
            }),
            max_players,
        }
    }

    /// Assigns an ID to a new player and inserts it
    ///
    /// Fails with [`GameError::ServerFull`] once the capacity limit is reached.
    pub async fn register(&self, name: String, outbound: Outbound) -> Result<Arc<Player>, GameError> {
        let mut roster = self.roster.write().await;
        if roster.players.len() >= self.max_players {
            return Err(GameError::ServerFull);
        }

        let id = PlayerId(roster.next_player_id);
        roster.next_player_id += 1;

        let player = Arc::new(Player::new(id, name, outbound));
        info!("Player {} ({}) connected", id, player.name);
        roster.players.insert(id, Arc::clone(&player));

        Ok(player)
    }

    /// Removes a player and hands it back to the caller for cleanup.
    /// Returns `None` if it was already gone.
    pub async fn remove(&self, id: PlayerId) -> Option<Arc<Player>> {
        let removed = self.roster.write().await.players.remove(&id);
        if let Some(player) = &removed {
            info!("Player {} ({}) removed", id, player.name);
        }
        removed
    }

    /// Looks up a connected player
    pub async fn get(&self, id: PlayerId) -> Option<Arc<Player>> {
        self.roster.read().await.players.get(&id).cloned()
    }

    /// Checks if a player is still connected
    pub async fn contains(&self, id: PlayerId) -> bool {
        self.roster.read().await.players.contains_key(&id)
    }

    /// Number of connected players
    pub async fn len(&self) -> usize {
        self.roster.read().await.players.len()
    }

    /// Returns true when nobody is connected
    pub async fn is_empty(&self) -> bool {
        self.roster.read().await.players.is_empty()
    }

    /// Best-effort delivery to every player outside a match, except `exclude`.
    /// Returns how many players accepted the line.
    pub async fn broadcast(&self, line: &str, exclude: Option<PlayerId>) -> usize {
        let recipients: Vec<Arc<Player>> = {
            let roster = self.roster.read().await;
            roster
                .players
                .values()
                .filter(|player| Some(player.id) != exclude)
                .cloned()
                .collect()
        };

        let mut delivered = 0;
        for player in recipients {
            if player.in_match().await {
                continue;
            }
            if player.outbound.notify(line) {
                delivered += 1;
            }
        }
        delivered
    }
}

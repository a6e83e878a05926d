//! Shared server context and the operation-level game contract
//!
//! The [`Lobby`] owns every shared store, each behind its own lock:
//! - the player registry
//! - the matchmaking queue
//! - the booster inventory
//! - the index of active matches, where every match has its own mutex
//!
//! Lock ordering: a path that needs a player's state and that player's match
//! takes the player lock, releases it, and only then locks the match. The
//! index lock is only ever held for a lookup, insert or removal. Sends made
//! under a match lock go through non-blocking lanes (see
//! [`crate::player::Outbound`]).

use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::error::GameError;
use crate::inventory::BoosterInventory;
use crate::player::{Outbound, Player, PlayerId};
use crate::queue::MatchQueue;
use crate::registry::PlayerRegistry;
use crate::session::{Match, MatchId};
use crate::utils::banner;
use log::info;
use shared::{Action, CardId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub type MatchHandle = Arc<Mutex<Match>>;

/// Active matches, keyed by ID
pub struct MatchIndex {
    matches: RwLock<HashMap<MatchId, MatchHandle>>,
    next_match_id: AtomicU64,
}

impl MatchIndex {
    /// Creates an empty index; match ids start at 1
    pub fn new() -> Self {
        Self {
            matches: RwLock::new(HashMap::new()),
            next_match_id: AtomicU64::new(1),
        }
    }

    /// Reserves a fresh match id. Ids are never reused, even for pairings
    /// that fall through.
    pub fn next_id(&self) -> MatchId {
        MatchId(self.next_match_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Stores a new match and returns the shared handle to it
    pub async fn insert(&self, game: Match) -> MatchHandle {
        let id = game.id();
        let handle = Arc::new(Mutex::new(game));
        self.matches.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    /// Looks up a running match
    pub async fn get(&self, id: MatchId) -> Option<MatchHandle> {
        self.matches.read().await.get(&id).cloned()
    }

    /// Removes a match; only the first caller gets the handle back
    pub async fn remove(&self, id: MatchId) -> Option<MatchHandle> {
        self.matches.write().await.remove(&id)
    }

    /// Returns true while the match is still running
    pub async fn contains(&self, id: MatchId) -> bool {
        self.matches.read().await.contains_key(&id)
    }

    /// Number of running matches
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    /// Returns true when no match is running
    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }
}

impl Default for MatchIndex {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Lobby {
    pub(crate) config: ServerConfig,
    pub(crate) catalog: Catalog,
    pub(crate) inventory: BoosterInventory,
    pub(crate) registry: PlayerRegistry,
    pub(crate) queue: MatchQueue,
    pub(crate) matches: Arc<MatchIndex>,
}

impl Lobby {
    /// Builds the stock catalog and a freshly generated inventory
    pub fn new(config: ServerConfig) -> Self {
        let catalog = Catalog::standard();
        info!("Initialized catalog with {} cards", catalog.len());
        let inventory = BoosterInventory::generate(&catalog, config.boosters, &mut rand::thread_rng());
        Self::with_parts(config, catalog, inventory)
    }

    /// Builds a lobby around an existing catalog and inventory
    pub fn with_parts(config: ServerConfig, catalog: Catalog, inventory: BoosterInventory) -> Self {
        Self {
            registry: PlayerRegistry::new(config.max_players),
            queue: MatchQueue::new(config.queue_capacity),
            matches: Arc::new(MatchIndex::new()),
            config,
            catalog,
            inventory,
        }
    }

    /// Configuration the server was started with
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn inventory(&self) -> &BoosterInventory {
        &self.inventory
    }

    /// Connected players
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Players waiting for an opponent
    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    /// Running matches by id
    pub fn matches(&self) -> &MatchIndex {
        &self.matches
    }

    /// Admits a new connection, failing with `ServerFull` at capacity
    pub async fn register(&self, name: String, outbound: Outbound) -> Result<Arc<Player>, GameError> {
        self.registry.register(name, outbound).await
    }

    /// Removes a player from the registry and tears down whatever it was part
    /// of: its queue entry goes stale, its match is abandoned and the opponent
    /// told, and its outbound channel is closed. Safe to call more than once.
    pub async fn remove_player(&self, id: PlayerId) {
        let Some(player) = self.registry.remove(id).await else {
            return;
        };

        let current = {
            let mut state = player.state.lock().await;
            state.connected = false;
            state.queue_ticket = None;
            state.current_match.take()
        };

        if let Some(match_id) = current {
            self.abandon_match(match_id, id).await;
        }

        player.outbound.close();
    }

    /// Ends a match because `departed` left. A match that is already gone is
    /// left alone, so a second notification is a no-op.
    pub async fn abandon_match(&self, id: MatchId, departed: PlayerId) {
        let Some(handle) = self.matches.remove(id).await else {
            return;
        };

        let survivor = {
            let mut game = handle.lock().await;
            let survivor = game.abandon(departed);
            if let Some(survivor) = &survivor {
                survivor
                    .outbound
                    .deliver(banner("Opponent disconnected, match over"));
            }
            survivor
        };

        if let Some(survivor) = survivor {
            survivor.leave_match(id).await;
            info!("{} abandoned by player {}, {} is free", id, departed, survivor.name);
        }
    }

    /// Handles `/entrar`. Returns the queue length after joining.
    pub async fn join_queue(&self, player: &Arc<Player>) -> Result<usize, GameError> {
        self.queue.enqueue(player).await
    }

    /// Handles `/sair`. A player who is being paired right now is taken out
    /// of that pairing too.
    pub async fn leave_queue(&self, player: &Player) -> Result<(), GameError> {
        self.queue.leave(player).await
    }

    /// Looks up the live match a player belongs to
    pub async fn match_for(&self, player: &Player) -> Result<(MatchId, MatchHandle), GameError> {
        let id = player.current_match().await.ok_or(GameError::NotInMatch)?;
        let handle = self.matches.get(id).await.ok_or(GameError::NotInMatch)?;
        Ok((id, handle))
    }

    /// Lists the hand of a player in a match
    pub async fn show_hand(&self, player: &Player) -> Result<String, GameError> {
        let (_, handle) = self.match_for(player).await?;
        let game = handle.lock().await;
        game.ensure_active(player.id)?;
        Ok(game
            .hand_of(player.id)
            .map(|hand| hand.describe())
            .unwrap_or_default())
    }

    pub async fn perform(&self, player: &Player, action: Action) -> Result<(), GameError> {
        match action {
            Action::PlayCard(card_id) => self.play_card(player, card_id).await,
            Action::EndTurn => self.end_turn(player).await,
            Action::DrawBooster => self.draw_booster(player).await,
        }
    }

    /// Resolves a card play and reports the result to both players. When the
    /// play ends the match, it leaves the index before the lock is released.
    pub async fn play_card(&self, player: &Player, card_id: CardId) -> Result<(), GameError> {
        let (id, handle) = self.match_for(player).await?;

        let finished = {
            let mut game = handle.lock().await;
            let outcome = game.play_card(player.id, card_id)?;
            game.announce(&game.describe_play(player, &outcome));

            if outcome.winner.is_some() {
                game.announce(&banner(&format!("{} won the match!", player.name)));
                self.matches.remove(id).await;
                Some((game.players().clone(), game.created_at().elapsed()))
            } else {
                None
            }
        };

        if let Some((players, duration)) = finished {
            for participant in players.iter() {
                participant.leave_match(id).await;
            }
            info!("{} finished after {:?}, winner {}", id, duration, player.name);
        }

        Ok(())
    }

    /// Passes the turn; only the turn holder may do this
    pub async fn end_turn(&self, player: &Player) -> Result<(), GameError> {
        let (_, handle) = self.match_for(player).await?;
        let mut game = handle.lock().await;
        let next = game.end_turn(player.id)?.name.clone();
        game.announce(&banner(&format!("Turn passed! Now playing: {}", next)));
        Ok(())
    }

    /// Takes one booster pack. Inside a match the cards join the player's
    /// hand; outside a match the pack is just opened and shown.
    pub async fn draw_booster(&self, player: &Player) -> Result<(), GameError> {
        match self.match_for(player).await {
            Ok((_, handle)) => {
                let mut game = handle.lock().await;
                game.ensure_active(player.id)?;
                let pack = self
                    .inventory
                    .take_one()
                    .await
                    .ok_or(GameError::NoBoostersAvailable)?;
                let line = format!("{} opened booster {}", player.name, pack.describe());
                game.receive_cards(player.id, pack.cards)?;
                game.announce(&line);
                Ok(())
            }
            Err(GameError::NotInMatch) => {
                let pack = self
                    .inventory
                    .take_one()
                    .await
                    .ok_or(GameError::NoBoostersAvailable)?;
                player
                    .outbound
                    .deliver(format!("You opened booster {}", pack.describe()));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Relays chat to the match opponent, or to the lobby when not in a match
    pub async fn chat(&self, player: &Player, text: &str) {
        let line = format!("[{}] {}", player.name, text);
        match self.match_for(player).await {
            Ok((_, handle)) => {
                let game = handle.lock().await;
                if let Some(opponent) = game.opponent_of(player.id) {
                    opponent.outbound.notify(line);
                }
            }
            Err(_) => {
                self.registry.broadcast(&line, Some(player.id)).await;
            }
        }
    }
}

//! Pairing loop: turns queued players into matches

use crate::lobby::{Lobby, MatchHandle};
use crate::player::PlayerState;
use crate::queue::QueueEntry;
use crate::session::{Match, MatchId};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Result of one pairing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Matched(MatchId),
    /// The first entry could not be claimed; nothing was changed
    FirstUnavailable,
    /// The second entry could not be claimed; the first one keeps waiting
    /// unless it left the queue in the meantime
    SecondUnavailable,
}

/// Flags a queued player as in-match if its entry is still the live one.
/// Check and flag happen under the player's own lock. The ticket stays in
/// place until [`commit`], so `/sair` can still cancel.
async fn claim(entry: &QueueEntry, id: MatchId) -> bool {
    let mut state = entry.player.state.lock().await;
    if !state.connected || state.in_match() || state.queue_ticket != Some(entry.ticket) {
        return false;
    }
    state.current_match = Some(id);
    true
}

/// Undoes [`claim`]. The ticket is left alone, so a player who left in
/// between stays out of the queue.
async fn release(entry: &QueueEntry, id: MatchId) {
    let mut state = entry.player.state.lock().await;
    if state.current_match == Some(id) {
        state.current_match = None;
    }
}

/// Consumes both tickets once both players are claimed. The two player
/// locks are taken in id order and held together, so a `/sair` lands either
/// before the commit (and cancels the pairing) or after it (and finds the
/// player already matched). Claimed players are always distinct.
async fn commit(first: &QueueEntry, second: &QueueEntry) -> Result<(), PairOutcome> {
    let (mut first_state, mut second_state) = if first.player.id < second.player.id {
        let a = first.player.state.lock().await;
        let b = second.player.state.lock().await;
        (a, b)
    } else {
        let b = second.player.state.lock().await;
        let a = first.player.state.lock().await;
        (a, b)
    };

    let live = |state: &PlayerState, entry: &QueueEntry| {
        state.connected && state.queue_ticket == Some(entry.ticket)
    };
    if !live(&first_state, first) {
        return Err(PairOutcome::FirstUnavailable);
    }
    if !live(&second_state, second) {
        return Err(PairOutcome::SecondUnavailable);
    }

    first_state.queue_ticket = None;
    second_state.queue_ticket = None;
    Ok(())
}

impl Lobby {
    /// Runs forever, draining the queue two players at a time
    pub async fn run_pairing_loop(self: Arc<Self>) {
        info!(
            "Pairing loop started (opponent wait {:?})",
            self.config.pairing_timeout
        );

        while let Some(entry) = self.queue.recv().await {
            if !entry.is_current().await {
                debug!("Discarding stale queue entry for player {}", entry.player.id);
                continue;
            }
            self.find_opponent(entry).await;
        }
    }

    /// Waits for a partner for `first` until the pairing timeout, then puts
    /// `first` back at the end of the queue
    async fn find_opponent(&self, mut first: QueueEntry) {
        let deadline = Instant::now() + self.config.pairing_timeout;

        loop {
            let Some(second) = self.queue.recv_until(deadline).await else {
                debug!(
                    "No opponent for player {} yet, requeueing",
                    first.player.id
                );
                self.queue.requeue(first).await;
                return;
            };

            match self.try_pair(&first, &second).await {
                PairOutcome::Matched(_) => return,
                PairOutcome::FirstUnavailable => {
                    if !second.is_current().await {
                        return;
                    }
                    first = second;
                }
                PairOutcome::SecondUnavailable => {
                    debug!("Dropped stale entry for player {}", second.player.id);
                }
            }
        }
    }

    /// Claims both players one at a time and, if both are still queued when
    /// their tickets are committed, starts a match between them
    pub async fn try_pair(&self, first: &QueueEntry, second: &QueueEntry) -> PairOutcome {
        let id = self.matches.next_id();

        if !claim(first, id).await {
            return PairOutcome::FirstUnavailable;
        }
        if !claim(second, id).await {
            release(first, id).await;
            return PairOutcome::SecondUnavailable;
        }
        if let Err(outcome) = commit(first, second).await {
            debug!("Pairing {} cancelled: {:?}", id, outcome);
            release(first, id).await;
            release(second, id).await;
            return outcome;
        }

        let hands = {
            let mut rng = rand::thread_rng();
            [
                self.catalog.deal(&mut rng, self.config.hand_size),
                self.catalog.deal(&mut rng, self.config.hand_size),
            ]
        };
        let game = Match::new(
            id,
            Arc::clone(&first.player),
            Arc::clone(&second.player),
            hands,
            self.config.starting_life,
        );
        let handle = self.matches.insert(game).await;
        info!(
            "{} started: {} vs {}",
            id, first.player.name, second.player.name
        );

        self.announce_start(&handle).await;

        // a disconnect between the claim and the insert found no match to clean up
        for entry in [first, second] {
            let connected = entry.player.state.lock().await.connected;
            if !connected {
                self.abandon_match(id, entry.player.id).await;
                return PairOutcome::Matched(id);
            }
        }

        if let Some(period) = self.config.heartbeat_interval {
            self.spawn_heartbeat(id, handle, period);
        }

        PairOutcome::Matched(id)
    }

    async fn announce_start(&self, handle: &MatchHandle) {
        let game = handle.lock().await;
        let first_name = game.turn_holder().name.clone();

        for player in game.players() {
            let opponent = game
                .opponent_of(player.id)
                .map(|p| p.name.as_str())
                .unwrap_or_default();
            let hand = game
                .hand_of(player.id)
                .map(|hand| hand.describe())
                .unwrap_or_default();
            player.outbound.deliver(format!(
                "Matched with {}! Match ID: {}\nStarting life: {}\n{}",
                opponent, game.id(), self.config.starting_life, hand
            ));

            let turn = if player.id == game.turn_holder().id {
                "Your turn! Use /jogar <card_id> to play a card".to_string()
            } else {
                format!("Waiting for {} to play", first_name)
            };
            player.outbound.deliver(turn);
        }
    }

    fn spawn_heartbeat(&self, id: MatchId, handle: MatchHandle, period: Duration) {
        let matches = Arc::clone(&self.matches);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // Skip the first tick since it fires immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !matches.contains(id).await {
                    break;
                }
                let game = handle.lock().await;
                if game.is_finished() {
                    break;
                }
                for player in game.players() {
                    player.outbound.notify(format!("Match {} heartbeat", id));
                }
            }

            debug!("Heartbeat for {} stopped", id);
        });
    }
}

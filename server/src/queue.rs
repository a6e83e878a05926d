//! Bounded FIFO of players waiting for an opponent
//!
//! Every entry carries a ticket that must match the ticket stored in the
//! player's own state. Leaving the queue or being paired clears the ticket,
//! which turns any entry still sitting in the channel into a stale one that
//! the pairing loop discards. A player therefore has at most one live entry,
//! and never while flagged in-match.

use crate::error::GameError;
use crate::player::Player;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

#[derive(Clone)]
pub struct QueueEntry {
    pub player: Arc<Player>,
    pub ticket: u64,
}

impl QueueEntry {
    /// Whether this entry still represents a waiting, eligible player
    pub async fn is_current(&self) -> bool {
        let state = self.player.state.lock().await;
        state.connected && !state.in_match() && state.queue_ticket == Some(self.ticket)
    }
}

pub struct MatchQueue {
    sender: mpsc::Sender<QueueEntry>,
    receiver: Mutex<mpsc::Receiver<QueueEntry>>,
    next_ticket: AtomicU64,
    capacity: usize,
}

impl MatchQueue {
    /// Creates a queue holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            next_ticket: AtomicU64::new(1),
            capacity,
        }
    }

    /// Maximum number of entries, stale ones included
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries currently buffered, stale ones included
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Returns true when no entry is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    /// Adds a player to the back of the queue and returns its position
    pub async fn enqueue(&self, player: &Arc<Player>) -> Result<usize, GameError> {
        let mut state = player.state.lock().await;
        if state.in_match() {
            return Err(GameError::AlreadyInMatch);
        }
        if state.is_queued() {
            return Err(GameError::AlreadyQueued);
        }

        let ticket = self.issue_ticket();
        self.sender
            .try_send(QueueEntry {
                player: Arc::clone(player),
                ticket,
            })
            .map_err(|_| GameError::QueueFull)?;
        state.queue_ticket = Some(ticket);

        debug!("Player {} queued with ticket {}", player.id, ticket);
        Ok(self.len())
    }

    /// Withdraws a player. Its buffered entry becomes stale, and a pairing
    /// that has claimed it but not committed yet is cancelled.
    pub async fn leave(&self, player: &Player) -> Result<(), GameError> {
        let mut state = player.state.lock().await;
        match state.queue_ticket.take() {
            Some(_) => Ok(()),
            None => Err(GameError::NotQueued),
        }
    }

    /// Puts a dequeued entry back, keeping its ticket. Stale entries are
    /// dropped; if the queue is full the player is told to rejoin.
    pub async fn requeue(&self, entry: QueueEntry) -> bool {
        let player = Arc::clone(&entry.player);
        let mut state = player.state.lock().await;
        if !(state.connected && !state.in_match() && state.queue_ticket == Some(entry.ticket)) {
            return false;
        }

        match self.sender.try_send(entry) {
            Ok(()) => true,
            Err(_) => {
                warn!("Queue full, dropping player {} from matchmaking", player.id);
                state.queue_ticket = None;
                player.outbound.notify(GameError::QueueFull.to_string());
                false
            }
        }
    }

    /// Waits for the next entry
    pub async fn recv(&self) -> Option<QueueEntry> {
        self.receiver.lock().await.recv().await
    }

    /// Waits for the next entry until `deadline`; `None` on timeout
    pub async fn recv_until(&self, deadline: Instant) -> Option<QueueEntry> {
        let mut receiver = self.receiver.lock().await;
        tokio::time::timeout_at(deadline, receiver.recv())
            .await
            .ok()
            .flatten()
    }
}

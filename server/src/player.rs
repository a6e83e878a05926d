//! Connected players and their outbound message path
//!
//! Each player owns an [`Outbound`] with two lanes feeding a single writer
//! task:
//! - the advisory lane is bounded and lossy, for chat, broadcasts and replies
//!   to informational commands
//! - the results lane never blocks and never drops while open, for lines that
//!   report a change to match state
//!
//! Producers never wait on a slow socket, so both lanes are safe to use while
//! holding a match or registry lock.

use crate::session::MatchId;
use log::{debug, warn};
use std::fmt;
use std::sync::Mutex as StdMutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable per-player flags, guarded by the player's own lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    /// Cleared once the connection is gone; a disconnected player is never paired
    pub connected: bool,
    /// Match the player is currently in
    pub current_match: Option<MatchId>,
    /// Ticket of the player's live queue entry, if queued
    pub queue_ticket: Option<u64>,
}

impl PlayerState {
    pub fn in_match(&self) -> bool {
        self.current_match.is_some()
    }

    pub fn is_queued(&self) -> bool {
        self.queue_ticket.is_some()
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            connected: true,
            current_match: None,
            queue_ticket: None,
        }
    }
}

pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub outbound: Outbound,
    pub state: Mutex<PlayerState>,
}

impl Player {
    /// Creates a connected player that is neither queued nor in a match
    pub fn new(id: PlayerId, name: impl Into<String>, outbound: Outbound) -> Self {
        Self {
            id,
            name: name.into(),
            outbound,
            state: Mutex::new(PlayerState::default()),
        }
    }

    /// Copy of the current state, for checks that do not need the lock held
    pub async fn snapshot(&self) -> PlayerState {
        self.state.lock().await.clone()
    }

    pub async fn current_match(&self) -> Option<MatchId> {
        self.state.lock().await.current_match
    }

    pub async fn in_match(&self) -> bool {
        self.state.lock().await.in_match()
    }

    /// Clears the in-match flag, but only if it still points at `id`
    pub async fn leave_match(&self, id: MatchId) -> bool {
        let mut state = self.state.lock().await;
        if state.current_match == Some(id) {
            state.current_match = None;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

struct Lanes {
    advisory: mpsc::Sender<String>,
    results: mpsc::UnboundedSender<String>,
}

/// Sending half of a player's outbound path
pub struct Outbound {
    lanes: StdMutex<Option<Lanes>>,
}

/// Receiving half, drained by the player's writer task
pub struct OutboundReceiver {
    advisory: mpsc::Receiver<String>,
    results: mpsc::UnboundedReceiver<String>,
}

impl Outbound {
    /// Creates both lanes. Only the advisory lane is bounded.
    pub fn channel(advisory_capacity: usize) -> (Outbound, OutboundReceiver) {
        let (advisory_tx, advisory_rx) = mpsc::channel(advisory_capacity.max(1));
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let outbound = Outbound {
            lanes: StdMutex::new(Some(Lanes {
                advisory: advisory_tx,
                results: results_tx,
            })),
        };
        let receiver = OutboundReceiver {
            advisory: advisory_rx,
            results: results_rx,
        };
        (outbound, receiver)
    }

    /// Best-effort send; returns false if the line was dropped
    pub fn notify(&self, line: impl Into<String>) -> bool {
        match self.lanes.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(lanes) => lanes.advisory.try_send(line.into()).is_ok(),
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Reliable send for state-changing results; fails only once closed
    pub fn deliver(&self, line: impl Into<String>) -> bool {
        match self.lanes.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(lanes) => lanes.results.send(line.into()).is_ok(),
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Releases both lanes; the writer drains what is queued and stops.
    /// Returns true only for the call that actually closed the channel.
    pub fn close(&self) -> bool {
        match self.lanes.lock() {
            Ok(mut guard) => guard.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self.lanes.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => true,
        }
    }
}

impl OutboundReceiver {
    /// Next line to write, results first; `None` once both lanes are closed and empty
    pub async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            Some(line) = self.results.recv() => Some(line),
            Some(line) = self.advisory.recv() => Some(line),
            else => None,
        }
    }

    /// Non-blocking variant used by tests and shutdown paths
    pub fn try_recv(&mut self) -> Option<String> {
        self.results
            .try_recv()
            .ok()
            .or_else(|| self.advisory.try_recv().ok())
    }

    /// Everything currently queued, results first
    pub fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.try_recv() {
            lines.push(line);
        }
        lines
    }
}

/// Writes every outbound line to the socket until the outbound is closed or a
/// write fails
pub async fn run_writer<W>(player: PlayerId, mut receiver: OutboundReceiver, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = receiver.recv().await {
        if !line.ends_with('\n') {
            line.push('\n');
        }
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!("Failed to write to player {}: {}", player, e);
            return;
        }
        if let Err(e) = writer.flush().await {
            warn!("Failed to flush to player {}: {}", player, e);
            return;
        }
    }
    debug!("Writer for player {} finished", player);
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[test]
    fn test_player_state_defaults() {
        let state = PlayerState::default();
        assert!(state.connected);
        assert!(!state.in_match());
        assert!(!state.is_queued());
    }

    #[test]
    fn test_advisory_lane_drops_when_full() {
        let (outbound, mut receiver) = Outbound::channel(2);

        assert!(outbound.notify("one"));
        assert!(outbound.notify("two"));
        assert!(!outbound.notify("three"));

        assert_eq!(receiver.drain(), vec!["one", "two"]);
    }

    #[test]
    fn test_results_lane_never_drops() {
        let (outbound, mut receiver) = Outbound::channel(1);

        for i in 0..100 {
            assert!(outbound.deliver(format!("result {}", i)));
        }
        assert_eq!(receiver.drain().len(), 100);
    }

    #[test]
    fn test_results_are_drained_first() {
        let (outbound, mut receiver) = Outbound::channel(4);

        outbound.notify("chat");
        outbound.deliver("damage");

        assert_eq!(receiver.drain(), vec!["damage", "chat"]);
    }

    #[test]
    fn test_close_happens_once() {
        let (outbound, _receiver) = Outbound::channel(4);

        assert!(!outbound.is_closed());
        assert!(outbound.close());
        assert!(!outbound.close());
        assert!(outbound.is_closed());
        assert!(!outbound.notify("late"));
        assert!(!outbound.deliver("late"));
    }

    #[tokio::test]
    async fn test_receiver_ends_after_close() {
        let (outbound, mut receiver) = Outbound::channel(4);
        outbound.deliver("last words");
        outbound.close();

        assert_eq!(receiver.recv().await.as_deref(), Some("last words"));
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_leave_match_only_clears_matching_id() {
        let (outbound, _receiver) = Outbound::channel(4);
        let player = Player::new(PlayerId(1), "Alice", outbound);
        player.state.lock().await.current_match = Some(MatchId(7));

        assert!(!player.leave_match(MatchId(8)).await);
        assert!(player.in_match().await);
        assert!(player.leave_match(MatchId(7)).await);
        assert!(!player.in_match().await);
    }

    #[tokio::test]
    async fn test_writer_terminates_lines() {
        let (outbound, receiver) = Outbound::channel(4);
        let (server_side, client_side) = tokio::io::duplex(1024);

        let writer = tokio::spawn(run_writer(PlayerId(1), receiver, server_side));

        outbound.notify("hello");
        outbound.deliver("multi\nline");
        outbound.close();
        writer.await.unwrap();

        let mut lines = BufReader::new(client_side).lines();
        let mut received = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            received.push(line);
        }
        assert_eq!(received, vec!["multi", "line", "hello"]);
    }
}

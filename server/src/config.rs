//! Runtime settings for the game server

use shared::{DEFAULT_GAME_PORT, DEFAULT_PROBE_PORT, STARTING_HAND_SIZE, STARTING_LIFE};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host both listeners bind to
    pub host: String,
    /// Game protocol (TCP) port
    pub port: u16,
    /// Latency probe (UDP) port
    pub probe_port: u16,
    /// Maximum number of concurrently registered players
    pub max_players: usize,
    /// Capacity of the matchmaking queue
    pub queue_capacity: usize,
    /// Booster packs generated at startup
    pub boosters: usize,
    /// How long a lone queued player waits for an opponent before being re-queued
    pub pairing_timeout: Duration,
    /// Capacity of each player's advisory outbound lane
    pub outbound_capacity: usize,
    /// Period of the in-match heartbeat line, `None` to disable
    pub heartbeat_interval: Option<Duration>,
    pub starting_life: u32,
    pub hand_size: usize,
}

impl ServerConfig {
    /// Address of the TCP game listener
    pub fn game_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address of the UDP latency responder
    pub fn probe_addr(&self) -> String {
        format!("{}:{}", self.host, self.probe_port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_GAME_PORT,
            probe_port: DEFAULT_PROBE_PORT,
            max_players: 1024,
            queue_capacity: 100,
            boosters: 50,
            pairing_timeout: Duration::from_secs(30),
            outbound_capacity: 10,
            heartbeat_interval: Some(Duration::from_secs(30)),
            starting_life: STARTING_LIFE,
            hand_size: STARTING_HAND_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.game_addr(), "0.0.0.0:4000");
        assert_eq!(config.probe_addr(), "0.0.0.0:4001");
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.pairing_timeout, Duration::from_secs(30));
        assert_eq!(config.starting_life, 100);
        assert_eq!(config.hand_size, 5);
    }
}

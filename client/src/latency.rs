//! Round-trip measurement against the server's UDP probe

use log::{debug, warn};
use shared::{is_pong, PING};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

/// How long to wait for a `pong` before giving up
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Sends one `ping` to `probe_addr` and times the answer.
///
/// Returns `None` if the probe cannot be reached, does not answer within
/// `timeout`, or answers with anything other than `pong`.
pub async fn measure_latency(probe_addr: &str, timeout: Duration) -> Option<Duration> {
    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Failed to bind probe socket: {}", e);
            return None;
        }
    };
    if let Err(e) = socket.connect(probe_addr).await {
        warn!("Failed to reach probe at {}: {}", probe_addr, e);
        return None;
    }

    let started = Instant::now();
    if let Err(e) = socket.send(PING.as_bytes()).await {
        warn!("Failed to send ping: {}", e);
        return None;
    }

    let mut buffer = [0u8; 64];
    match tokio::time::timeout(timeout, socket.recv(&mut buffer)).await {
        Ok(Ok(len)) if is_pong(&buffer[..len]) => Some(started.elapsed()),
        Ok(Ok(len)) => {
            debug!("Unexpected {} byte probe reply", len);
            None
        }
        Ok(Err(e)) => {
            debug!("Probe receive failed: {}", e);
            None
        }
        Err(_) => None,
    }
}

pub fn as_millis_f64(rtt: Duration) -> f64 {
    rtt.as_secs_f64() * 1000.0
}

pub fn describe_latency(rtt: Option<Duration>) -> String {
    match rtt {
        Some(rtt) => format!("Latency: {:.1} ms", as_millis_f64(rtt)),
        None => "Latency unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    async fn responder(reply: &'static [u8]) -> String {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buffer = [0u8; 64];
            while let Ok((_, from)) = socket.recv_from(&mut buffer).await {
                let _ = socket.send_to(reply, from).await;
            }
        });
        addr.to_string()
    }

    #[test]
    fn test_millis_conversion() {
        assert_approx_eq!(as_millis_f64(Duration::from_micros(1500)), 1.5);
        assert_approx_eq!(as_millis_f64(Duration::from_secs(2)), 2000.0);
        assert_approx_eq!(as_millis_f64(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_describe_latency() {
        assert_eq!(
            describe_latency(Some(Duration::from_micros(12_340))),
            "Latency: 12.3 ms"
        );
        assert_eq!(describe_latency(None), "Latency unavailable");
    }

    #[tokio::test]
    async fn test_measures_round_trip() {
        let addr = responder(b"pong").await;
        let rtt = measure_latency(&addr, PROBE_TIMEOUT).await;
        assert!(rtt.is_some());
        assert!(rtt.unwrap() < PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn test_wrong_reply_is_unavailable() {
        let addr = responder(b"nope").await;
        assert!(measure_latency(&addr, PROBE_TIMEOUT).await.is_none());
    }

    #[tokio::test]
    async fn test_silent_probe_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap().to_string();

        let rtt = measure_latency(&addr, Duration::from_millis(50)).await;
        assert!(rtt.is_none());
    }
}

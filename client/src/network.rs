//! Terminal session with the game server
//!
//! Lines typed by the user go to the server unchanged, except for the local
//! commands `/exit` and `/latencia`. Every line from the server is printed
//! with a `Server:` prefix.

use crate::latency::{describe_latency, measure_latency, PROBE_TIMEOUT};
use log::{info, warn};
use shared::normalize_name;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// What to do with one line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    Exit,
    Latency,
    Forward(String),
}

/// Returns `None` for blank input
pub fn classify_input(line: &str) -> Option<LocalCommand> {
    let line = line.trim();
    match line {
        "" => None,
        "/exit" => Some(LocalCommand::Exit),
        "/latencia" => Some(LocalCommand::Latency),
        other => Some(LocalCommand::Forward(other.to_string())),
    }
}

pub struct Client {
    stream: TcpStream,
    probe_addr: String,
}

impl Client {
    /// Connects to the game server; the UDP address is only used by `/latencia`
    pub async fn connect(server_addr: &str, probe_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to server at {}", server_addr);
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;

        Ok(Client {
            stream,
            probe_addr: probe_addr.to_string(),
        })
    }

    /// Runs until the user types `/exit`, input ends, or the server hangs up
    pub async fn run<I, O>(
        self,
        name: Option<String>,
        input: I,
        mut output: O,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (reader, mut writer) = self.stream.into_split();
        let mut server_lines = BufReader::new(reader).lines();
        let mut input_lines = input.lines();

        let name = match name {
            Some(name) => name,
            None => {
                output.write_all(b"Enter your name: ").await?;
                output.flush().await?;
                input_lines.next_line().await?.unwrap_or_default()
            }
        };
        writer
            .write_all(format!("{}\n", normalize_name(&name)).as_bytes())
            .await?;

        loop {
            tokio::select! {
                line = server_lines.next_line() => match line {
                    Ok(Some(line)) => {
                        output.write_all(format!("Server: {}\n", line).as_bytes()).await?;
                        output.flush().await?;
                    }
                    Ok(None) => {
                        output.write_all(b"Connection closed by server\n").await?;
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read from server: {}", e);
                        break;
                    }
                },
                line = input_lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match classify_input(&line) {
                        None => {}
                        Some(LocalCommand::Exit) => break,
                        Some(LocalCommand::Latency) => {
                            let rtt = measure_latency(&self.probe_addr, PROBE_TIMEOUT).await;
                            output
                                .write_all(format!("{}\n", describe_latency(rtt)).as_bytes())
                                .await?;
                            output.flush().await?;
                        }
                        Some(LocalCommand::Forward(text)) => {
                            writer.write_all(format!("{}\n", text).as_bytes()).await?;
                        }
                    }
                }
            }
        }

        output.flush().await?;
        let _ = writer.shutdown().await;
        info!("Disconnected");
        Ok(())
    }
}

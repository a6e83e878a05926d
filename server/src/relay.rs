//! Per-connection message relay
//!
//! Every accepted connection gets a reader task and a writer task. The reader
//! classifies each line and drives the lobby; the writer drains the player's
//! outbound lanes to the socket. When the reader ends, for any reason
//! including a panic, the player is removed from the lobby.

use crate::error::GameError;
use crate::lobby::Lobby;
use crate::player::{run_writer, Outbound, Player};
use crate::utils::get_timestamp;
use log::{debug, error, info, warn};
use shared::{normalize_name, parse_line, ClientLine, Command, HELP_TEXT};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

/// Serves one client from the name handshake until disconnect
pub async fn serve_connection<S>(stream: S, lobby: Arc<Lobby>, probe_addr: Option<SocketAddr>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    let name = match lines.next_line().await {
        Ok(Some(line)) => normalize_name(&line),
        Ok(None) => return,
        Err(e) => {
            warn!("Failed to read player name: {}", e);
            return;
        }
    };

    let (outbound, receiver) = Outbound::channel(lobby.config().outbound_capacity);
    let player = match lobby.register(name, outbound).await {
        Ok(player) => player,
        Err(e) => {
            warn!("Rejected connection: {}", e);
            let _ = writer.write_all(format!("{}\n", e).as_bytes()).await;
            let _ = writer.shutdown().await;
            return;
        }
    };

    tokio::spawn(run_writer(player.id, receiver, writer));

    player
        .outbound
        .notify(format!("Welcome, {}! You are player {}", player.name, player.id));
    if let Some(addr) = probe_addr {
        player.outbound.notify(format!("UDP ping: {}", addr));
    }
    player.outbound.notify(HELP_TEXT);

    let reader_task = tokio::spawn(read_loop(
        Arc::clone(&lobby),
        Arc::clone(&player),
        lines,
    ));
    if let Err(e) = reader_task.await {
        if e.is_panic() {
            error!("Reader for player {} panicked", player.id);
        }
    }

    lobby.remove_player(player.id).await;
    info!("Player {} ({}) disconnected", player.id, player.name);
}

async fn read_loop<R>(lobby: Arc<Lobby>, player: Arc<Player>, mut lines: Lines<R>)
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => dispatch(&lobby, &player, &line).await,
            Ok(None) => {
                debug!("Player {} closed the connection", player.id);
                break;
            }
            Err(e) => {
                warn!("Read error from player {}: {}", player.id, e);
                break;
            }
        }
    }
}

/// Handles a single line from a registered player
pub async fn dispatch(lobby: &Lobby, player: &Arc<Player>, line: &str) {
    match parse_line(line) {
        None => {}
        Some(Err(e)) => {
            player.outbound.notify(e.to_string());
        }
        Some(Ok(ClientLine::Chat(text))) => lobby.chat(player, &text).await,
        Some(Ok(ClientLine::Command(command))) => match handle_command(lobby, player, command).await {
            Ok(Some(reply)) => {
                player.outbound.notify(reply);
            }
            Ok(None) => {}
            Err(e) => {
                player.outbound.notify(e.to_string());
            }
        },
    }
}

/// Runs a command; the returned text, if any, is the reply to the sender
async fn handle_command(
    lobby: &Lobby,
    player: &Arc<Player>,
    command: Command,
) -> Result<Option<String>, GameError> {
    match command {
        Command::JoinQueue => {
            let position = lobby.join_queue(player).await?;
            Ok(Some(format!(
                "Joined the matchmaking queue (position {})",
                position
            )))
        }
        Command::LeaveQueue => {
            lobby.leave_queue(player).await?;
            Ok(Some("Left the matchmaking queue".to_string()))
        }
        Command::ShowHand => lobby.show_hand(player).await.map(Some),
        Command::ListCatalog => Ok(Some(lobby.catalog().listing())),
        Command::ServerTime => Ok(Some(format!("Server time: {} ms", get_timestamp()))),
        Command::Act(action) => lobby.perform(player, action).await.map(|_| None),
    }
}

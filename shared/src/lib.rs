//! Wire vocabulary shared by the card duel server and its terminal client.
//!
//! The game protocol is line oriented UTF-8 text. After the first line (the
//! display name) every client line is classified by [`parse_line`] into a
//! control command, a structured JSON action, or free-form chat. The latency
//! probe is a separate datagram exchange of the literal [`PING`] and [`PONG`]
//! tokens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_GAME_PORT: u16 = 4000;
pub const DEFAULT_PROBE_PORT: u16 = 4001;

pub const PING: &str = "ping";
pub const PONG: &str = "pong";

pub const STARTING_LIFE: u32 = 100;
pub const STARTING_HAND_SIZE: usize = 5;

pub const DEFAULT_PLAYER_NAME: &str = "Player";

pub const HELP_TEXT: &str =
    "Commands: /entrar, /sair, /jogar <card_id>, /fim, /mao, /cartas, /booster, /ping, or chat messages";

pub type CardId = u32;

/// Reasons a client line could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Usage: /jogar <card_id>")]
    MissingCardId,
    #[error("Invalid card id: {0}")]
    InvalidCardId(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// A game action, whichever syntax the client used to send it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlayCard(CardId),
    EndTurn,
    DrawBooster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    JoinQueue,
    LeaveQueue,
    ShowHand,
    ListCatalog,
    ServerTime,
    Act(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    Command(Command),
    Chat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[serde(alias = "jogar_carta")]
    PlayCard,
    #[serde(alias = "fim_turno")]
    EndTurn,
    #[serde(alias = "abrir_booster")]
    DrawBooster,
}

/// Structured action record sent as a single JSON object line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(alias = "acao")]
    pub action: ActionKind,
    #[serde(default, alias = "carta_id", skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
}

impl ActionRequest {
    pub fn into_action(self) -> Result<Action, ProtocolError> {
        match self.action {
            ActionKind::PlayCard => self
                .card_id
                .map(Action::PlayCard)
                .ok_or_else(|| ProtocolError::InvalidAction("play_card requires card_id".into())),
            ActionKind::EndTurn => Ok(Action::EndTurn),
            ActionKind::DrawBooster => Ok(Action::DrawBooster),
        }
    }
}

/// Classifies one client line
///
/// Returns `None` for lines that carry nothing to act on (blank lines and a
/// lone `/`). Slash commands take priority, then JSON actions, and anything
/// else is chat.
pub fn parse_line(line: &str) -> Option<Result<ClientLine, ProtocolError>> {
    let line = line.trim();
    if line.is_empty() || line == "/" {
        return None;
    }

    if line.starts_with('/') {
        return Some(parse_command(line).map(ClientLine::Command));
    }

    if line.starts_with('{') {
        let parsed = serde_json::from_str::<ActionRequest>(line)
            .map_err(|e| ProtocolError::InvalidAction(e.to_string()))
            .and_then(ActionRequest::into_action)
            .map(|action| ClientLine::Command(Command::Act(action)));
        return Some(parsed);
    }

    Some(Ok(ClientLine::Chat(line.to_string())))
}

fn parse_command(line: &str) -> Result<Command, ProtocolError> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();

    match head {
        "/entrar" => Ok(Command::JoinQueue),
        "/sair" => Ok(Command::LeaveQueue),
        "/mao" => Ok(Command::ShowHand),
        "/cartas" => Ok(Command::ListCatalog),
        "/booster" => Ok(Command::Act(Action::DrawBooster)),
        "/fim" => Ok(Command::Act(Action::EndTurn)),
        "/ping" => Ok(Command::ServerTime),
        "/jogar" => {
            let raw = parts.next().ok_or(ProtocolError::MissingCardId)?;
            raw.parse::<CardId>()
                .map(|id| Command::Act(Action::PlayCard(id)))
                .map_err(|_| ProtocolError::InvalidCardId(raw.to_string()))
        }
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

/// Trims the first line of a connection into a display name
pub fn normalize_name(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// True only for the exact `ping` bytes, with no padding or newline
pub fn is_ping(payload: &[u8]) -> bool {
    payload == PING.as_bytes()
}

/// True only for the exact `pong` bytes
pub fn is_pong(payload: &[u8]) -> bool {
    payload == PONG.as_bytes()
}

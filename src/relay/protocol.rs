//! Relay wire format
//!
//! Messages are JSON objects tagged by a `type` field with camelCase names,
//! e.g. `{"type":"joinRoom","roomId":"k3j9x0aa"}`. Board snapshots travel as
//! a 15x15 grid of cell codes (0 empty, 1 black, 2 white) plus the move
//! history as `{r, c, color}` records with numeric colors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gomoku::board::{Board, Move, Pos, Stone};

/// Stone color as spelled on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireColor {
    Black,
    White,
}

impl WireColor {
    pub fn opponent(self) -> WireColor {
        match self {
            WireColor::Black => WireColor::White,
            WireColor::White => WireColor::Black,
        }
    }

    /// `None` for [`Stone::Empty`]
    pub fn from_stone(stone: Stone) -> Option<WireColor> {
        match stone {
            Stone::Black => Some(WireColor::Black),
            Stone::White => Some(WireColor::White),
            Stone::Empty => None,
        }
    }
}

impl From<WireColor> for Stone {
    fn from(color: WireColor) -> Stone {
        match color {
            WireColor::Black => Stone::Black,
            WireColor::White => Stone::White,
        }
    }
}

/// Winner field of `gameOver`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Black,
    White,
    Draw,
}

impl From<WireColor> for Winner {
    fn from(color: WireColor) -> Winner {
        match color {
            WireColor::Black => Winner::Black,
            WireColor::White => Winner::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOverReason {
    Win,
    Draw,
    Resign,
}

/// One history entry in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub r: u8,
    pub c: u8,
    /// 1 black, 2 white
    pub color: u8,
}

impl From<Move> for MoveRecord {
    fn from(m: Move) -> Self {
        Self {
            r: m.pos.row,
            c: m.pos.col,
            color: m.color.code(),
        }
    }
}

impl MoveRecord {
    /// `None` when the record is off the board or carries no color
    pub fn to_move(self) -> Option<Move> {
        let pos = Pos::try_new(i32::from(self.r), i32::from(self.c))?;
        match Stone::from_code(self.color) {
            Stone::Empty => None,
            color => Some(Move::new(pos, color)),
        }
    }
}

/// Board grid, history and side to move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub board: Vec<Vec<u8>>,
    pub move_history: Vec<MoveRecord>,
    pub current_turn: WireColor,
}

impl Snapshot {
    pub fn capture(board: &Board, history: &[Move], current_turn: WireColor) -> Self {
        Self {
            board: board.to_grid(),
            move_history: history.iter().copied().map(MoveRecord::from).collect(),
            current_turn,
        }
    }
}

/// Client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateRoom,
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },
    /// Coordinates stay signed so out-of-range input parses and is then dropped
    Move { row: i64, col: i64, color: WireColor },
    #[serde(rename_all = "camelCase")]
    UndoRequest { room_id: String },
    #[serde(rename_all = "camelCase")]
    UndoAccept { room_id: String },
    #[serde(rename_all = "camelCase")]
    UndoReject { room_id: String },
    #[serde(rename_all = "camelCase")]
    Resign { room_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String },
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String },
    #[serde(rename_all = "camelCase")]
    RoomJoined { room_id: String },
    GameStart(Snapshot),
    Move { row: u8, col: u8, color: WireColor },
    GameOver { winner: Winner, reason: GameOverReason },
    UndoRequest,
    UndoAccept(Snapshot),
    UndoReject,
    OpponentLeft,
    Error { message: String },
}

/// Wire encoding or decoding failure
#[derive(Debug)]
pub enum ProtocolError {
    /// Input was not a well-formed message
    Malformed(serde_json::Error),
    /// Outgoing message could not be serialized
    Encode(serde_json::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed(e) => write!(f, "malformed message: {}", e),
            ProtocolError::Encode(e) => write!(f, "failed to encode message: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Malformed(e) | ProtocolError::Encode(e) => Some(e),
        }
    }
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

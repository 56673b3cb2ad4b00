//! A single relay room: two seats and the authoritative board
//!
//! The room is the only place turn legality is decided for an online game.
//! Clients keep their own copies and follow the moves the room broadcasts.

use std::time::Instant;

use crate::gomoku::board::{Board, Move, Pos, Stone};
use crate::gomoku::rules::{check_win, is_draw};

use super::protocol::{Snapshot, WireColor, Winner};

/// Connection identity assigned by the transport
pub type ClientId = u64;

/// What an accepted move did to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Continue,
    Won(WireColor),
    Draw,
}

/// Why a move was refused. The relay drops refused moves silently; the
/// reason is only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRefusal {
    Finished,
    OutOfBounds,
    WrongTurn,
    Occupied,
    /// The sender does not hold the seat of the color it played
    NotYourSeat,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub black: Option<ClientId>,
    pub white: Option<ClientId>,
    pub board: Board,
    pub history: Vec<Move>,
    pub current_turn: WireColor,
    /// Set by a five, a full board or a resignation; cleared by an accepted undo
    pub finished: bool,
    /// Pending teardown after a seat holder dropped
    pub disconnect: Option<PendingDisconnect>,
    /// Seat holder waiting for an answer to an undo request
    pub undo_requested_by: Option<ClientId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDisconnect {
    pub client: ClientId,
    pub deadline: Instant,
}

impl Room {
    /// New room with `creator` seated as black
    pub fn new(id: String, creator: ClientId) -> Self {
        Self {
            id,
            black: Some(creator),
            white: None,
            board: Board::new(),
            history: Vec::new(),
            current_turn: WireColor::Black,
            finished: false,
            disconnect: None,
            undo_requested_by: None,
        }
    }

    pub fn seat_of(&self, client: ClientId) -> Option<WireColor> {
        if self.black == Some(client) {
            Some(WireColor::Black)
        } else if self.white == Some(client) {
            Some(WireColor::White)
        } else {
            None
        }
    }

    pub fn is_member(&self, client: ClientId) -> bool {
        self.seat_of(client).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.black.is_some() && self.white.is_some()
    }

    /// Seated clients, black first
    pub fn members(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.black.iter().chain(self.white.iter()).copied()
    }

    /// Seated clients other than `client`
    pub fn others(&self, client: ClientId) -> impl Iterator<Item = ClientId> + '_ {
        self.members().filter(move |&c| c != client)
    }

    /// Validate and apply a move sent by `client`, who must hold the seat
    /// of `color`.
    pub fn apply_move_from(
        &mut self,
        client: ClientId,
        row: i64,
        col: i64,
        color: WireColor,
    ) -> Result<MoveOutcome, MoveRefusal> {
        if self.seat_of(client) != Some(color) {
            return Err(MoveRefusal::NotYourSeat);
        }
        self.apply_move(row, col, color)
    }

    /// Validate and apply a move for `color`.
    pub fn apply_move(
        &mut self,
        row: i64,
        col: i64,
        color: WireColor,
    ) -> Result<MoveOutcome, MoveRefusal> {
        if self.finished {
            return Err(MoveRefusal::Finished);
        }
        let pos = i32::try_from(row)
            .ok()
            .zip(i32::try_from(col).ok())
            .and_then(|(r, c)| Pos::try_new(r, c))
            .ok_or(MoveRefusal::OutOfBounds)?;
        if color != self.current_turn {
            return Err(MoveRefusal::WrongTurn);
        }
        if !self.board.is_empty(pos) {
            return Err(MoveRefusal::Occupied);
        }

        let stone = Stone::from(color);
        self.board.place_stone(pos, stone);
        self.history.push(Move::new(pos, stone));
        self.current_turn = color.opponent();
        // a request refers to the position it was made in
        self.undo_requested_by = None;

        if check_win(&self.board, pos, stone) {
            self.finished = true;
            Ok(MoveOutcome::Won(color))
        } else if is_draw(&self.board) {
            self.finished = true;
            Ok(MoveOutcome::Draw)
        } else {
            Ok(MoveOutcome::Continue)
        }
    }

    /// Record an undo request from a seat holder.
    pub fn request_undo(&mut self, client: ClientId) -> bool {
        if !self.is_member(client) {
            return false;
        }
        self.undo_requested_by = Some(client);
        true
    }

    /// Consume the pending undo request if it came from the other seat.
    pub fn answer_undo(&mut self, answerer: ClientId) -> bool {
        match self.undo_requested_by {
            Some(requester) if requester != answerer && self.is_member(answerer) => {
                self.undo_requested_by = None;
                true
            }
            _ => false,
        }
    }

    /// Take back the last two moves. The side to move is unchanged because
    /// one move of each color is retracted.
    pub fn undo_two(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        for _ in 0..2 {
            if let Some(m) = self.history.pop() {
                self.board.remove_stone(m.pos);
            }
        }
        self.finished = false;
        true
    }

    /// Mark the game over by resignation of `client`. The other color wins.
    pub fn resign(&mut self, client: ClientId) -> Winner {
        self.finished = true;
        if self.black == Some(client) {
            Winner::White
        } else {
            Winner::Black
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.board, &self.history, self.current_turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_seats_creator_black() {
        let room = Room::new("r1".to_string(), 7);
        assert_eq!(room.seat_of(7), Some(WireColor::Black));
        assert_eq!(room.seat_of(8), None);
        assert!(!room.is_full());
        assert_eq!(room.members().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_move_validation() {
        let mut room = Room::new("r1".to_string(), 1);
        assert_eq!(room.apply_move(7, 7, WireColor::White), Err(MoveRefusal::WrongTurn));
        assert_eq!(room.apply_move(15, 0, WireColor::Black), Err(MoveRefusal::OutOfBounds));
        assert_eq!(room.apply_move(-1, 0, WireColor::Black), Err(MoveRefusal::OutOfBounds));
        assert_eq!(room.apply_move(7, 7, WireColor::Black), Ok(MoveOutcome::Continue));
        assert_eq!(room.apply_move(7, 7, WireColor::White), Err(MoveRefusal::Occupied));
        assert_eq!(room.current_turn, WireColor::White);
        assert_eq!(room.history.len(), 1);
    }

    #[test]
    fn test_move_needs_own_seat() {
        let mut room = Room::new("r1".to_string(), 1);
        room.white = Some(2);
        assert_eq!(room.apply_move_from(1, 7, 7, WireColor::Black), Ok(MoveOutcome::Continue));
        assert_eq!(room.apply_move_from(1, 0, 0, WireColor::White), Err(MoveRefusal::NotYourSeat));
        assert_eq!(room.apply_move_from(3, 0, 0, WireColor::White), Err(MoveRefusal::NotYourSeat));
        assert_eq!(room.history.len(), 1);
        assert_eq!(room.apply_move_from(2, 0, 0, WireColor::White), Ok(MoveOutcome::Continue));
    }

    #[test]
    fn test_undo_answer_needs_request_from_other_seat() {
        let mut room = Room::new("r1".to_string(), 1);
        room.white = Some(2);
        assert!(!room.answer_undo(2));
        assert!(!room.request_undo(3));
        assert!(room.request_undo(1));
        assert!(!room.answer_undo(1));
        assert!(room.answer_undo(2));
        assert!(!room.answer_undo(2), "request already consumed");

        room.request_undo(2);
        room.apply_move(7, 7, WireColor::Black).unwrap();
        assert!(!room.answer_undo(1), "a move voids the request");
    }

    #[test]
    fn test_win_finishes_room() {
        let mut room = Room::new("r1".to_string(), 1);
        for i in 0..4 {
            room.apply_move(0, i, WireColor::Black).unwrap();
            room.apply_move(1, i, WireColor::White).unwrap();
        }
        assert_eq!(room.apply_move(0, 4, WireColor::Black), Ok(MoveOutcome::Won(WireColor::Black)));
        assert!(room.finished);
        assert_eq!(room.apply_move(1, 4, WireColor::White), Err(MoveRefusal::Finished));
    }

    #[test]
    fn test_undo_two_keeps_turn() {
        let mut room = Room::new("r1".to_string(), 1);
        assert!(!room.undo_two());
        room.apply_move(7, 7, WireColor::Black).unwrap();
        room.apply_move(7, 8, WireColor::White).unwrap();
        room.apply_move(8, 8, WireColor::Black).unwrap();
        assert!(room.undo_two());
        assert_eq!(room.history.len(), 1);
        assert_eq!(room.current_turn, WireColor::White);
        assert!(room.board.is_empty(Pos::new(8, 8)));
        assert!(room.board.is_empty(Pos::new(7, 8)));
    }

    #[test]
    fn test_resign_winner() {
        let mut room = Room::new("r1".to_string(), 1);
        room.white = Some(2);
        assert_eq!(room.resign(1), Winner::White);
        assert_eq!(room.resign(2), Winner::Black);
        assert!(room.finished);
    }
}

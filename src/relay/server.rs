//! Transport-independent relay server
//!
//! The server is a pure state machine: the transport feeds it decoded client
//! messages, disconnects and clock ticks, and sends out whatever
//! [`Outbound`] messages come back. Time is passed in explicitly so the
//! disconnect grace period can be driven deterministically.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::protocol::{ClientMessage, GameOverReason, ServerMessage, Winner};
use super::room::{ClientId, MoveOutcome, PendingDisconnect, Room};

const ROOM_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Relay tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// How long a dropped player's room is kept for a rejoin
    pub disconnect_grace: Duration,
    /// Length of generated room ids
    pub room_id_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            disconnect_grace: Duration::from_secs(30),
            room_id_len: 8,
        }
    }
}

/// A message addressed to one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: ClientId,
    pub message: ServerMessage,
}

impl Outbound {
    fn new(to: ClientId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

pub struct RelayServer {
    config: RelayConfig,
    rooms: FxHashMap<String, Room>,
    /// Room each client last created or joined; moves are routed by this
    memberships: FxHashMap<ClientId, String>,
    rng: ChaCha8Rng,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Deterministic room ids, for tests
    pub fn with_seed(config: RelayConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: RelayConfig, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            rooms: FxHashMap::default(),
            memberships: FxHashMap::default(),
            rng,
        }
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Decode and handle one raw message. Malformed input is dropped.
    pub fn handle_json(&mut self, client: ClientId, text: &str, now: Instant) -> Vec<Outbound> {
        match ClientMessage::from_json(text) {
            Ok(msg) => self.handle(client, msg, now),
            Err(e) => {
                warn!(client, error = %e, "dropping malformed relay message");
                Vec::new()
            }
        }
    }

    /// Handle one decoded message from `client`.
    pub fn handle(&mut self, client: ClientId, msg: ClientMessage, now: Instant) -> Vec<Outbound> {
        // Expired rooms go first so a late message cannot revive them
        let mut out = self.tick(now);

        match msg {
            ClientMessage::CreateRoom => out.extend(self.create_room(client)),
            ClientMessage::JoinRoom { room_id } => out.extend(self.join_room(client, &room_id)),
            ClientMessage::Move { row, col, color } => {
                let Some(room) = self.member_room_mut(client) else {
                    debug!(client, "move from a client outside any room");
                    return out;
                };
                match room.apply_move_from(client, row, col, color) {
                    Ok(outcome) => {
                        let members: Vec<ClientId> = room.members().collect();
                        let row = row as u8;
                        let col = col as u8;
                        for &to in &members {
                            out.push(Outbound::new(to, ServerMessage::Move { row, col, color }));
                        }
                        let over = match outcome {
                            MoveOutcome::Continue => None,
                            MoveOutcome::Won(c) => Some((Winner::from(c), GameOverReason::Win)),
                            MoveOutcome::Draw => Some((Winner::Draw, GameOverReason::Draw)),
                        };
                        if let Some((winner, reason)) = over {
                            info!(room = %room.id, ?winner, ?reason, "game over");
                            for &to in &members {
                                out.push(Outbound::new(to, ServerMessage::GameOver { winner, reason }));
                            }
                        }
                    }
                    Err(refusal) => {
                        debug!(client, room = %room.id, ?refusal, row, col, "dropping move");
                    }
                }
            }
            ClientMessage::UndoRequest { room_id } => {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    if room.request_undo(client) {
                        out.extend(room.others(client).map(|to| Outbound::new(to, ServerMessage::UndoRequest)));
                    }
                }
            }
            ClientMessage::UndoAccept { room_id } => {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    if !room.answer_undo(client) {
                        debug!(client, room = %room_id, "undo accept without a request from the other seat");
                    } else if room.undo_two() {
                        let snapshot = room.snapshot();
                        out.extend(
                            room.members()
                                .map(|to| Outbound::new(to, ServerMessage::UndoAccept(snapshot.clone()))),
                        );
                    } else {
                        debug!(room = %room_id, "undo accepted with fewer than two moves");
                    }
                }
            }
            ClientMessage::UndoReject { room_id } => {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    if room.answer_undo(client) {
                        out.extend(room.others(client).map(|to| Outbound::new(to, ServerMessage::UndoReject)));
                    }
                }
            }
            ClientMessage::Resign { room_id } => {
                if let Some(room) = self.rooms.get_mut(&room_id).filter(|r| r.is_member(client)) {
                    let winner = room.resign(client);
                    info!(room = %room_id, ?winner, "resignation");
                    let reason = GameOverReason::Resign;
                    out.extend(
                        room.members()
                            .map(|to| Outbound::new(to, ServerMessage::GameOver { winner, reason })),
                    );
                }
            }
            ClientMessage::LeaveRoom { room_id } => out.extend(self.leave_room(client, &room_id)),
        }

        out
    }

    /// Start the grace period for every room `client` is seated in.
    pub fn disconnect(&mut self, client: ClientId, now: Instant) -> Vec<Outbound> {
        let out = self.tick(now);
        let deadline = now + self.config.disconnect_grace;
        if let Some(room) = self.rooms.values_mut().find(|r| r.is_member(client)) {
            info!(room = %room.id, client, "player disconnected, holding room");
            room.disconnect = Some(PendingDisconnect { client, deadline });
        }
        out
    }

    /// Tear down rooms whose grace period has run out.
    pub fn tick(&mut self, now: Instant) -> Vec<Outbound> {
        let expired: Vec<String> = self
            .rooms
            .values()
            .filter(|r| r.disconnect.is_some_and(|d| now >= d.deadline))
            .map(|r| r.id.clone())
            .collect();

        let mut out = Vec::new();
        for id in expired {
            if let Some(room) = self.rooms.remove(&id) {
                info!(room = %id, "grace period over, closing room");
                let gone = room.disconnect.map(|d| d.client);
                for to in room.members() {
                    if Some(to) != gone {
                        out.push(Outbound::new(to, ServerMessage::OpponentLeft));
                    }
                }
                self.forget_members(&room);
            }
        }
        out
    }

    fn create_room(&mut self, client: ClientId) -> Vec<Outbound> {
        let mut out = self.leave_previous(client, None);
        let room_id = self.fresh_room_id();
        self.rooms
            .insert(room_id.clone(), Room::new(room_id.clone(), client));
        self.memberships.insert(client, room_id.clone());
        info!(room = %room_id, client, "room created");
        out.push(Outbound::new(client, ServerMessage::RoomCreated { room_id }));
        out
    }

    fn join_room(&mut self, client: ClientId, room_id: &str) -> Vec<Outbound> {
        match self.rooms.get(room_id) {
            None => {
                debug!(client, room = room_id, "join of missing room");
                return vec![error(client, "room does not exist")];
            }
            Some(room) if room.is_full() && !room.is_member(client) => {
                debug!(client, room = room_id, "join of full room");
                return vec![error(client, "room is full")];
            }
            Some(_) => {}
        }

        let mut out = self.leave_previous(client, Some(room_id));
        let Some(room) = self.rooms.get_mut(room_id) else {
            return out;
        };

        if room.disconnect.take().is_some() {
            info!(room = room_id, client, "player reconnected");
        }
        if room.white.is_none() && room.black != Some(client) {
            room.white = Some(client);
            info!(room = room_id, client, "joined as white");
        }

        let snapshot = room.snapshot();
        let members: Vec<ClientId> = room.members().collect();
        self.memberships.insert(client, room_id.to_string());

        out.push(Outbound::new(
            client,
            ServerMessage::RoomJoined {
                room_id: room_id.to_string(),
            },
        ));
        out.extend(
            members
                .into_iter()
                .map(|to| Outbound::new(to, ServerMessage::GameStart(snapshot.clone()))),
        );
        out
    }

    fn leave_room(&mut self, client: ClientId, room_id: &str) -> Vec<Outbound> {
        if self.memberships.get(&client).map(String::as_str) == Some(room_id) {
            self.memberships.remove(&client);
        }
        if !self.rooms.get(room_id).is_some_and(|r| r.is_member(client)) {
            return Vec::new();
        }
        let Some(room) = self.rooms.remove(room_id) else {
            return Vec::new();
        };
        info!(room = room_id, client, "room closed by leave");
        self.forget_members(&room);
        let out = room
            .others(client)
            .map(|to| Outbound::new(to, ServerMessage::OpponentLeft))
            .collect();
        out
    }

    /// Close the room `client` last sat in, unless it is `keep`.
    fn leave_previous(&mut self, client: ClientId, keep: Option<&str>) -> Vec<Outbound> {
        let Some(previous) = self.memberships.get(&client).cloned() else {
            return Vec::new();
        };
        if keep == Some(previous.as_str()) {
            return Vec::new();
        }
        self.leave_room(client, &previous)
    }

    fn member_room_mut(&mut self, client: ClientId) -> Option<&mut Room> {
        let id = self.memberships.get(&client)?;
        self.rooms.get_mut(id).filter(|r| r.is_member(client))
    }

    fn forget_members(&mut self, room: &Room) {
        for member in room.members() {
            if self.memberships.get(&member) == Some(&room.id) {
                self.memberships.remove(&member);
            }
        }
    }

    fn fresh_room_id(&mut self) -> String {
        loop {
            let id: String = (0..self.config.room_id_len)
                .map(|_| ROOM_ID_ALPHABET[self.rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

fn error(to: ClientId, message: &str) -> Outbound {
    Outbound::new(
        to,
        ServerMessage::Error {
            message: message.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::protocol::WireColor;

    const A: ClientId = 1;
    const B: ClientId = 2;
    const C: ClientId = 3;

    fn server() -> RelayServer {
        RelayServer::with_seed(RelayConfig::default(), 42)
    }

    fn open_room(server: &mut RelayServer, now: Instant) -> String {
        let out = server.handle(A, ClientMessage::CreateRoom, now);
        let room_id = match &out[..] {
            [Outbound {
                to: A,
                message: ServerMessage::RoomCreated { room_id },
            }] => room_id.clone(),
            other => panic!("unexpected {:?}", other),
        };
        server.handle(
            B,
            ClientMessage::JoinRoom {
                room_id: room_id.clone(),
            },
            now,
        );
        room_id
    }

    fn mv(row: i64, col: i64, color: WireColor) -> ClientMessage {
        ClientMessage::Move { row, col, color }
    }

    #[test]
    fn test_create_room_id_shape() {
        let mut server = server();
        let now = Instant::now();
        let out = server.handle(A, ClientMessage::CreateRoom, now);
        let ServerMessage::RoomCreated { room_id } = &out[0].message else {
            panic!("expected roomCreated");
        };
        assert_eq!(room_id.len(), 8);
        assert!(room_id.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b)));
        assert_eq!(server.room(room_id).and_then(|r| r.black), Some(A));
    }

    #[test]
    fn test_join_broadcasts_game_start() {
        let mut server = server();
        let now = Instant::now();
        let out = server.handle(A, ClientMessage::CreateRoom, now);
        let ServerMessage::RoomCreated { room_id } = out[0].message.clone() else {
            panic!("expected roomCreated");
        };
        let out = server.handle(B, ClientMessage::JoinRoom { room_id: room_id.clone() }, now);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Outbound::new(B, ServerMessage::RoomJoined { room_id: room_id.clone() }));
        assert!(out[1..].iter().all(|o| matches!(o.message, ServerMessage::GameStart(_))));
        assert_eq!(out[1].to, A);
        assert_eq!(out[2].to, B);
        assert_eq!(server.room(&room_id).and_then(|r| r.white), Some(B));
    }

    #[test]
    fn test_join_errors() {
        let mut server = server();
        let now = Instant::now();
        let out = server.handle(C, ClientMessage::JoinRoom { room_id: "nope".to_string() }, now);
        assert!(matches!(out[..], [Outbound { to: C, message: ServerMessage::Error { .. } }]));

        let room_id = open_room(&mut server, now);
        let out = server.handle(C, ClientMessage::JoinRoom { room_id }, now);
        assert!(matches!(out[..], [Outbound { to: C, message: ServerMessage::Error { .. } }]));
    }

    #[test]
    fn test_move_validated_and_broadcast() {
        let mut server = server();
        let now = Instant::now();
        open_room(&mut server, now);

        // White cannot open
        assert!(server.handle(B, mv(7, 7, WireColor::White), now).is_empty());

        let out = server.handle(A, mv(7, 7, WireColor::Black), now);
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|o| o.message == ServerMessage::Move { row: 7, col: 7, color: WireColor::Black }));

        // Occupied cell
        assert!(server.handle(B, mv(7, 7, WireColor::White), now).is_empty());
        // Out of range
        assert!(server.handle(B, mv(99, 7, WireColor::White), now).is_empty());
    }

    #[test]
    fn test_win_broadcasts_game_over_and_blocks_moves() {
        let mut server = server();
        let now = Instant::now();
        open_room(&mut server, now);
        for i in 0..4 {
            server.handle(A, mv(0, i, WireColor::Black), now);
            server.handle(B, mv(1, i, WireColor::White), now);
        }
        let out = server.handle(A, mv(0, 4, WireColor::Black), now);
        assert_eq!(out.len(), 4);
        assert!(out[2..].iter().all(|o| o.message
            == ServerMessage::GameOver {
                winner: Winner::Black,
                reason: GameOverReason::Win
            }));
        assert!(server.handle(B, mv(5, 5, WireColor::White), now).is_empty());
    }

    #[test]
    fn test_undo_flow() {
        let mut server = server();
        let now = Instant::now();
        let room_id = open_room(&mut server, now);

        server.handle(A, mv(7, 7, WireColor::Black), now);
        let out = server.handle(A, ClientMessage::UndoAccept { room_id: room_id.clone() }, now);
        assert!(out.is_empty(), "fewer than two moves");

        server.handle(B, mv(7, 8, WireColor::White), now);
        let out = server.handle(A, ClientMessage::UndoRequest { room_id: room_id.clone() }, now);
        assert_eq!(out, vec![Outbound::new(B, ServerMessage::UndoRequest)]);
        // the requester cannot grant its own request
        let out = server.handle(A, ClientMessage::UndoAccept { room_id: room_id.clone() }, now);
        assert!(out.is_empty());

        let out = server.handle(B, ClientMessage::UndoAccept { room_id: room_id.clone() }, now);
        assert_eq!(out.len(), 2);
        let ServerMessage::UndoAccept(snapshot) = &out[0].message else {
            panic!("expected undoAccept");
        };
        assert!(snapshot.move_history.is_empty());
        assert_eq!(snapshot.current_turn, WireColor::Black);

        let out = server.handle(B, ClientMessage::UndoReject { room_id: room_id.clone() }, now);
        assert!(out.is_empty(), "no request pending");
        server.handle(A, ClientMessage::UndoRequest { room_id: room_id.clone() }, now);
        let out = server.handle(B, ClientMessage::UndoReject { room_id }, now);
        assert_eq!(out, vec![Outbound::new(A, ServerMessage::UndoReject)]);
    }

    #[test]
    fn test_unrequested_undo_accept_dropped() {
        let mut server = server();
        let now = Instant::now();
        let room_id = open_room(&mut server, now);
        server.handle(A, mv(7, 7, WireColor::Black), now);
        server.handle(B, mv(7, 8, WireColor::White), now);

        let out = server.handle(B, ClientMessage::UndoAccept { room_id: room_id.clone() }, now);
        assert!(out.is_empty());
        assert_eq!(server.room(&room_id).map(|r| r.history.len()), Some(2));
    }

    #[test]
    fn test_move_for_the_other_seat_dropped() {
        let mut server = server();
        let now = Instant::now();
        let room_id = open_room(&mut server, now);
        server.handle(A, mv(7, 7, WireColor::Black), now);

        assert!(server.handle(A, mv(0, 0, WireColor::White), now).is_empty());
        assert!(server.handle(C, mv(0, 0, WireColor::White), now).is_empty());
        assert_eq!(server.room(&room_id).map(|r| r.history.len()), Some(1));
        assert_eq!(server.handle(B, mv(0, 0, WireColor::White), now).len(), 2);
    }

    #[test]
    fn test_new_room_closes_the_previous_one() {
        let mut server = server();
        let now = Instant::now();
        let first = open_room(&mut server, now);

        let out = server.handle(A, ClientMessage::CreateRoom, now);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Outbound::new(B, ServerMessage::OpponentLeft));
        assert!(matches!(out[1], Outbound { to: A, message: ServerMessage::RoomCreated { .. } }));
        assert!(server.room(&first).is_none());
        assert_eq!(server.room_count(), 1);
    }

    #[test]
    fn test_joining_elsewhere_closes_the_previous_room() {
        let mut server = server();
        let now = Instant::now();
        let first = open_room(&mut server, now);
        let out = server.handle(C, ClientMessage::CreateRoom, now);
        let ServerMessage::RoomCreated { room_id: second } = out[0].message.clone() else {
            panic!("expected roomCreated");
        };

        let out = server.handle(B, ClientMessage::JoinRoom { room_id: second.clone() }, now);
        assert_eq!(out[0], Outbound::new(A, ServerMessage::OpponentLeft));
        assert!(server.room(&first).is_none());
        assert_eq!(server.room(&second).and_then(|r| r.white), Some(B));

        // a rejoin of the same room is not a leave
        let out = server.handle(B, ClientMessage::JoinRoom { room_id: second.clone() }, now);
        assert!(out.iter().all(|o| o.message != ServerMessage::OpponentLeft));
        assert!(server.room(&second).is_some());
    }

    #[test]
    fn test_resign_and_leave() {
        let mut server = server();
        let now = Instant::now();
        let room_id = open_room(&mut server, now);

        let out = server.handle(A, ClientMessage::Resign { room_id: room_id.clone() }, now);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].message,
            ServerMessage::GameOver {
                winner: Winner::White,
                reason: GameOverReason::Resign
            }
        );

        let out = server.handle(B, ClientMessage::LeaveRoom { room_id: room_id.clone() }, now);
        assert_eq!(out, vec![Outbound::new(A, ServerMessage::OpponentLeft)]);
        assert!(server.room(&room_id).is_none());
        assert!(server.handle(A, mv(7, 7, WireColor::Black), now).is_empty());
    }

    #[test]
    fn test_disconnect_grace_expires() {
        let mut server = server();
        let now = Instant::now();
        let room_id = open_room(&mut server, now);

        assert!(server.disconnect(B, now).is_empty());
        assert!(server.tick(now + Duration::from_secs(29)).is_empty());
        let out = server.tick(now + Duration::from_secs(30));
        assert_eq!(out, vec![Outbound::new(A, ServerMessage::OpponentLeft)]);
        assert!(server.room(&room_id).is_none());
        assert_eq!(server.room_count(), 0);
    }

    #[test]
    fn test_rejoin_within_grace_keeps_room() {
        let mut server = server();
        let now = Instant::now();
        let room_id = open_room(&mut server, now);
        server.handle(A, mv(7, 7, WireColor::Black), now);

        server.disconnect(B, now);
        let later = now + Duration::from_secs(10);
        let out = server.handle(B, ClientMessage::JoinRoom { room_id: room_id.clone() }, later);
        let ServerMessage::GameStart(snapshot) = &out[1].message else {
            panic!("expected gameStart");
        };
        assert_eq!(snapshot.move_history.len(), 1);
        assert_eq!(snapshot.current_turn, WireColor::White);

        assert!(server.tick(now + Duration::from_secs(60)).is_empty());
        assert!(server.room(&room_id).is_some());
    }

    #[test]
    fn test_malformed_json_dropped() {
        let mut server = server();
        let now = Instant::now();
        assert!(server.handle_json(A, "{\"type\":", now).is_empty());
        assert!(server.handle_json(A, r#"{"type":"fly"}"#, now).is_empty());
        assert_eq!(server.handle_json(A, r#"{"type":"createRoom"}"#, now).len(), 1);
    }
}

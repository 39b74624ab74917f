//! Connection manager: handles connection lifecycle, room membership and fan-out.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use orderhub_core::config::RealtimeConfig;
use orderhub_core::events::RealtimeEvent;

use crate::message::InboundMessage;
use crate::room::RoomRegistry;
use crate::ticket::Principal;

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Manages all active WebSocket connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Room membership.
    rooms: RoomRegistry,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            pool: ConnectionPool::new(),
            rooms: RoomRegistry::new(),
            config,
        }
    }

    /// Registers a connection for a redeemed ticket.
    ///
    /// Returns the handle and the receiver the socket task drains. The
    /// connection starts with no rooms; clients re-join after every reconnect.
    pub fn register(&self, principal: Principal) -> (Arc<ConnectionHandle>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(principal, tx));
        handle.mark_open();
        self.pool.add(Arc::clone(&handle));

        info!(
            conn_id = %handle.id,
            user_id = handle.principal.user_id,
            "WebSocket connection registered"
        );
        (handle, rx)
    }

    /// Unregisters a connection and drops its room memberships.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_closed();
            let rooms = self.rooms.leave_all(*conn_id);
            info!(
                conn_id = %conn_id,
                user_id = handle.principal.user_id,
                rooms,
                "WebSocket connection unregistered"
            );
        }
    }

    /// Processes an inbound text frame. Malformed frames are logged and dropped.
    pub fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        if raw.len() > self.config.max_message_bytes {
            warn!(conn_id = %conn_id, bytes = raw.len(), "Inbound frame too large, dropping");
            return;
        }

        let msg = match InboundMessage::parse(raw) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Malformed inbound message, dropping");
                return;
            }
        };

        match msg {
            InboundMessage::JoinRoom(room) => {
                self.join_room(conn_id, &room.room_id);
            }
            InboundMessage::LeaveRoom(room) => {
                self.leave_room(conn_id, &room.room_id);
            }
        }
    }

    /// Adds a connection to a room. Joining twice is a no-op.
    ///
    /// Returns whether the connection is a member afterwards.
    pub fn join_room(&self, conn_id: &ConnectionId, room: &str) -> bool {
        if self.pool.get(conn_id).is_none() {
            debug!(conn_id = %conn_id, room, "Join from unknown connection ignored");
            return false;
        }
        if self.rooms.is_member(room, *conn_id) {
            return true;
        }
        if self.rooms.room_count(*conn_id) >= self.config.max_rooms_per_connection {
            warn!(
                conn_id = %conn_id,
                room,
                max = self.config.max_rooms_per_connection,
                "Room limit reached, join ignored"
            );
            return false;
        }

        if self.rooms.join(room, *conn_id) {
            debug!(conn_id = %conn_id, room, "Joined room");
        }
        true
    }

    /// Removes a connection from a room. Leaving a room not joined is a no-op.
    pub fn leave_room(&self, conn_id: &ConnectionId, room: &str) {
        if self.rooms.leave(room, *conn_id) {
            debug!(conn_id = %conn_id, room, "Left room");
        }
    }

    /// Delivers an event to every open connection in a room.
    ///
    /// Returns the number of connections the frame was queued for. A failed
    /// send affects only that connection.
    pub fn broadcast(&self, room: &str, event: &RealtimeEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        let delivered = self.deliver(self.rooms.members(room), &frame);
        debug!(room, event = %event.event_type, delivered, "Room broadcast");
        delivered
    }

    /// Delivers an event once to every connection in any of `rooms`.
    pub fn broadcast_rooms(&self, rooms: &[String], event: &RealtimeEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        let mut seen = HashSet::new();
        let targets: Vec<ConnectionId> = rooms
            .iter()
            .flat_map(|room| self.rooms.members(room))
            .filter(|id| seen.insert(*id))
            .collect();
        self.deliver(targets, &frame)
    }

    /// Delivers an event to every open connection.
    pub fn broadcast_all(&self, event: &RealtimeEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        self.pool
            .all()
            .iter()
            .filter(|conn| conn.send(Arc::clone(&frame)))
            .count()
    }

    /// Delivers an event to every connection owned by a principal, regardless of room.
    pub fn dispatch_to_principal(&self, user_id: i64, event: &RealtimeEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        self.pool
            .user_connections(user_id)
            .iter()
            .filter(|conn| conn.send(Arc::clone(&frame)))
            .count()
    }

    /// Closes every connection of a principal (logout).
    pub fn close_principal(&self, user_id: i64) -> usize {
        let conns = self.pool.remove_user(user_id);
        for conn in &conns {
            conn.close();
            self.rooms.leave_all(conn.id);
        }
        if !conns.is_empty() {
            info!(user_id, count = conns.len(), "Closed principal connections");
        }
        conns.len()
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all();
        for conn in &all {
            conn.close();
            self.pool.remove(&conn.id);
            self.rooms.leave_all(conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    fn deliver(&self, targets: Vec<ConnectionId>, frame: &Arc<str>) -> usize {
        let mut delivered = 0;
        for conn_id in targets {
            match self.pool.get(&conn_id) {
                Some(conn) if conn.send(Arc::clone(frame)) => delivered += 1,
                Some(_) => debug!(conn_id = %conn_id, "Frame dropped"),
                None => {}
            }
        }
        delivered
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique connected admins.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Whether a connection is in a room.
    pub fn is_in_room(&self, conn_id: &ConnectionId, room: &str) -> bool {
        self.rooms.is_member(room, *conn_id)
    }
}

fn encode(event: &RealtimeEvent) -> Option<Arc<str>> {
    match event.to_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            error!(error = %e, event = %event.event_type, "Failed to serialize realtime event");
            None
        }
    }
}

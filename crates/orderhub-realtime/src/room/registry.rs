//! Room registry: room membership with a reverse index per connection.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

/// Many-to-many map between rooms and connections.
///
/// Rooms exist only while they have members.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name → member connections.
    rooms: DashMap<String, HashSet<ConnectionId>>,
    /// Connection → rooms it joined.
    memberships: DashMap<ConnectionId, HashSet<String>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room. Returns `false` if it was already a member.
    pub fn join(&self, room: &str, conn_id: ConnectionId) -> bool {
        let added = self
            .memberships
            .entry(conn_id)
            .or_default()
            .insert(room.to_string());
        if added {
            self.rooms
                .entry(room.to_string())
                .or_default()
                .insert(conn_id);
        }
        added
    }

    /// Removes a connection from a room. Returns `false` if it was not a member.
    pub fn leave(&self, room: &str, conn_id: ConnectionId) -> bool {
        let removed = self
            .memberships
            .get_mut(&conn_id)
            .is_some_and(|mut rooms| rooms.remove(room));
        self.memberships.remove_if(&conn_id, |_, rooms| rooms.is_empty());

        if removed {
            self.detach(room, conn_id);
        }
        removed
    }

    /// Removes a connection from every room it joined.
    pub fn leave_all(&self, conn_id: ConnectionId) -> usize {
        let Some((_, rooms)) = self.memberships.remove(&conn_id) else {
            return 0;
        };
        for room in &rooms {
            self.detach(room, conn_id);
        }
        rooms.len()
    }

    fn detach(&self, room: &str, conn_id: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn_id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }

    /// Connections currently in a room.
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of rooms a connection has joined.
    pub fn room_count(&self, conn_id: ConnectionId) -> usize {
        self.memberships
            .get(&conn_id)
            .map(|rooms| rooms.len())
            .unwrap_or(0)
    }

    /// Whether a connection is in a room.
    pub fn is_member(&self, room: &str, conn_id: ConnectionId) -> bool {
        self.memberships
            .get(&conn_id)
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// Number of non-empty rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no room has members.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_join_is_idempotent() {
        let rooms = RoomRegistry::new();
        let conn = Uuid::new_v4();
        assert!(rooms.join("city:1", conn));
        assert!(!rooms.join("city:1", conn));
        assert_eq!(rooms.members("city:1"), vec![conn]);
        assert_eq!(rooms.room_count(conn), 1);
    }

    #[test]
    fn test_leave_removes_empty_room() {
        let rooms = RoomRegistry::new();
        let conn = Uuid::new_v4();
        rooms.join("city:1", conn);
        assert!(rooms.leave("city:1", conn));
        assert!(!rooms.leave("city:1", conn));
        assert!(rooms.is_empty());
        assert_eq!(rooms.room_count(conn), 0);
    }

    #[test]
    fn test_leave_all_keeps_other_members() {
        let rooms = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        rooms.join("city:1", a);
        rooms.join("branch:2", a);
        rooms.join("city:1", b);

        assert_eq!(rooms.leave_all(a), 2);
        assert_eq!(rooms.members("city:1"), vec![b]);
        assert!(rooms.members("branch:2").is_empty());
        assert_eq!(rooms.len(), 1);
    }
}

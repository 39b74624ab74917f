//! Inbound client message types.
//!
//! Clients send `{ "type": "join-room" | "leave-room", "data": { "roomId": .. } }`.
//! Outbound frames are [`orderhub_core::events::RealtimeEvent`]s.

use serde::{Deserialize, Deserializer};

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Start receiving a room's events.
    JoinRoom(RoomRef),
    /// Stop receiving a room's events.
    LeaveRoom(RoomRef),
}

/// Room named in an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomRef {
    /// Room name; numbers are accepted and used in their decimal form.
    #[serde(rename = "roomId", deserialize_with = "room_id")]
    pub room_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRoomId {
    Int(i64),
    Str(String),
}

fn room_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = match RawRoomId::deserialize(deserializer)? {
        RawRoomId::Int(n) => n.to_string(),
        RawRoomId::Str(s) => s.trim().to_string(),
    };
    if id.is_empty() {
        return Err(serde::de::Error::custom("roomId must not be empty"));
    }
    Ok(id)
}

impl InboundMessage {
    /// Parse a text frame.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_room() {
        let msg = InboundMessage::parse(r#"{"type":"join-room","data":{"roomId":"city:3"}}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::JoinRoom(RoomRef {
                room_id: "city:3".into()
            })
        );
    }

    #[test]
    fn test_numeric_room_id() {
        let msg = InboundMessage::parse(r#"{"type":"leave-room","data":{"roomId":12}}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::LeaveRoom(RoomRef {
                room_id: "12".into()
            })
        );
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(InboundMessage::parse("not json").is_err());
        assert!(InboundMessage::parse(r#"{"type":"subscribe","data":{}}"#).is_err());
        assert!(InboundMessage::parse(r#"{"type":"join-room","data":{"roomId":"  "}}"#).is_err());
        assert!(InboundMessage::parse(r#"{"type":"join-room"}"#).is_err());
    }
}

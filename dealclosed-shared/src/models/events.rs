use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// Error frame emitted on the live channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamErrorEvent {
    pub code: String,
    pub message: String,
}

/// Presence registration payload for the live channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnouncePresenceRequest {
    pub user_id: Uuid,
}

/// Envelope for events delivered on (and published to) the live channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboxStreamEvent {
    /// A message was delivered to the subscribed user.
    #[serde(rename = "message.new")]
    MessageNew { payload: Message },
    /// The channel reported a delivery failure.
    #[serde(rename = "error")]
    Error { payload: StreamErrorEvent },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;
    use chrono::{TimeZone, Utc};

    #[test]
    fn message_new_uses_dotted_tag() {
        let event = InboxStreamEvent::MessageNew {
            payload: Message {
                id: Uuid::new_v4(),
                conversation_id: Uuid::new_v4(),
                sender_id: Uuid::new_v4(),
                body: "hello".to_string(),
                created_at: Timestamp(Utc.with_ymd_and_hms(2025, 3, 8, 14, 30, 0).unwrap()),
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"message.new\""));

        let round_tripped: InboxStreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, event);
    }

    #[test]
    fn error_event_round_trips() {
        let event = InboxStreamEvent::Error {
            payload: StreamErrorEvent {
                code: "delivery_failed".to_string(),
                message: "receiver unreachable".to_string(),
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        let round_tripped: InboxStreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, event);
    }
}

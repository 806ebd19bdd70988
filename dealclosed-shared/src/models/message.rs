use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// Represents a single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier for the message. Server-assigned once persisted;
    /// optimistic client copies carry a temporary identifier until the write
    /// acknowledgement arrives.
    pub id: Uuid,

    /// ID of the conversation this message belongs to.
    pub conversation_id: Uuid,

    /// ID of the user who sent the message.
    pub sender_id: Uuid,

    /// The message content.
    pub body: String,

    /// Timestamp when the message was created.
    pub created_at: Timestamp,
}

/// Payload of the message write endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// The user sending the message.
    pub sender_id: Uuid,

    /// The conversation peer the message is addressed to.
    pub receiver_id: Uuid,

    /// The conversation the message belongs to.
    pub conversation_id: Uuid,

    /// The message content.
    pub body: String,
}

/// Acknowledgement of a persisted message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageResponse {
    /// The persisted message with its authoritative identifier.
    pub message: Message,
}

/// Response of the message history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageHistoryResponse {
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_timestamp() -> Timestamp {
        Timestamp(Utc.with_ymd_and_hms(2025, 3, 8, 14, 30, 0).unwrap())
    }

    #[test]
    fn test_message_creation() {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            body: "Hello, world!".to_string(),
            created_at: sample_timestamp(),
        };

        assert_eq!(message.body, "Hello, world!");
        assert!(!message.id.is_nil());
    }

    #[test]
    fn test_message_equality() {
        let id = Uuid::new_v4();
        let conversation_id = Uuid::new_v4();
        let sender_id = Uuid::new_v4();

        let make = |body: &str| Message {
            id,
            conversation_id,
            sender_id,
            body: body.to_string(),
            created_at: sample_timestamp(),
        };

        assert_eq!(make("same"), make("same"));
        assert_ne!(make("same"), make("different"));
    }

    #[test]
    fn test_message_serialization() {
        let message = Message {
            id: Uuid::parse_str("f47ac10b-58cc-4372-a567-0e02b2c3d479").unwrap(),
            conversation_id: Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap(),
            sender_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            body: "Test message".to_string(),
            created_at: sample_timestamp(),
        };

        let serialized = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, message);
    }

    #[test]
    fn test_send_message_request_carries_all_routing_fields() {
        let request = SendMessageRequest {
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            body: "hi".to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("sender_id"));
        assert!(json.contains("receiver_id"));
        assert!(json.contains("conversation_id"));
        assert!(json.contains("\"hi\""));
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// Denormalized profile snippet for one conversation member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Identity of the member.
    pub user_id: Uuid,

    /// Name shown in the conversation list and message view.
    pub display_name: String,

    /// Optional avatar location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A two-party messaging thread between a business and an agent.
///
/// Conversations are created by the backend when two users first interact;
/// clients only ever read them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// Unique identifier for the conversation.
    pub id: Uuid,

    /// The two members, with their profile snippets.
    pub members: Vec<Participant>,

    /// When the conversation was created.
    pub created_at: Timestamp,

    /// Timestamp of the last message in the conversation.
    pub last_updated: Timestamp,
}

impl Conversation {
    /// Resolve the member that is not `user_id`.
    ///
    /// Returns `None` when the conversation has no second member, which makes
    /// a send into it impossible.
    #[must_use]
    pub fn peer_of(&self, user_id: Uuid) -> Option<&Participant> {
        self.members.iter().find(|member| member.user_id != user_id)
    }
}

/// Response of the conversation list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
}

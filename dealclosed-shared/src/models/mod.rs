//! Wire-level models exchanged with the DealClosed backend and live channel.

pub mod conversation;
pub mod errors;
pub mod events;
pub mod message;
pub mod timestamp;
pub mod user;

pub use conversation::{Conversation, ConversationListResponse, Participant};
pub use errors::ErrorResponse;
pub use events::{AnnouncePresenceRequest, InboxStreamEvent, StreamErrorEvent};
pub use message::{Message, MessageHistoryResponse, SendMessageRequest, SendMessageResponse};
pub use timestamp::Timestamp;
pub use user::{AccountRole, LoginRequest, LoginResponse, MeResponse, User};

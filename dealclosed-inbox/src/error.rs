use http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the inbox controller and its collaborators.
///
/// Every variant is local and recoverable; nothing here is fatal to the
/// process.
#[derive(Debug, Error)]
pub enum InboxError {
    /// The HTTP transport failed before a response was produced.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status of the rejection.
        status: StatusCode,
        /// Response body, when one was readable.
        message: String,
    },

    /// The live channel failed to announce, publish, or subscribe.
    #[error("live channel failure: {0}")]
    Channel(String),

    /// An operation that requires a selected conversation ran without one.
    #[error("no conversation is selected")]
    NoSelection,

    /// The selected conversation has no second member to address.
    #[error("conversation {0} has no reachable peer")]
    PeerUnresolved(Uuid),

    /// A retry or dismissal referenced a local message that is not failed.
    #[error("message {0} is not awaiting retry")]
    UnknownLocalMessage(Uuid),
}

//! Live push channel abstraction.
//!
//! The channel is an external collaborator: it routes message events to a
//! user once their presence is announced, fans published payloads out to the
//! conversation peer, and delivers inbound events through a subscription.

use async_trait::async_trait;
use shared::models::Message;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use crate::error::InboxError;

/// Handle to an active live-event feed.
///
/// Dropping the subscription tears the underlying feed down on every exit
/// path, mirroring the unmount cleanup of the inbox view.
#[derive(Debug)]
pub struct LiveSubscription {
    receiver: mpsc::Receiver<Message>,
    worker: Option<JoinHandle<()>>,
}

impl LiveSubscription {
    /// Build a subscription from a receiver and the worker task feeding it.
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<Message>, worker: Option<JoinHandle<()>>) -> Self {
        Self { receiver, worker }
    }

    /// Receive the next inbound message; `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Push-channel operations the controller depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveChannel: Send + Sync {
    /// Register the user with the channel so inbound events are routed here.
    ///
    /// # Errors
    /// Fails when the channel rejects the registration.
    async fn announce(&self, user_id: Uuid) -> Result<(), InboxError>;

    /// Publish a message for fan-out to its conversation peer.
    ///
    /// # Errors
    /// Fails when the channel rejects the payload.
    async fn publish(&self, message: &Message) -> Result<(), InboxError>;

    /// Open the inbound event feed.
    ///
    /// # Errors
    /// Fails when the feed cannot be established.
    async fn subscribe(&self) -> Result<LiveSubscription, InboxError>;
}

//! Orchestration of the inbox view state over the REST api and live channel.
//!
//! The controller owns the displayed message list and unread counters for the
//! lifetime of one mounted inbox view. Every mutation funnels through the
//! reducer in [`crate::state`]; the state mutex is only held for synchronous
//! reducer applications and never across an await point, so callback
//! interleavings keep the FIFO-per-epoch semantics of a single-threaded event
//! loop.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use shared::models::{Message, SendMessageRequest, Timestamp};
use uuid::Uuid;

use crate::api::InboxApi;
use crate::error::InboxError;
use crate::live::{LiveChannel, LiveSubscription};
use crate::state::{Applied, DeliveryState, InboxEvent, InboxSnapshot, InboxState};

/// Authenticated identity the controller operates for.
///
/// Constructing one requires a resolved user id, which is what keeps the
/// loaders from ever firing before authentication completes.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The authenticated user's identity.
    pub user_id: Uuid,
    /// Name shown for locally originated messages.
    pub display_name: String,
}

/// Behavioral switches for the controller.
#[derive(Debug, Clone)]
pub struct InboxOptions {
    /// Drop live events that echo the user's own sends back. Whether the
    /// channel echoes at all is a transport property, so this stays explicit
    /// rather than assumed (see DESIGN.md).
    pub suppress_own_echoes: bool,
}

impl Default for InboxOptions {
    fn default() -> Self {
        Self {
            suppress_own_echoes: true,
        }
    }
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty or whitespace-only input; nothing happened.
    EmptyInput,
    /// The write was acknowledged; the entry now carries its server id.
    Delivered {
        /// Temporary id the optimistic entry was appended under.
        local_id: Uuid,
    },
    /// The write failed; the entry stays visible, marked failed.
    WriteFailed {
        /// Temporary id the optimistic entry was appended under.
        local_id: Uuid,
    },
}

/// The conversation synchronization controller.
#[derive(Clone)]
pub struct InboxController {
    context: SessionContext,
    api: Arc<dyn InboxApi>,
    channel: Arc<dyn LiveChannel>,
    state: Arc<Mutex<InboxState>>,
}

impl fmt::Debug for InboxController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboxController")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl InboxController {
    /// Build a controller for one mounted inbox view.
    #[must_use]
    pub fn new(
        context: SessionContext,
        api: Arc<dyn InboxApi>,
        channel: Arc<dyn LiveChannel>,
        options: InboxOptions,
    ) -> Self {
        let state = InboxState::new(context.user_id, options.suppress_own_echoes);
        Self {
            context,
            api,
            channel,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The identity this controller operates for.
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Announce presence on the live channel and load the conversation list.
    ///
    /// # Errors
    /// Fails when the presence announcement is rejected; a conversation list
    /// failure is recorded in the state instead (empty list plus
    /// `last_error`).
    pub async fn start(&self) -> Result<(), InboxError> {
        self.channel.announce(self.context.user_id).await?;
        self.refresh_conversations().await;
        Ok(())
    }

    /// Fetch the conversation list, replacing the current one.
    ///
    /// A failure surfaces as an empty list plus `last_error`; calling this
    /// again is the retry affordance.
    pub async fn refresh_conversations(&self) {
        match self.api.list_conversations().await {
            Ok(conversations) => {
                self.with_state(|state| state.apply(InboxEvent::ConversationsLoaded(conversations)));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load conversations");
                self.with_state(|state| {
                    state.apply(InboxEvent::ConversationsFailed(err.to_string()))
                });
            }
        }
    }

    /// Select a conversation: reset its unread counter, start a new selection
    /// epoch, and replace the displayed list with its fetched history.
    pub async fn select(&self, conversation_id: Uuid) {
        let epoch = self.with_state(|state| {
            state.apply(InboxEvent::Selected(conversation_id));
            state.epoch()
        });
        self.load_history(conversation_id, epoch).await;
    }

    /// Re-fetch history for the current selection.
    ///
    /// Replaces the displayed list with an equivalent result when the backend
    /// is unchanged; this is also the retry affordance after a failed load.
    ///
    /// # Errors
    /// Fails when no conversation is selected.
    pub async fn reload_history(&self) -> Result<(), InboxError> {
        let (conversation_id, epoch) = self.with_state(|state| {
            state
                .selected()
                .map(|conversation_id| (conversation_id, state.epoch()))
                .ok_or(InboxError::NoSelection)
        })?;
        self.load_history(conversation_id, epoch).await;
        Ok(())
    }

    // History responses carry the epoch their fetch was issued under; the
    // reducer discards the ones that lost a selection race.
    async fn load_history(&self, conversation_id: Uuid, epoch: u64) {
        match self.api.message_history(conversation_id).await {
            Ok(messages) => {
                self.with_state(|state| state.apply(InboxEvent::HistoryLoaded { epoch, messages }));
            }
            Err(err) => {
                tracing::warn!(error = %err, %conversation_id, "failed to load history");
                self.with_state(|state| {
                    state.apply(InboxEvent::HistoryFailed {
                        epoch,
                        error: err.to_string(),
                    })
                });
            }
        }
    }

    /// Send pipeline: append an optimistic copy immediately, then persist the
    /// message and publish it on the live channel concurrently.
    ///
    /// The optimistic entry is visible before either call settles; callers
    /// that must not block on the settling (a UI event handler) detach this
    /// future. Empty or whitespace-only input is a silent no-op.
    ///
    /// # Errors
    /// Fails when no conversation is selected, or when the selected
    /// conversation has no resolvable peer.
    pub async fn send(&self, input: &str) -> Result<SendOutcome, InboxError> {
        let body = input.trim();
        if body.is_empty() {
            return Ok(SendOutcome::EmptyInput);
        }

        let (conversation_id, receiver_id) = self.with_state(|state| {
            let conversation = state.selected_conversation().ok_or(InboxError::NoSelection)?;
            let peer = conversation
                .peer_of(self.context.user_id)
                .ok_or(InboxError::PeerUnresolved(conversation.id))?;
            Ok::<_, InboxError>((conversation.id, peer.user_id))
        })?;

        let optimistic = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id: self.context.user_id,
            body: body.to_owned(),
            created_at: Timestamp::now(),
        };
        let local_id = optimistic.id;
        self.with_state(|state| state.apply(InboxEvent::LocalSend(optimistic.clone())));

        let request = SendMessageRequest {
            sender_id: self.context.user_id,
            receiver_id,
            conversation_id,
            body: body.to_owned(),
        };
        Ok(self.settle_send(local_id, request, optimistic).await)
    }

    /// Attempt a failed send again.
    ///
    /// # Errors
    /// Fails when `local_id` does not name a failed entry, or when its
    /// conversation no longer has a resolvable peer.
    pub async fn retry_send(&self, local_id: Uuid) -> Result<SendOutcome, InboxError> {
        let (message, receiver_id) = self.with_state(|state| {
            let entry = state
                .messages()
                .iter()
                .find(|entry| {
                    entry.message.id == local_id && entry.delivery == DeliveryState::Failed
                })
                .ok_or(InboxError::UnknownLocalMessage(local_id))?;
            let message = entry.message.clone();
            let conversation = state
                .conversations()
                .iter()
                .find(|conversation| conversation.id == message.conversation_id)
                .ok_or(InboxError::PeerUnresolved(message.conversation_id))?;
            let peer = conversation
                .peer_of(self.context.user_id)
                .ok_or(InboxError::PeerUnresolved(conversation.id))?;
            Ok::<_, InboxError>((message, peer.user_id))
        })?;

        self.with_state(|state| state.apply(InboxEvent::SendRetried(local_id)));
        let request = SendMessageRequest {
            sender_id: message.sender_id,
            receiver_id,
            conversation_id: message.conversation_id,
            body: message.body.clone(),
        };
        Ok(self.settle_send(local_id, request, message).await)
    }

    /// Remove a failed entry from the displayed list.
    ///
    /// # Errors
    /// Fails when `local_id` does not name a failed entry.
    pub fn dismiss_failed(&self, local_id: Uuid) -> Result<(), InboxError> {
        match self.with_state(|state| state.apply(InboxEvent::FailedDismissed(local_id))) {
            Applied::Dismissed => Ok(()),
            _ => Err(InboxError::UnknownLocalMessage(local_id)),
        }
    }

    /// Feed one inbound live event through the reducer.
    pub fn ingest(&self, message: Message) -> Applied {
        self.with_state(|state| state.apply(InboxEvent::Live(message)))
    }

    /// Open the live event feed. The returned subscription unsubscribes when
    /// dropped.
    ///
    /// # Errors
    /// Fails when the feed cannot be established.
    pub async fn subscribe(&self) -> Result<LiveSubscription, InboxError> {
        self.channel.subscribe().await
    }

    /// Read-only copy of the view state, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> InboxSnapshot {
        self.with_state(|state| state.snapshot())
    }

    async fn settle_send(
        &self,
        local_id: Uuid,
        request: SendMessageRequest,
        published: Message,
    ) -> SendOutcome {
        let (persisted, publish_result) = tokio::join!(
            self.api.send_message(&request),
            self.channel.publish(&published)
        );
        if let Err(err) = publish_result {
            tracing::warn!(error = %err, "live publish failed");
        }
        match persisted {
            Ok(ack) => {
                self.with_state(|state| {
                    state.apply(InboxEvent::SendSucceeded {
                        local_id,
                        message: ack.message,
                    })
                });
                SendOutcome::Delivered { local_id }
            }
            Err(err) => {
                tracing::warn!(error = %err, "message write failed");
                self.with_state(|state| {
                    state.apply(InboxEvent::SendFailed {
                        local_id,
                        error: err.to_string(),
                    })
                });
                SendOutcome::WriteFailed { local_id }
            }
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut InboxState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

//! Reducer-style view state for one mounted inbox.
//!
//! Every mutation of the displayed message list and unread counters is an
//! [`InboxEvent`] applied through [`InboxState::apply`]. The list is
//! append-only within a selection epoch; switching conversations starts a new
//! epoch and replaces the list wholesale once that epoch's history fetch
//! lands. History responses tagged with an older epoch are discarded instead
//! of clobbering the newer selection.

use std::collections::HashMap;

use shared::models::{Conversation, Message};
use uuid::Uuid;

/// Delivery status of a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Optimistic local entry whose write has not settled yet.
    Pending,
    /// Received from history or the channel, or acknowledged by the backend.
    Sent,
    /// The persistence call failed; the entry stays visible with a marker.
    Failed,
}

/// One row of the displayed message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedMessage {
    /// The message content and routing fields.
    pub message: Message,
    /// Where the message is in its delivery lifecycle.
    pub delivery: DeliveryState,
}

/// Inputs consumed by [`InboxState::apply`].
#[derive(Debug, Clone)]
pub enum InboxEvent {
    /// The conversation list fetch settled successfully.
    ConversationsLoaded(Vec<Conversation>),
    /// The conversation list fetch failed; the list surfaces as empty.
    ConversationsFailed(String),
    /// A conversation became the selected one.
    Selected(Uuid),
    /// A history fetch settled for the epoch it was issued under.
    HistoryLoaded {
        /// Epoch captured when the fetch was issued.
        epoch: u64,
        /// The conversation's persisted history, in backend order.
        messages: Vec<Message>,
    },
    /// A history fetch failed for the epoch it was issued under.
    HistoryFailed {
        /// Epoch captured when the fetch was issued.
        epoch: u64,
        /// Rendered failure for the inline indicator.
        error: String,
    },
    /// An inbound message arrived on the live channel.
    Live(Message),
    /// An optimistic copy of a locally originated send.
    LocalSend(Message),
    /// The persistence call for a local send succeeded.
    SendSucceeded {
        /// Temporary id the optimistic entry was appended under.
        local_id: Uuid,
        /// The persisted message with its authoritative id.
        message: Message,
    },
    /// The persistence call for a local send failed.
    SendFailed {
        /// Temporary id the optimistic entry was appended under.
        local_id: Uuid,
        /// Rendered failure for the inline indicator.
        error: String,
    },
    /// A failed send is being attempted again.
    SendRetried(Uuid),
    /// A failed entry was dismissed by the user.
    FailedDismissed(Uuid),
}

/// What applying one event did, for callers that render incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The conversation list was replaced.
    ConversationsReplaced,
    /// A failure was recorded in `last_error`.
    ErrorRecorded,
    /// A new selection epoch started; the displayed list was cleared.
    SelectionStarted,
    /// The displayed list was replaced with the fetched history.
    HistoryReplaced,
    /// A response tagged with an older epoch was discarded.
    StaleDiscarded,
    /// A message was appended to the displayed list.
    Appended,
    /// The unread counter of a non-selected conversation was bumped.
    UnreadIncremented(Uuid),
    /// A live echo of the user's own send was dropped.
    EchoSuppressed,
    /// An existing entry changed delivery state (or swapped in its server id).
    DeliveryUpdated(Uuid),
    /// A failed entry was removed from the displayed list.
    Dismissed,
    /// The event did not apply to the current state.
    Ignored,
}

/// Read-only copy of the view state, for rendering.
#[derive(Debug, Clone)]
pub struct InboxSnapshot {
    /// Conversations in backend order.
    pub conversations: Vec<Conversation>,
    /// The selected conversation, if any.
    pub selected: Option<Uuid>,
    /// The displayed message list for the selected conversation.
    pub messages: Vec<DisplayedMessage>,
    /// Per-conversation unread counters.
    pub unread: HashMap<Uuid, u64>,
    /// Most recent locally recoverable failure, if any.
    pub last_error: Option<String>,
}

/// View-state owned by the controller for the lifetime of one mounted inbox.
#[derive(Debug, Clone)]
pub struct InboxState {
    user_id: Uuid,
    suppress_own_echoes: bool,
    conversations: Vec<Conversation>,
    selected: Option<Uuid>,
    epoch: u64,
    messages: Vec<DisplayedMessage>,
    unread: HashMap<Uuid, u64>,
    last_error: Option<String>,
}

impl InboxState {
    /// Fresh state for a mounted inbox view.
    #[must_use]
    pub fn new(user_id: Uuid, suppress_own_echoes: bool) -> Self {
        Self {
            user_id,
            suppress_own_echoes,
            conversations: Vec::new(),
            selected: None,
            epoch: 0,
            messages: Vec::new(),
            unread: HashMap::new(),
            last_error: None,
        }
    }

    /// Conversations in backend order.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// The selected conversation id, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    /// The selected conversation record, if it is known.
    #[must_use]
    pub fn selected_conversation(&self) -> Option<&Conversation> {
        let selected = self.selected?;
        self.conversations
            .iter()
            .find(|conversation| conversation.id == selected)
    }

    /// The current selection epoch. Bumped on every [`InboxEvent::Selected`].
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The displayed message list.
    #[must_use]
    pub fn messages(&self) -> &[DisplayedMessage] {
        &self.messages
    }

    /// Unread counter for one conversation; absent entries count as zero.
    #[must_use]
    pub fn unread_count(&self, conversation_id: Uuid) -> u64 {
        self.unread.get(&conversation_id).copied().unwrap_or(0)
    }

    /// Most recent locally recoverable failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Read-only copy of the state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> InboxSnapshot {
        InboxSnapshot {
            conversations: self.conversations.clone(),
            selected: self.selected,
            messages: self.messages.clone(),
            unread: self.unread.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Apply one event and report what changed.
    pub fn apply(&mut self, event: InboxEvent) -> Applied {
        match event {
            InboxEvent::ConversationsLoaded(conversations) => {
                self.conversations = conversations;
                self.last_error = None;
                Applied::ConversationsReplaced
            }
            InboxEvent::ConversationsFailed(error) => {
                self.conversations.clear();
                self.last_error = Some(error);
                Applied::ErrorRecorded
            }
            InboxEvent::Selected(conversation_id) => {
                self.selected = Some(conversation_id);
                self.epoch += 1;
                self.messages.clear();
                self.unread.insert(conversation_id, 0);
                Applied::SelectionStarted
            }
            InboxEvent::HistoryLoaded { epoch, messages } => {
                if epoch != self.epoch {
                    return Applied::StaleDiscarded;
                }
                self.messages = messages
                    .into_iter()
                    .map(|message| DisplayedMessage {
                        message,
                        delivery: DeliveryState::Sent,
                    })
                    .collect();
                self.last_error = None;
                Applied::HistoryReplaced
            }
            InboxEvent::HistoryFailed { epoch, error } => {
                if epoch != self.epoch {
                    return Applied::StaleDiscarded;
                }
                self.last_error = Some(error);
                Applied::ErrorRecorded
            }
            InboxEvent::Live(message) => self.apply_live(message),
            InboxEvent::LocalSend(message) => {
                if self.selected != Some(message.conversation_id) {
                    return Applied::Ignored;
                }
                self.messages.push(DisplayedMessage {
                    message,
                    delivery: DeliveryState::Pending,
                });
                Applied::Appended
            }
            InboxEvent::SendSucceeded { local_id, message } => {
                if let Some(entry) = self.find_mut(local_id) {
                    let acknowledged_id = message.id;
                    entry.message = message;
                    entry.delivery = DeliveryState::Sent;
                    Applied::DeliveryUpdated(acknowledged_id)
                } else {
                    Applied::Ignored
                }
            }
            InboxEvent::SendFailed { local_id, error } => {
                if let Some(entry) = self.find_mut(local_id) {
                    entry.delivery = DeliveryState::Failed;
                    self.last_error = Some(error);
                    Applied::DeliveryUpdated(local_id)
                } else {
                    Applied::Ignored
                }
            }
            InboxEvent::SendRetried(local_id) => {
                match self.find_mut(local_id) {
                    Some(entry) if entry.delivery == DeliveryState::Failed => {
                        entry.delivery = DeliveryState::Pending;
                        Applied::DeliveryUpdated(local_id)
                    }
                    _ => Applied::Ignored,
                }
            }
            InboxEvent::FailedDismissed(local_id) => {
                let before = self.messages.len();
                self.messages.retain(|entry| {
                    entry.message.id != local_id || entry.delivery != DeliveryState::Failed
                });
                if self.messages.len() < before {
                    Applied::Dismissed
                } else {
                    Applied::Ignored
                }
            }
        }
    }

    fn apply_live(&mut self, message: Message) -> Applied {
        if self.selected == Some(message.conversation_id) {
            if self.suppress_own_echoes
                && message.sender_id == self.user_id
                && self.matches_local_send(&message)
            {
                return Applied::EchoSuppressed;
            }
            self.messages.push(DisplayedMessage {
                message,
                delivery: DeliveryState::Sent,
            });
            Applied::Appended
        } else {
            let counter = self.unread.entry(message.conversation_id).or_insert(0);
            *counter += 1;
            Applied::UnreadIncremented(message.conversation_id)
        }
    }

    // An echo matches by the acknowledged server id, or by body against an
    // optimistic entry whose acknowledgement has not landed yet.
    fn matches_local_send(&self, message: &Message) -> bool {
        self.messages.iter().any(|entry| {
            entry.message.id == message.id
                || (entry.delivery == DeliveryState::Pending
                    && entry.message.conversation_id == message.conversation_id
                    && entry.message.body == message.body)
        })
    }

    fn find_mut(&mut self, local_id: Uuid) -> Option<&mut DisplayedMessage> {
        self.messages
            .iter_mut()
            .find(|entry| entry.message.id == local_id)
    }
}

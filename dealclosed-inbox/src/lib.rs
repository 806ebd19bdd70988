#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)] // TODO(deps-001): remove once transitive dependencies converge.

//! Conversation synchronization for the DealClosed inbox.
//!
//! The crate keeps an in-memory ordered message list consistent across an
//! initial bulk history fetch, asynchronous push events from the live
//! channel, and optimistic local sends, while tracking per-conversation
//! unread counts for conversations that are not currently open. All state
//! transitions funnel through the reducer in [`state`], so the view
//! semantics are testable without a UI or a live transport.

pub mod api;
pub mod controller;
pub mod error;
pub mod live;
pub mod sse;
pub mod state;

pub use api::{DealClosedClient, InboxApi};
pub use controller::{InboxController, InboxOptions, SendOutcome, SessionContext};
pub use error::InboxError;
pub use live::{LiveChannel, LiveSubscription};
pub use sse::SseLiveChannel;
pub use state::{Applied, DeliveryState, DisplayedMessage, InboxEvent, InboxSnapshot, InboxState};

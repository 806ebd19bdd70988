//! SSE transport for the live channel.
//!
//! Presence announcements and publishes are plain POSTs against the realtime
//! endpoints; the inbound feed is a server-sent-event stream parsed
//! frame-by-frame. The feed reconnects with a short pause until its
//! subscription guard is dropped.

use async_trait::async_trait;
use futures_util::StreamExt;
use shared::models::{InboxStreamEvent, Message};
use tokio::{
    sync::mpsc,
    time::{Duration, sleep},
};
use uuid::Uuid;

use crate::api::DealClosedClient;
use crate::error::InboxError;
use crate::live::{LiveChannel, LiveSubscription};

const RECONNECT_PAUSE: Duration = Duration::from_secs(1);
const FEED_BUFFER: usize = 64;

/// Live channel backed by the backend's SSE stream and realtime endpoints.
#[derive(Debug, Clone)]
pub struct SseLiveChannel {
    api: DealClosedClient,
    user_id: Uuid,
}

impl SseLiveChannel {
    /// Build a channel for one user over an authenticated API client.
    #[must_use]
    pub const fn new(api: DealClosedClient, user_id: Uuid) -> Self {
        Self { api, user_id }
    }
}

#[async_trait]
impl LiveChannel for SseLiveChannel {
    async fn announce(&self, user_id: Uuid) -> Result<(), InboxError> {
        self.api.announce_presence(user_id).await
    }

    async fn publish(&self, message: &Message) -> Result<(), InboxError> {
        let event = InboxStreamEvent::MessageNew {
            payload: message.clone(),
        };
        self.api.publish_event(&event).await
    }

    async fn subscribe(&self) -> Result<LiveSubscription, InboxError> {
        let (sender, receiver) = mpsc::channel(FEED_BUFFER);
        let api = self.api.clone();
        let user_id = self.user_id;
        let worker = tokio::spawn(async move {
            run_feed(api, user_id, sender).await;
        });
        Ok(LiveSubscription::new(receiver, Some(worker)))
    }
}

async fn run_feed(api: DealClosedClient, user_id: Uuid, sender: mpsc::Sender<Message>) {
    loop {
        let response = match api.open_stream(user_id).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "live stream connection failed");
                if sender.is_closed() {
                    return;
                }
                sleep(RECONNECT_PAUSE).await;
                continue;
            }
        };

        let mut stream = response.bytes_stream();
        let mut parser = FrameParser::default();
        let mut pending = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(error = %err, "live stream chunk error");
                    break;
                }
            };
            pending.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = pending.find('\n') {
                let line: String = pending.drain(..=newline).collect();
                if let Some(frame) = parser.push_line(line.trim_end_matches(['\n', '\r'])) {
                    if !dispatch_frame(&frame, &sender).await {
                        return;
                    }
                }
            }
        }

        if sender.is_closed() {
            return;
        }
        sleep(RECONNECT_PAUSE).await;
    }
}

// Forwards a parsed frame; returns false once the subscription is gone.
async fn dispatch_frame(frame: &Frame, sender: &mpsc::Sender<Message>) -> bool {
    match serde_json::from_str::<InboxStreamEvent>(&frame.data) {
        Ok(InboxStreamEvent::MessageNew { payload }) => sender.send(payload).await.is_ok(),
        Ok(InboxStreamEvent::Error { payload }) => {
            tracing::warn!(code = %payload.code, message = %payload.message, "live stream error event");
            true
        }
        Err(err) => {
            tracing::debug!(event = %frame.event, error = %err, "unparsed live stream frame");
            true
        }
    }
}

/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    event: String,
    data: String,
}

/// Incremental parser for the `event:` / `data:` / blank-line wire format.
#[derive(Debug, Default)]
struct FrameParser {
    event: Option<String>,
    data: String,
}

impl FrameParser {
    // Feed one line (without its terminator); a blank line completes a frame.
    fn push_line(&mut self, line: &str) -> Option<Frame> {
        if let Some(value) = line.strip_prefix("event:") {
            self.event = Some(value.trim().to_string());
            None
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data.push_str(value.trim());
            None
        } else if line.is_empty() {
            let event = self.event.take();
            let data = std::mem::take(&mut self.data);
            if data.is_empty() || data == "[DONE]" {
                return None;
            }
            Some(Frame {
                event: event.unwrap_or_else(|| "message".to_string()),
                data,
            })
        } else {
            // Comments (`:` prefixed) and `id:`/`retry:` fields are ignored.
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::Timestamp;

    fn feed_lines(parser: &mut FrameParser, lines: &[&str]) -> Vec<Frame> {
        lines
            .iter()
            .filter_map(|line| parser.push_line(line))
            .collect()
    }

    #[test]
    fn parser_assembles_named_event() {
        let mut parser = FrameParser::default();
        let frames = feed_lines(
            &mut parser,
            &["event: message.new", "data: {\"x\":1}", ""],
        );

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message.new");
        assert_eq!(frames[0].data, "{\"x\":1}");
    }

    #[test]
    fn parser_skips_comments_and_done_markers() {
        let mut parser = FrameParser::default();
        let frames = feed_lines(
            &mut parser,
            &[": keep-alive", "", "event: message.new", "data: [DONE]", ""],
        );

        assert!(frames.is_empty());
    }

    #[test]
    fn parser_handles_back_to_back_frames() {
        let mut parser = FrameParser::default();
        let frames = feed_lines(
            &mut parser,
            &[
                "event: message.new",
                "data: {\"a\":1}",
                "",
                "event: error",
                "data: {\"b\":2}",
                "",
            ],
        );

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "{\"a\":1}");
        assert_eq!(frames[1].event, "error");
    }

    #[tokio::test]
    async fn dispatch_forwards_message_new_payloads() {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            body: "hello".to_string(),
            created_at: Timestamp(Utc::now()),
        };
        let event = InboxStreamEvent::MessageNew {
            payload: message.clone(),
        };
        let frame = Frame {
            event: "message.new".to_string(),
            data: serde_json::to_string(&event).unwrap(),
        };

        let (tx, mut rx) = mpsc::channel(4);
        assert!(dispatch_frame(&frame, &tx).await);
        assert_eq!(rx.recv().await.unwrap(), message);
    }

    #[tokio::test]
    async fn dispatch_reports_closed_subscription() {
        let event = InboxStreamEvent::MessageNew {
            payload: Message {
                id: Uuid::new_v4(),
                conversation_id: Uuid::new_v4(),
                sender_id: Uuid::new_v4(),
                body: "hello".to_string(),
                created_at: Timestamp(Utc::now()),
            },
        };
        let frame = Frame {
            event: "message.new".to_string(),
            data: serde_json::to_string(&event).unwrap(),
        };

        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        assert!(!dispatch_frame(&frame, &tx).await);
    }
}

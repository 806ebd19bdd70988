//! Inbox commands driving the conversation synchronization controller.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use inbox::{
    Applied, DealClosedClient, DeliveryState, DisplayedMessage, InboxController, InboxOptions,
    InboxSnapshot, SendOutcome, SessionContext, SseLiveChannel,
};
use shared::{config::Config, models::Conversation};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use super::session;

#[derive(Args, Debug)]
#[command(about = "List conversations for the authenticated user")]
pub struct InboxArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(about = "Open a conversation and follow it interactively")]
pub struct OpenArgs {
    /// Conversation identifier to open
    #[arg(long, alias = "conv")]
    pub conversation: Uuid,

    /// Show the channel's echoes of your own sends instead of suppressing them
    #[arg(long)]
    pub show_echoes: bool,

    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(about = "Send a single message and exit")]
pub struct SendArgs {
    /// Conversation identifier to send into
    #[arg(long, alias = "conv")]
    pub conversation: Uuid,

    /// Message text
    #[arg()]
    pub text: String,

    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

fn build_controller(
    config_path: Option<PathBuf>,
    options: InboxOptions,
) -> Result<InboxController> {
    let config = Config::load_config(config_path, None)?;
    let session = session::load_session(&session::session_path())?;
    let client = DealClosedClient::with_token(&config.api_base_url, session.token.clone());
    let channel = SseLiveChannel::new(client.clone(), session.user.id);
    let context = SessionContext {
        user_id: session.user.id,
        display_name: session.user.display_name.clone(),
    };
    Ok(InboxController::new(
        context,
        Arc::new(client),
        Arc::new(channel),
        options,
    ))
}

pub async fn handle_inbox(args: InboxArgs) -> Result<()> {
    let controller = build_controller(args.config, InboxOptions::default())?;
    controller.refresh_conversations().await;

    let snapshot = controller.snapshot();
    if let Some(error) = &snapshot.last_error {
        bail!("failed to load conversations: {error}");
    }
    render_conversation_list(&snapshot, controller.context().user_id);
    Ok(())
}

pub async fn handle_open(args: OpenArgs) -> Result<()> {
    let options = InboxOptions {
        suppress_own_echoes: !args.show_echoes,
    };
    let controller = build_controller(args.config, options)?;
    controller
        .start()
        .await
        .context("failed to join the live channel")?;
    tracing::debug!(conversation = %args.conversation, "live channel joined");
    controller.select(args.conversation).await;

    let snapshot = controller.snapshot();
    if let Some(error) = &snapshot.last_error {
        eprintln!("warning: {error}");
    }
    let user_id = controller.context().user_id;
    let names = display_names(&snapshot.conversations);
    for entry in &snapshot.messages {
        println!("{}", render_message(entry, user_id, &names));
    }
    println!("(type a message and press Enter to send; Ctrl+D to leave)");

    let mut feed = controller
        .subscribe()
        .await
        .context("failed to subscribe to live events")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            inbound = feed.recv() => match inbound {
                Some(message) => match controller.ingest(message.clone()) {
                    Applied::Appended => {
                        let entry = DisplayedMessage {
                            message,
                            delivery: DeliveryState::Sent,
                        };
                        println!("{}", render_message(&entry, user_id, &names));
                    }
                    Applied::UnreadIncremented(conversation_id) => {
                        let unread = controller
                            .snapshot()
                            .unread
                            .get(&conversation_id)
                            .copied()
                            .unwrap_or(0);
                        eprintln!("{}", format!("[{unread} unread in {conversation_id}]").yellow());
                    }
                    _ => {}
                },
                None => {
                    eprintln!("[live feed closed]");
                    break;
                }
            },
            line = lines.next_line() => match line {
                Ok(Some(input)) => handle_send_line(&controller, &input).await,
                Ok(None) => break,
                Err(err) => {
                    eprintln!("input error: {err}");
                    break;
                }
            },
        }
    }

    Ok(())
}

pub async fn handle_send(args: SendArgs) -> Result<()> {
    let controller = build_controller(args.config, InboxOptions::default())?;
    controller.refresh_conversations().await;
    controller.select(args.conversation).await;

    match controller.send(&args.text).await? {
        SendOutcome::EmptyInput => bail!("refusing to send an empty message"),
        SendOutcome::Delivered { .. } => println!("Message delivered."),
        SendOutcome::WriteFailed { .. } => bail!("the backend rejected the message"),
    }
    Ok(())
}

async fn handle_send_line(controller: &InboxController, input: &str) {
    match controller.send(input).await {
        Ok(SendOutcome::EmptyInput | SendOutcome::Delivered { .. }) => {}
        Ok(SendOutcome::WriteFailed { local_id }) => {
            eprintln!(
                "{}",
                format!("failed to send; the message stays marked in the view ({local_id})").red()
            );
        }
        Err(err) => eprintln!("{}", format!("cannot send: {err}").red()),
    }
}

fn render_conversation_list(snapshot: &InboxSnapshot, user_id: Uuid) {
    if snapshot.conversations.is_empty() {
        println!("No conversations found.");
        return;
    }

    for conversation in &snapshot.conversations {
        let peer_name = conversation
            .peer_of(user_id)
            .map_or("(no peer)", |peer| peer.display_name.as_str());
        let unread = snapshot
            .unread
            .get(&conversation.id)
            .copied()
            .unwrap_or(0);
        let badge = if unread > 0 {
            format!(" [{unread} unread]").red().bold().to_string()
        } else {
            String::new()
        };
        println!(
            "- {} with {}{} (last activity {})",
            conversation.id, peer_name, badge, conversation.last_updated
        );
    }
}

fn display_names(conversations: &[Conversation]) -> HashMap<Uuid, String> {
    conversations
        .iter()
        .flat_map(|conversation| conversation.members.iter())
        .map(|member| (member.user_id, member.display_name.clone()))
        .collect()
}

fn render_message(
    entry: &DisplayedMessage,
    user_id: Uuid,
    names: &HashMap<Uuid, String>,
) -> String {
    let timestamp = entry.message.created_at.0.format("%Y-%m-%d %H:%M:%S");
    let sender = if entry.message.sender_id == user_id {
        "you".to_string()
    } else {
        names
            .get(&entry.message.sender_id)
            .cloned()
            .unwrap_or_else(|| entry.message.sender_id.to_string())
    };
    let marker = match entry.delivery {
        DeliveryState::Pending => " (sending)",
        DeliveryState::Sent => "",
        DeliveryState::Failed => " (failed)",
    };
    format!("[{timestamp}] {sender}: {}{marker}", entry.message.body)
}

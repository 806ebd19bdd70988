//! Session management against the DealClosed identity provider.

use std::{
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Args;
use directories::BaseDirs;
use inbox::{DealClosedClient, InboxApi};
use rpassword::prompt_password;
use serde::{Deserialize, Serialize};
use shared::{
    config::Config,
    models::{LoginRequest, Timestamp, User},
};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MeArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Stored session: the bearer token plus the profile it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
    pub expires_at: Timestamp,
}

/// Where the session file lives. `DEALCLOSED_SESSION_FILE` overrides the
/// platform data directory.
pub fn session_path() -> PathBuf {
    if let Ok(path) = env::var("DEALCLOSED_SESSION_FILE") {
        return PathBuf::from(path);
    }
    BaseDirs::new().map_or_else(
        || PathBuf::from(".dealclosed-session.json"),
        |dirs| dirs.data_dir().join("dealclosed").join("session.json"),
    )
}

pub fn load_session(path: &Path) -> Result<StoredSession> {
    let content = fs::read_to_string(path).with_context(|| {
        format!(
            "no active session found at {}; run `dealclosed session login` first",
            path.display()
        )
    })?;
    serde_json::from_str(&content)
        .context("stored session is unreadable; run `dealclosed session login` again")
}

fn persist_session(session: &StoredSession, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let serialized = serde_json::to_string_pretty(session)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write session to {}", path.display()))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let config = Config::load_config(args.config, None)?;
    let client = DealClosedClient::new(&config.api_base_url);
    let path = session_path();

    let email = prompt("Email: ")?;
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let login = client
        .login(&LoginRequest { email, password })
        .await
        .context("login failed")?;

    let session = StoredSession {
        token: login.token,
        user: login.user,
        expires_at: login.expires_at,
    };
    persist_session(&session, &path)?;
    print_session_summary(&session, &path);
    Ok(())
}

pub async fn me(args: MeArgs) -> Result<()> {
    let config = Config::load_config(args.config, None)?;
    let path = session_path();
    let mut session = load_session(&path)?;

    let client = DealClosedClient::with_token(&config.api_base_url, session.token.clone());
    let profile = client
        .profile()
        .await
        .context("session expired; run `dealclosed session login` to sign in again")?;

    session.user = profile.user;
    persist_session(&session, &path)?;
    print_session_summary(&session, &path);
    Ok(())
}

pub async fn logout(args: LogoutArgs) -> Result<()> {
    let config = Config::load_config(args.config, None)?;
    let path = session_path();

    match load_session(&path) {
        Ok(session) => {
            let client = DealClosedClient::with_token(&config.api_base_url, session.token);
            if let Err(err) = client.logout().await {
                eprintln!("warning: logout request failed: {err}");
            }
        }
        Err(_) => eprintln!("no active session; nothing to revoke"),
    }

    if path.exists() {
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
    }
    println!("Signed out.");
    Ok(())
}

fn print_session_summary(session: &StoredSession, path: &Path) {
    println!(
        "Signed in as {} <{}> ({})",
        session.user.display_name, session.user.email, session.user.role
    );
    println!("Session expires at {}", session.expires_at);
    println!("Session stored at {}", path.display());
}

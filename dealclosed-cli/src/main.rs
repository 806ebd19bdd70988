//! Main entry point for the DealClosed terminal client.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod commands;

/// DealClosed CLI
#[derive(Parser)]
#[command(name = "dealclosed")]
#[command(about = "Command-line client for the DealClosed marketplace inbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the DealClosed CLI
#[derive(Subcommand)]
enum Commands {
    /// Manage the authenticated session
    #[command(subcommand)]
    Session(SessionCommands),

    /// List conversations for the authenticated user
    Inbox(commands::inbox::InboxArgs),

    /// Open a conversation and follow it interactively
    Open(commands::inbox::OpenArgs),

    /// Send a single message and exit
    Send(commands::inbox::SendArgs),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: String,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },
}

/// Session management subcommands
#[derive(Subcommand)]
enum SessionCommands {
    /// Sign in and persist the issued bearer token
    Login(commands::session::LoginArgs),
    /// Show the authenticated profile
    Me(commands::session::MeArgs),
    /// Sign out and remove the stored session
    Logout(commands::session::LogoutArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Session(action) => match action {
            SessionCommands::Login(args) => commands::session::login(args).await?,
            SessionCommands::Me(args) => commands::session::me(args).await?,
            SessionCommands::Logout(args) => commands::session::logout(args).await?,
        },
        Commands::Inbox(args) => commands::inbox::handle_inbox(args).await?,
        Commands::Open(args) => commands::inbox::handle_open(args).await?,
        Commands::Send(args) => commands::inbox::handle_send(args).await?,
        Commands::Completion { shell } => {
            let shell = shell
                .parse::<clap_complete::Shell>()
                .map_err(|err| anyhow::anyhow!("invalid shell type: {err}"))?;
            commands::completion::generate_completion(shell);
        }
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            commands::config::generate_config(&format)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

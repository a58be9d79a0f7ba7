//! Console Bot Example
//!
//! Runs a full Lychii session against a fake real-time client that reads
//! messages from stdin and prints the bot's output to stdout.
//!
//! ```text
//! stdin line ──▶ TransportEvent::Message ──▶ Session ──▶ plugins
//! stdout     ◀── TransportCommand::{Send, Reply} ◀──────────┘
//! ```
//!
//! Lines starting with `/` control the fake connection:
//!
//! - `/drop`: simulate a dropped connection
//! - `/reconnect`: simulate the transport coming back
//! - `/quit`: close stdin
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --dm
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use lychii::core::{
    AuthPayload, Channel, InboundMessage, SelfInfo, Team, TransportCommand, TransportEvent,
    TransportLink, User, UserProfile, create_transport_channels,
};
use lychii::runtime::{
    ConfigLoader, LychiiConfig, RuntimeError, Session, logging, validate_config,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const BOT_ID: &str = "U0BOT";
const CONSOLE_USER: &str = "U0CONSOLE";

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Chat with a Lychii bot from the terminal")]
struct Args {
    /// Configuration file (defaults to lychii.toml in the usual locations).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bot token; the console transport accepts any value.
    #[arg(long, env = "SLACK_BOT_TOKEN", default_value = "console")]
    token: String,

    /// Name the bot answers to.
    #[arg(long, default_value = "lychii")]
    name: String,

    /// Send every line as a direct message, so no address prefix is needed.
    #[arg(long)]
    dm: bool,
}

fn load_config(args: &Args) -> Result<LychiiConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    if config.bot.token.is_empty() {
        config.bot.token.clone_from(&args.token);
    }
    validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

fn auth_payload(name: &str, default_channel: &str) -> AuthPayload {
    AuthPayload {
        self_info: SelfInfo {
            id: BOT_ID.into(),
            name: name.into(),
            bot_id: None,
        },
        team: Team {
            id: "T0CONSOLE".into(),
            name: "console".into(),
        },
        users: vec![
            User {
                id: BOT_ID.into(),
                name: name.into(),
                profile: UserProfile {
                    bot_id: Some("B0BOT".into()),
                },
            },
            User {
                id: CONSOLE_USER.into(),
                name: "you".into(),
                ..Default::default()
            },
        ],
        channels: vec![Channel::named("C0CONSOLE", "console")],
        groups: vec![Channel::named("G0STATUS", default_channel)],
    }
}

/// Fake real-time client: answers `start` with an authentication, turns
/// stdin lines into message events and prints outbound commands.
async fn run_console_client(mut link: TransportLink, payload: AuthPayload, dm: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let channel = Channel::named("C0CONSOLE", "console");
    let user = User {
        id: CONSOLE_USER.into(),
        name: "you".into(),
        ..Default::default()
    };

    loop {
        tokio::select! {
            command = link.commands.recv() => match command {
                Some(TransportCommand::Start) => {
                    let _ = link.events.send(TransportEvent::Authenticated(payload.clone())).await;
                    let _ = link.events.send(TransportEvent::Connected).await;
                }
                Some(TransportCommand::Send { text, channel }) => {
                    println!("[#{}] {text}", channel.display_name());
                }
                Some(TransportCommand::Reply { text, channel, .. }) => {
                    println!("[#{}] {text}", channel.display_name());
                }
                Some(TransportCommand::Disconnect) | None => return,
            },
            line = lines.next_line() => {
                let event = match line {
                    Ok(Some(line)) => match line.trim() {
                        "/quit" => return,
                        "/drop" => TransportEvent::Disconnected { reason: Some("dropped from console".into()) },
                        "/reconnect" => TransportEvent::Connected,
                        _ => {
                            let mut message = InboundMessage::new(line, user.clone(), channel.clone());
                            message.is_direct_message = dm;
                            TransportEvent::Message(message)
                        }
                    },
                    Ok(None) => return,
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        return;
                    }
                };
                if link.events.send(event).await.is_err() {
                    return;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;
    logging::init_from_config(&config.logging);

    let (channels, link) = create_transport_channels(64);
    let name = config.bot.name.clone().unwrap_or_else(|| args.name.clone());
    let payload = auth_payload(&name, &config.bot.default_channel);

    let mut session = Session::builder(config.bot, channels.transport)
        .build()
        .context("failed to load plugins")?;
    info!(plugins = ?session.registry().names(), "Session ready, type a message");

    let client = tokio::spawn(run_console_client(link, payload, args.dm));
    let code = match session.run(channels.events).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(RuntimeError::EventStreamClosed) => {
            info!("Console closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Session ended");
            e.exit_code()
        }
    };
    client.abort();
    Ok(code)
}

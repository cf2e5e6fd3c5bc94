//! Herald CLI - build lifecycle notifications from the command line
//!
//! The orchestrator (or a webhook relay) hands each lifecycle event to
//! `herald` as a JSON build snapshot.
//!
//! ## Commands
//!
//! - `notify`: run the event through the dispatcher and post to HipChat
//! - `preview`: print the full status message without gating or sending
//! - `check-config`: validate a config file and show the resolved settings

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use herald_core::{
    BuildRegistry, ChatResult, ChatService, Color, Dispatcher, HeraldConfig, LifecycleEvent,
    SnapshotRegistry,
};
use herald_hipchat::{HipChatClient, HipChatConfig};

#[derive(Parser)]
#[command(name = "herald")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Post CI build lifecycle notifications to a chat room", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a lifecycle event
    Notify {
        /// Path to the TOML config file
        #[arg(short, long, env = "HERALD_CONFIG")]
        config: PathBuf,

        /// Path to the JSON lifecycle event ("-" reads stdin)
        #[arg(short, long)]
        event: PathBuf,

        /// Path to a JSON registry snapshot used for upstream blame
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Print the message instead of posting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the full status message for the event's build
    Preview {
        /// Path to the TOML config file
        #[arg(short, long, env = "HERALD_CONFIG")]
        config: PathBuf,

        /// Path to the JSON lifecycle event ("-" reads stdin)
        #[arg(short, long)]
        event: PathBuf,

        /// Path to a JSON registry snapshot used for upstream blame
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Validate a config file
    CheckConfig {
        /// Path to the TOML config file
        #[arg(short, long, env = "HERALD_CONFIG")]
        config: PathBuf,
    },
}

/// Prints messages to stdout instead of posting them.
struct StdoutChatService;

#[async_trait]
impl ChatService for StdoutChatService {
    async fn publish(&self, message: &str, color: Color) -> ChatResult<()> {
        println!("[{}] {}", color, message);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    herald_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Notify {
            config,
            event,
            registry,
            dry_run,
        } => cmd_notify(&config, &event, registry.as_deref(), dry_run).await,
        Commands::Preview {
            config,
            event,
            registry,
        } => cmd_preview(&config, &event, registry.as_deref()),
        Commands::CheckConfig { config } => cmd_check_config(&config),
    }
}

async fn cmd_notify(
    config_path: &Path,
    event_path: &Path,
    registry_path: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let config = HeraldConfig::load(config_path)?;
    let notifier = config.resolve().context("Invalid notifier configuration")?;
    let event = load_event(event_path)?;
    let registry = load_registry(registry_path)?;

    let chat: Arc<dyn ChatService> = if dry_run {
        Arc::new(StdoutChatService)
    } else {
        let hipchat = HipChatConfig::from_notifier(&notifier, &config.delivery);
        Arc::new(HipChatClient::new(hipchat).context("Failed to create HipChat client")?)
    };

    info!(
        event = event.name(),
        project = %event.build().project,
        build = event.build().number,
        "Handling lifecycle event"
    );

    let dispatcher = Dispatcher::new(notifier, registry, chat);
    match dispatcher.handle(&event).await? {
        Some(notification) => {
            info!(id = %notification.id, "Notification dispatched");
        }
        None => {
            info!(event = event.name(), "No notification for this event");
        }
    }
    Ok(())
}

fn cmd_preview(config_path: &Path, event_path: &Path, registry_path: Option<&Path>) -> Result<()> {
    let config = HeraldConfig::load(config_path)?;
    let notifier = config.resolve().context("Invalid notifier configuration")?;
    let event = load_event(event_path)?;
    let registry = load_registry(registry_path)?;

    let dispatcher = Dispatcher::new(notifier, registry, Arc::new(StdoutChatService));
    let build = event.build();
    let (message, color) = dispatcher.status_message(build);
    let would_send = match &event {
        LifecycleEvent::Completed(b) => dispatcher.should_notify_completed(b),
        LifecycleEvent::Started(_) => dispatcher.config().start_notification,
        LifecycleEvent::Finalized(_) | LifecycleEvent::Deleted(_) => false,
    };

    println!("Event:     {}", event.name());
    println!("Color:     {}", color);
    println!("Would send: {}", if would_send { "yes" } else { "no" });
    println!("Message:   {}", message);
    Ok(())
}

fn cmd_check_config(config_path: &Path) -> Result<()> {
    let config = HeraldConfig::load(config_path)?;
    let notifier = config.resolve().context("Invalid notifier configuration")?;
    let hipchat = HipChatConfig::from_notifier(&notifier, &config.delivery);

    println!("Config OK: {}", config_path.display());
    println!("  Room:                {}", notifier.room);
    println!("  Send as:             {}", hipchat.sender_name());
    println!(
        "  Auth token:          {}",
        if notifier.auth_token.is_empty() { "missing" } else { "set" }
    );
    println!("  Build server url:    {}", notifier.server_url);
    println!("  Start notification:  {}", notifier.start_notification);
    println!("  Smart notifications: {}", notifier.smart_notifications);
    println!("  API url:             {}", hipchat.api_url);
    println!(
        "  Retries:             {} (base {}ms)",
        hipchat.max_retries, hipchat.backoff_base_ms
    );
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    }
}

fn load_event(path: &Path) -> Result<LifecycleEvent> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid lifecycle event in {:?}", path))
}

fn load_registry(path: Option<&Path>) -> Result<Arc<dyn BuildRegistry>> {
    let registry = match path {
        Some(path) => {
            let text = read_input(path)?;
            SnapshotRegistry::from_json(&text)
                .with_context(|| format!("Invalid registry snapshot in {:?}", path))?
        }
        None => SnapshotRegistry::new(),
    };
    Ok(Arc::new(registry))
}

//! tune-sync - Keep a Tunecast client store in sync from the command line
//!
//! Runs the sync engine against the configured backend and reports store
//! changes and signals, and drives the password recovery flow.

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use libtunecast::error::TransportError;
use libtunecast::logging::{LogFormat, LoggingConfig};
use libtunecast::service::validation::{ForgotPasswordForm, ResetPasswordForm};
use libtunecast::service::{Screen, Signal, TunecastService};
use libtunecast::{selectors, AppState, Config, TunecastError};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "tune-sync")]
#[command(version)]
#[command(about = "Keep a Tunecast client store in sync from the command line")]
#[command(long_about = "\
tune-sync - Keep a Tunecast client store in sync from the command line

USAGE:
    # Create the local media folders
    tune-sync init

    # Follow push events for a user, loading notifications on start
    tune-sync listen --user 6412f0c1 --load notifications

    # Password recovery
    tune-sync forgot-password amy@example.com
    tune-sync reset-password

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown of `listen`

CONFIGURATION:
    Configuration file: ~/.config/tunecast/config.toml (or TUNECAST_CONFIG)

EXIT CODES:
    0 - Success
    1 - Runtime, network or configuration error
    2 - Authentication rejected by the server
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true, env = "TUNECAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log output format (text, json, pretty)
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the local media folders under the data directory
    Init,

    /// Subscribe to push events and report store changes until interrupted
    Listen {
        /// User to subscribe as
        #[arg(long)]
        user: String,

        /// Screens to load once subscribed (repeatable)
        #[arg(long, value_enum)]
        load: Vec<LoadTarget>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Request a password reset link
    ForgotPassword {
        /// Account email address
        email: String,
    },

    /// Finish the password reset started by `forgot-password`
    ResetPassword {
        /// Read the new password from stdin instead of prompting
        #[arg(long)]
        stdin: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoadTarget {
    Feed,
    Contacts,
    Notifications,
}

impl LoadTarget {
    fn screen(self) -> Screen {
        match self {
            LoadTarget::Feed => Screen::NewsFeed,
            LoadTarget::Contacts => Screen::ChatContacts,
            LoadTarget::Notifications => Screen::Notifications,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::new(cli.log_format, "warn".to_string(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<TunecastError>() {
            Some(err) => {
                eprintln!("Error: {}", err.banner_message());
                std::process::exit(err.exit_code());
            }
            None => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let service = TunecastService::from_config(config).await?;

    match cli.command {
        Commands::Init => init(&service),
        Commands::Listen { user, load, format } => listen(&service, &user, &load, format).await,
        Commands::ForgotPassword { email } => forgot_password(&service, email).await,
        Commands::ResetPassword { stdin } => reset_password(&service, stdin).await,
    }
}

fn init(service: &TunecastService) -> Result<()> {
    let folders = service.bootstrap()?;
    for dir in folders.all() {
        println!("{}", dir.display());
    }
    Ok(())
}

async fn forgot_password(service: &TunecastService, email: String) -> Result<()> {
    service
        .account()
        .forgot_password(&ForgotPasswordForm { email })
        .await?;
    println!("Reset link sent. Run `tune-sync reset-password` once you have it.");
    Ok(())
}

async fn reset_password(service: &TunecastService, use_stdin: bool) -> Result<()> {
    let form = if use_stdin {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        let password = buffer.trim().to_string();
        ResetPasswordForm::new(password.clone(), password)
    } else {
        if !std::io::stdin().is_terminal() {
            return Err(TunecastError::InvalidInput(
                "Not a TTY. Use --stdin to read the password from stdin.".to_string(),
            )
            .into());
        }
        let password = rpassword::prompt_password("New password: ")?;
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        ResetPasswordForm::new(password, confirm)
    };

    service.account().reset_password(&form).await?;
    println!("Password updated.");
    Ok(())
}

/// Counts reported by `listen` whenever they change
#[derive(Debug, Clone, PartialEq, Eq)]
struct Summary {
    posts: usize,
    messages: usize,
    unread_notifications: usize,
    loading: bool,
}

impl Summary {
    fn of(state: &AppState) -> Self {
        Self {
            posts: state.posts.len(),
            messages: state.messenger.messages.len(),
            unread_notifications: selectors::unread_notifications(&state.notifications),
            loading: state.common.loading,
        }
    }

    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => format!(
                "posts={} messages={} unread_notifications={}{}",
                self.posts,
                self.messages,
                self.unread_notifications,
                if self.loading { " (loading)" } else { "" }
            ),
            OutputFormat::Json => json!({
                "type": "store",
                "posts": self.posts,
                "messages": self.messages,
                "unread_notifications": self.unread_notifications,
                "loading": self.loading,
            })
            .to_string(),
        }
    }
}

fn render_signal(signal: &Signal, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(signal).unwrap_or_default(),
        OutputFormat::Text => match signal {
            Signal::Followers { count } => format!("followers={}", count),
            Signal::Subscribed { user_id } => format!("subscribed as {}", user_id),
            Signal::Disconnected => "disconnected".to_string(),
        },
    }
}

async fn listen(
    service: &TunecastService,
    user: &str,
    load: &[LoadTarget],
    format: OutputFormat,
) -> Result<()> {
    let mut signals = service.subscribe();
    let mut watcher = service.store().watch();
    let (engine, handle) = service.connect().await?;
    let engine = tokio::spawn(engine.run());

    handle.subscribe(user)?;
    for target in load {
        handle.activate(target.screen())?;
    }

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let mut last: Option<Summary> = None;
    let outcome = loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                info!("Shutdown requested, stopping");
                break Ok(());
            }
            changed = watcher.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let summary = Summary::of(&watcher.borrow_and_update());
                if last.as_ref() != Some(&summary) {
                    println!("{}", summary.render(format));
                    last = Some(summary);
                }
            }
            signal = signals.recv() => match signal {
                Ok(signal) => {
                    println!("{}", render_signal(&signal, format));
                    if signal == Signal::Disconnected {
                        break Err(TunecastError::from(TransportError::Closed).into());
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "signal listener lagged"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    // The engine may already be gone after a disconnect.
    if handle.shutdown().is_err() {
        debug!("engine already stopped");
    }
    engine.await??;
    outcome
}

/// Resolve on SIGINT or SIGTERM
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use futures::StreamExt;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook_tokio::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let handle = signals.handle();
    if let Some(signal) = signals.next().await {
        debug!(signal, "received shutdown signal");
    }
    handle.close();
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libtunecast::{Notification, NotificationAction, Post};

    fn notification(id: &str, is_unread: bool) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: "bob".to_string(),
            opponent_id: "amy".to_string(),
            action: NotificationAction::Liked,
            source_post_id: None,
            is_unread,
            created_at: None,
        }
    }

    #[test]
    fn test_summary_counts_unread() {
        let mut state = AppState::default();
        state.posts.set(vec![Post {
            id: "p1".to_string(),
            ..Default::default()
        }]);
        state
            .notifications
            .set(vec![notification("n1", true), notification("n2", false)]);

        let summary = Summary::of(&state);
        assert_eq!(summary.posts, 1);
        assert_eq!(summary.unread_notifications, 1);
        assert_eq!(
            summary.render(OutputFormat::Text),
            "posts=1 messages=0 unread_notifications=1"
        );
    }

    #[test]
    fn test_summary_json() {
        let summary = Summary::of(&AppState::default());
        let value: serde_json::Value =
            serde_json::from_str(&summary.render(OutputFormat::Json)).unwrap();
        assert_eq!(value["type"], "store");
        assert_eq!(value["loading"], false);
    }

    #[test]
    fn test_render_signal() {
        let signal = Signal::Followers { count: 3 };
        assert_eq!(render_signal(&signal, OutputFormat::Text), "followers=3");
        assert_eq!(
            render_signal(&signal, OutputFormat::Json),
            r#"{"type":"followers","count":3}"#
        );
    }

    #[test]
    fn test_load_targets_map_to_screens() {
        assert_eq!(LoadTarget::Feed.screen(), Screen::NewsFeed);
        assert_eq!(LoadTarget::Notifications.screen(), Screen::Notifications);
    }
}

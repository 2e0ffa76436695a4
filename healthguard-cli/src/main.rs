//! HealthGuard CLI - terminal front-end for the HealthGuard backend
//!
//! # Quick Start
//!
//! ```bash
//! healthguard config init          # backend address, polling, session storage
//! healthguard register -u alice
//! healthguard login -u alice
//! healthguard assess --age 45 --gender female --height 165 --weight 60
//! healthguard monitor --seconds 30
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG`; user-facing notices are
//! printed on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use healthguard_client::config::ENV_BACKEND_URL;
use healthguard_client::models::Mood;
use healthguard_client::{AppContext, ClientConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod wizard;

use commands::assess::AssessArgs;
use commands::{account, assess, chat, checkin, config, guardian, history, monitor, Reported};
use display::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "healthguard")]
#[command(author = "HealthGuard Team")]
#[command(version)]
#[command(about = "Health assessments, live vitals, daily check-ins and guardian alerts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Backend origin, overrides the config file and HEALTHGUARD_BACKEND_URL
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Config file (default: HEALTHGUARD_CONFIG or the OS config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for the HealthGuard crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in; missing credentials are prompted
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user and backend
    Whoami,

    /// Resolve a page path through the route guard (e.g. /monitor)
    Open { path: String },

    /// Greeting and feature menu
    Dashboard,

    /// Diabetes and heart-disease risk assessment with AI advice
    Assess(AssessArgs),

    /// Saved assessments
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Poll live vitals from the device simulation
    Monitor {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        seconds: Option<u64>,
    },

    /// Daily mood check-in
    Checkin {
        #[command(subcommand)]
        action: CheckinCommands,
    },

    /// Emergency contact and alert thresholds
    Guardian {
        #[command(subcommand)]
        action: GuardianCommands,
    },

    /// Ask the health assistant (interactive without a message)
    Chat { message: Option<String> },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List saved assessments
    List,
    /// Show one assessment with its predictions
    Show { id: i64 },
    /// Delete an assessment
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CheckinCommands {
    /// Today's status, totals and streak
    Status,
    /// Check in for today
    Go {
        /// energetic, calm, happy or tired
        #[arg(short, long)]
        mood: Option<Mood>,
    },
}

#[derive(Subcommand)]
enum GuardianCommands {
    /// Current settings and alert log
    Show,
    /// Edit the settings interactively
    Save,
    /// Send a test alert to the contact
    Test,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Run the setup wizard and write the config file
    Init,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "healthguard=debug" } else { "healthguard=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // controller errors were already shown by the notifier
            if !e.is::<Reported>() {
                display::error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => ClientConfig::config_file_path().context("cannot locate config file")?,
    };
    let mut client_config = ClientConfig::load_from(&path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))?;
    client_config.apply_overrides(std::env::var(ENV_BACKEND_URL).ok());
    client_config.apply_overrides(cli.backend);

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigCommands::Show => config::show(&client_config, &path),
            ConfigCommands::Init => config::init(&client_config, &path).await,
        };
    }

    let ctx = AppContext::from_config(client_config, Arc::new(ConsoleNotifier))
        .context("failed to set up the HealthGuard client")?;

    match cli.command {
        Commands::Login { username, password } => account::login(&ctx, username, password).await?,
        Commands::Register { username, password } => account::register(&ctx, username, password).await?,
        Commands::Logout => account::logout(&ctx)?,
        Commands::Whoami => account::whoami(&ctx),
        Commands::Open { path } => account::open(&ctx, &path),
        Commands::Dashboard => account::dashboard(&ctx),
        Commands::Assess(args) => assess::run(&ctx, &args).await?,
        Commands::History { action } => match action {
            HistoryCommands::List => history::list(&ctx).await?,
            HistoryCommands::Show { id } => history::show(&ctx, id).await?,
            HistoryCommands::Delete { id } => history::delete(&ctx, id).await?,
        },
        Commands::Monitor { seconds } => monitor::run(&ctx, seconds).await?,
        Commands::Checkin { action } => match action {
            CheckinCommands::Status => checkin::status(&ctx).await?,
            CheckinCommands::Go { mood } => checkin::check_in(&ctx, mood).await?,
        },
        Commands::Guardian { action } => match action {
            GuardianCommands::Show => guardian::show(&ctx).await?,
            GuardianCommands::Save => guardian::save(&ctx).await?,
            GuardianCommands::Test => guardian::test_alert(&ctx).await?,
        },
        Commands::Chat { message } => chat::run(&ctx, message).await?,
        Commands::Config { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_commands() {
        let cli = Cli::try_parse_from(["healthguard", "--backend", "http://h:1", "checkin", "go", "--mood", "calm"]).unwrap();
        assert_eq!(cli.backend.as_deref(), Some("http://h:1"));
        assert!(matches!(
            cli.command,
            Commands::Checkin {
                action: CheckinCommands::Go { mood: Some(Mood::Calm) }
            }
        ));

        let cli = Cli::try_parse_from(["healthguard", "assess", "--age", "45", "--gender", "f", "--smoker"]).unwrap();
        let Commands::Assess(args) = cli.command else {
            panic!("expected assess");
        };
        assert_eq!(args.age, Some(45));
        assert!(args.smoker);

        assert!(Cli::try_parse_from(["healthguard", "checkin", "go", "--mood", "grumpy"]).is_err());
    }
}

//! Starmirror CLI - mirror a GitHub user's starred repositories locally.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::output::OutputFormat;

#[derive(Parser)]
#[command(name = "starmirror")]
#[command(version)]
#[command(about = "Mirror a GitHub user's starred repositories into a local database")]
#[command(
    long_about = "Starmirror keeps a local copy of everything a GitHub user has starred. \
Each sync walks the starred list, inserts new stars, refreshes known ones and removes \
unstarred ones. Runs can be started by hand or by a daily schedule, and every run is \
recorded in a history log."
)]
#[command(after_long_help = r#"EXAMPLES
    Sync now and wait for the result:
        $ starmirror sync

    Show the current status as JSON:
        $ starmirror status --output json

    Browse the run history:
        $ starmirror history --page 2 --page-size 10

    Run the daily schedule at 04:30 local time:
        $ starmirror serve --at 04:30

    Generate shell completions:
        $ starmirror completions bash > ~/.local/share/bash-completion/completions/starmirror

CONFIGURATION
    Starmirror reads configuration from:
      1. ~/.config/starmirror/config.toml (or $XDG_CONFIG_HOME/starmirror/config.toml)
      2. ./starmirror.toml
      3. Environment variables (STARMIRROR_ prefix, `__` between section and key)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STARMIRROR_DATABASE__URL       Database connection string (default: ~/.local/state/starmirror/starmirror.db)
    STARMIRROR_GITHUB__USERNAME    GitHub user whose stars are mirrored
    STARMIRROR_GITHUB__TOKEN       GitHub personal access token
    STARMIRROR_SYNC__SCHEDULE_TIME Daily run time, HH:MM (default: 02:00)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Run one sync now and wait for it to finish
    Sync {
        /// Delete local-only records even if the starred list was only partly fetched
        #[arg(long)]
        prune_on_partial_fetch: bool,

        /// Disable proactive rate limiting (may cause API throttling)
        #[arg(short = 'R', long)]
        no_rate_limit: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Show sync status and repository totals
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Show the sync run history, newest first
    History {
        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u64,

        /// Runs per page
        #[arg(short = 's', long, default_value_t = 20)]
        page_size: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Run the daily sync schedule until Ctrl+C
    Serve {
        /// Local time of the daily run, HH:MM (default from config or 02:00)
        #[arg(long)]
        at: Option<String>,

        /// Also start a sync immediately
        #[arg(long)]
        run_now: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Structured logging when output is not a terminal, and always for the
    // long-running scheduler.
    if !Term::stdout().is_term() || matches!(cli.command, Commands::Serve { .. }) {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("starmirror=info,starmirror_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    // Load configuration (config files -> env vars -> defaults)
    let mut config = config::Config::load();

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set [database] url in the config file")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync {
            prune_on_partial_fetch,
            no_rate_limit,
            output,
        } => {
            config.sync.prune_on_partial_fetch |= prune_on_partial_fetch;
            config.sync.no_rate_limit |= no_rate_limit;
            commands::sync::handle_sync(&config, &database_url, output).await?;
        }
        Commands::Status { output } => {
            commands::status::handle_status(&config, &database_url, output).await?;
        }
        Commands::History {
            page,
            page_size,
            output,
        } => {
            commands::history::handle_history(&config, &database_url, page, page_size, output)
                .await?;
        }
        Commands::Serve { at, run_now } => {
            commands::serve::handle_serve(&config, &database_url, at.as_deref(), run_now).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

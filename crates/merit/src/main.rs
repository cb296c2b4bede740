// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merit - achievement, badge, and leveling engine.
//!
//! This is the binary entry point for batch backfills and operator queries.

mod award;
mod batch;
mod output;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use merit_config::MeritConfig;
use merit_core::{ActivitySource, MeritError, UserId};
use merit_engine::{ActivityKind, Engine};
use merit_storage::{Database, SqliteActivitySource};

use crate::output::Output;

/// Merit - achievement, badge, and leveling engine.
#[derive(Parser, Debug)]
#[command(name = "merit", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite file holding the host platform tables. Defaults to the
    /// engine database.
    #[arg(long, global = true)]
    activity_db: Option<PathBuf>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-run achievement and badge checks for users (all active users by default).
    Backfill {
        /// Restrict the run to these user ids.
        #[arg(long = "user")]
        users: Vec<i64>,
    },
    /// Check every achievement and badge for one user.
    Check {
        #[arg(long)]
        user: i64,
    },
    /// Evaluate one achievement (or badge) and award it if met.
    Award {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        slug: String,
        /// Look the slug up among badges instead of achievements.
        #[arg(long)]
        badge: bool,
    },
    /// Credit an activity reward (e.g. `article_create`) and re-check.
    Record {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        activity: ActivityKind,
    },
    /// Show the top users.
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only users holding an achievement in this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Show level progress and achievement statistics for one user.
    Level {
        #[arg(long)]
        user: i64,
    },
    /// List a user's notifications, newest first.
    Notifications {
        #[arg(long)]
        user: i64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        unread: bool,
        /// Mark this notification read before listing.
        #[arg(long)]
        mark_read: Option<i64>,
    },
    /// List definitions whose requirements cannot be evaluated.
    Audit,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => merit_config::load_and_validate_path(path),
        None => merit_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            merit_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.log_level);

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("merit: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: MeritConfig) -> Result<(), MeritError> {
    let out = Output::detect(cli.json, cli.plain);
    let engine = open_engine(&config, cli.activity_db.as_ref()).await?;

    match cli.command {
        Commands::Backfill { users } => batch::run_backfill(&engine, &users, &out).await,
        Commands::Check { user } => award::run_check(&engine, UserId(user), &out).await,
        Commands::Award { user, slug, badge } => {
            award::run_award(&engine, UserId(user), &slug, badge, &out).await
        }
        Commands::Record { user, activity } => {
            award::run_record(&engine, UserId(user), activity, &out).await
        }
        Commands::Leaderboard { limit, category } => {
            report::run_leaderboard(&engine, limit, category.as_deref(), &out).await
        }
        Commands::Level { user } => report::run_level(&engine, UserId(user), &out).await,
        Commands::Notifications {
            user,
            limit,
            unread,
            mark_read,
        } => {
            report::run_notifications(&engine, UserId(user), limit, unread, mark_read, &out).await
        }
        Commands::Audit => report::run_audit(&engine, &out).await,
    }
}

/// Open the engine database and wire the SQLite activity source.
async fn open_engine(
    config: &MeritConfig,
    activity_db: Option<&PathBuf>,
) -> Result<Engine, MeritError> {
    let db = Arc::new(Database::open_with(&config.storage).await?);
    let source: Arc<dyn ActivitySource> = match activity_db {
        Some(path) => {
            // Opening a missing path would create an empty database.
            if !path.is_file() {
                return Err(MeritError::Config(format!(
                    "activity database {} does not exist",
                    path.display()
                )));
            }
            let conn = tokio_rusqlite::Connection::open(path)
                .await
                .map_err(MeritError::storage)?;
            Arc::new(SqliteActivitySource::new(conn))
        }
        None => Arc::new(SqliteActivitySource::from_database(&db)),
    };
    tracing::debug!(source = source.name(), "activity source ready");
    Ok(Engine::new(db, source, config))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("merit={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_award_with_global_flags() {
        let cli = Cli::parse_from(["merit", "award", "--user", "7", "--slug", "first-steps", "--json"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Award { user: 7, ref slug, badge: false } if slug == "first-steps"
        ));
        let cli = Cli::parse_from(["merit", "award", "--user", "7", "--slug", "veteran", "--badge"]);
        assert!(matches!(cli.command, Commands::Award { badge: true, .. }));
    }

    #[test]
    fn parses_activity_kind() {
        let cli = Cli::parse_from(["merit", "record", "--user", "1", "--activity", "wiki_edit"]);
        assert!(matches!(
            cli.command,
            Commands::Record { activity: ActivityKind::WikiEdit, .. }
        ));
    }

    #[test]
    fn backfill_accepts_repeated_users() {
        let cli = Cli::parse_from(["merit", "backfill", "--user", "1", "--user", "2"]);
        assert!(matches!(cli.command, Commands::Backfill { ref users } if users == &[1, 2]));
    }

    #[tokio::test]
    async fn missing_activity_db_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MeritConfig::default();
        config.storage.database_path = dir.path().join("merit.db").display().to_string();
        let missing = dir.path().join("host.db");

        let Err(err) = open_engine(&config, Some(&missing)).await else {
            panic!("expected open_engine to fail");
        };
        assert!(matches!(err, MeritError::Config(ref msg) if msg.contains("host.db")));
        assert!(!missing.exists());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = merit_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.levels.base_xp, 100);
    }
}

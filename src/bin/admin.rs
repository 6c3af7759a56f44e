//! CLI administration tool for tny-shortener.
//!
//! Provides database maintenance, statistics and on-demand sweeps without
//! going through the HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Apply the schema (idempotent)
//! cargo run --bin admin -- db init
//!
//! # View statistics
//! cargo run --bin admin -- stats --top 20
//!
//! # Preview what a sweep would change
//! cargo run --bin admin -- sweep
//!
//! # Apply a sweep without the confirmation prompt
//! cargo run --bin admin -- sweep --apply --yes
//! ```
//!
//! # Environment Variables
//!
//! Read from the same layered sources as the server (`.env`,
//! `.env.{APP_ENV}`, process environment). `DATABASE_URL` (or the `DB_*`
//! components) is required.

use tny_shortener::application::services::{CleanupOptions, SweepError, Sweeper};
use tny_shortener::config::{self, Config};
use tny_shortener::logging;
use tny_shortener::domain::repositories::CodeStore;
use tny_shortener::infrastructure::persistence::PgCodeStore;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// CLI tool for managing tny-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Show record statistics
    Stats {
        /// Number of most accessed codes to list
        #[arg(long, default_value_t = 10)]
        top: i64,
    },

    /// Run one lifecycle sweep now
    Sweep {
        /// Apply fixes and deletions instead of only reporting them
        #[arg(long)]
        apply: bool,

        /// Skip the confirmation prompt when applying
        #[arg(long, short)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Create or upgrade the schema
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load().context("Failed to load configuration")?;

    let level = match cli.command {
        Commands::Sweep { .. } => logging::with_sweep_decisions(&config.log_level),
        _ => config.log_level.clone(),
    };
    logging::init_tracing(&level, &config.log_format);

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(PgCodeStore::new(Arc::new(pool.clone())));

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &pool, store.as_ref()).await?,
        Commands::Stats { top } => handle_stats(store.as_ref(), top).await?,
        Commands::Sweep { apply, yes } => handle_sweep(&config, store, apply, yes).await?,
    }

    Ok(())
}

/// Handles database maintenance commands.
async fn handle_db_action(action: DbAction, pool: &PgPool, store: &PgCodeStore) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  PostgreSQL: {}", version.bright_white());
        }
        DbAction::Init => {
            println!("{}", "🛠  Initializing schema...".bright_blue());

            store
                .initialize_schema()
                .await
                .context("Failed to initialize schema")?;

            println!("{}", "✅ Schema is up to date".green().bold());
        }
    }

    Ok(())
}

/// Displays record count and the most accessed codes.
async fn handle_stats(store: &PgCodeStore, top: i64) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let total = store.count().await?;
    println!("  Records: {}", total.to_string().bright_green().bold());
    println!();

    let records = store.top_accessed(top.max(0)).await?;
    if records.is_empty() {
        return Ok(());
    }

    println!("{}", format!("  Top {} by access count", records.len()).bold());
    for record in records {
        println!(
            "  {:<8} {:>8}  {}",
            record.code.cyan(),
            record.access_count.to_string().bright_green(),
            record.long_url.bright_black()
        );
    }
    println!();

    Ok(())
}

/// Runs one sweep with the configured policy.
///
/// Dry-run unless `apply` is set. Ctrl-C cancels between records. Each fix
/// and deletion decision is logged as it is made.
async fn handle_sweep(
    config: &Config,
    store: Arc<PgCodeStore>,
    apply: bool,
    yes: bool,
) -> Result<()> {
    let options = CleanupOptions {
        log_only: !apply,
        ..config.cleanup_options()?
    };

    println!("{}", "🧹 Lifecycle sweep".bright_blue().bold());
    println!(
        "  Mode:         {}",
        if apply {
            "apply".red().bold()
        } else {
            "dry run".yellow().bold()
        }
    );
    println!("  Self domains: {}", options.policy.self_domains.join(", "));
    println!(
        "  Stale after:  {} days with at most {} views",
        options.policy.max_age.num_days(),
        options.policy.max_access_count
    );
    println!();

    if apply && !yes {
        let confirmed = Confirm::new()
            .with_prompt("Fix and delete records in the database?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let (_options_tx, options_rx) = watch::channel(options.clone());
    let sweeper = Sweeper::new(store, options_rx, cancel);

    let report = match sweeper.sweep(&options).await {
        Ok(report) => report,
        Err(SweepError::Cancelled { report }) => {
            println!("{}", "⚠️  Sweep interrupted".yellow());
            report
        }
        Err(e) => return Err(e).context("Sweep failed"),
    };

    println!("  Scanned: {}", report.scanned.to_string().bright_white());
    println!(
        "  Fixed:   {} ({} saved)",
        report.fixed.to_string().bright_green(),
        report.updated
    );
    println!(
        "  Garbage: {} ({} deleted)",
        report.garbage.to_string().bright_green(),
        report.deleted
    );
    if report.failed > 0 {
        println!("  Failed:  {}", report.failed.to_string().red().bold());
    }
    println!();

    if apply {
        println!("{}", "✅ Sweep applied".green().bold());
    } else {
        println!(
            "{}",
            "ℹ️  Dry run, nothing was changed. Re-run with --apply to commit.".bright_black()
        );
    }

    Ok(())
}

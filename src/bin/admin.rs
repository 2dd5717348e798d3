//! CLI administration tool for link-audit.
//!
//! Runs the audit pipeline and its maintenance chores from a terminal, using
//! the same configuration and storage as the server.
//!
//! # Usage
//!
//! ```bash
//! # List every link found in the source tree
//! cargo run --bin admin -- scan
//!
//! # Check specific URLs, or the whole tree when none are given
//! cargo run --bin admin -- validate https://example.com/pricing /about
//!
//! # Show proposed fixes without touching any file
//! cargo run --bin admin -- suggest
//!
//! # Full maintenance run
//! cargo run --bin admin -- run --dry-run
//!
//! # Undo an applied correction
//! cargo run --bin admin -- rollback 20250101T120000Z-3f9a1c2b
//!
//! # Backup housekeeping
//! cargo run --bin admin -- backups list
//! cargo run --bin admin -- backups prune --keep 20
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; `AUDIT_ROOT` is the only one most commands need.
//! `DATABASE_URL` is required by `db` and optional elsewhere.

use link_audit::application::services::RunOptions;
use link_audit::config::{self, Config};
use link_audit::domain::entities::{AuditTrigger, LinkStatus, ValidationResult};
use link_audit::server;
use link_audit::state::AppState;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

/// CLI tool for auditing site links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// List links found in the source tree
    Scan {
        /// Only show links from files whose path contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Validate URLs (all scanned links when none are given)
    Validate {
        urls: Vec<String>,

        /// Show valid links too
        #[arg(short, long)]
        all: bool,
    },

    /// Show correction suggestions for broken links
    Suggest,

    /// Run a full maintenance pass
    Run {
        /// Suggest corrections without applying them
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Restore a file from a correction backup
    Rollback {
        /// Rollback id printed when the correction was applied
        rollback_id: String,
    },

    /// Manage correction backups
    Backups {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Backup subcommands.
#[derive(Subcommand)]
enum BackupAction {
    /// List backups, newest first
    List,

    /// Delete all but the newest backups
    Prune {
        /// Number of backups to keep (defaults to BACKUP_RETENTION)
        #[arg(short, long)]
        keep: Option<usize>,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show row counts
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &config).await?,
        command => {
            let backends = server::build_backends(&config).await?;
            let state = AppState::new(config, backends);
            match command {
                Commands::Scan { filter } => scan(&state, filter).await?,
                Commands::Validate { urls, all } => validate(&state, urls, all).await?,
                Commands::Suggest => suggest(&state).await?,
                Commands::Run { dry_run, yes } => run(&state, dry_run, yes).await?,
                Commands::Rollback { rollback_id } => rollback(&state, &rollback_id).await?,
                Commands::Backups { action } => handle_backup_action(action, &state).await?,
                Commands::Db { .. } => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}

/// Prints every scanned link as `file:line  type  url`.
async fn scan(state: &AppState, filter: Option<String>) -> Result<()> {
    println!("{}", "🔍 Scan".bright_blue().bold());
    println!("  Root: {}", state.scanner.root().display().to_string().cyan());
    println!();

    let outcome = state.scanner.scan().await?;
    let links: Vec<_> = outcome
        .links
        .iter()
        .filter(|l| filter.as_deref().is_none_or(|f| l.source_file.contains(f)))
        .collect();

    for link in &links {
        println!(
            "  {:<40} {:<9} {}",
            format!("{}:{}", link.source_file, link.source_line).bright_black(),
            link.link_type.as_str(),
            link.url.cyan()
        );
    }

    println!();
    println!(
        "  Files: {}  Links: {}",
        outcome.files_scanned.to_string().bright_white().bold(),
        links.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Validates the given URLs, or every scanned link when `urls` is empty.
async fn validate(state: &AppState, urls: Vec<String>, show_all: bool) -> Result<()> {
    println!("{}", "🌐 Validate".bright_blue().bold());
    println!();

    let batch = if urls.is_empty() {
        let outcome = state.scanner.scan().await?;
        state.validator.validate(&outcome.links, None).await
    } else {
        state.validator.validate_urls(&urls, None).await
    };

    for result in &batch.results {
        if show_all || result.status != LinkStatus::Valid {
            print_result(result);
        }
    }

    let healthy = batch
        .results
        .iter()
        .filter(|r| matches!(r.status, LinkStatus::Valid | LinkStatus::Redirect))
        .count();

    println!();
    println!(
        "  Checked: {}  Healthy: {}  Problems: {}",
        batch.results.len().to_string().bright_white().bold(),
        healthy.to_string().green().bold(),
        (batch.results.len() - healthy).to_string().red().bold()
    );
    if !batch.skipped.is_empty() {
        println!(
            "  {}",
            format!("⚠️  {} URLs were not checked", batch.skipped.len()).yellow()
        );
    }
    println!();

    Ok(())
}

/// Scans, validates and prints the suggestions for every broken or redirected link.
async fn suggest(state: &AppState) -> Result<()> {
    println!("{}", "🩹 Suggestions".bright_blue().bold());
    println!();

    let outcome = state.scanner.scan().await?;
    let batch = state.validator.validate(&outcome.links, None).await;

    let mut known = state
        .scans
        .known_good_urls()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load known URLs: {}", e))?;
    known.extend(
        batch
            .results
            .iter()
            .filter(|r| r.status == LinkStatus::Valid)
            .map(|r| r.url.clone()),
    );

    let mut count = 0;
    for result in batch.results.iter().filter(|r| r.status.needs_correction()) {
        print_result(result);
        let suggestions = state.corrector.suggest(result, &known);
        if suggestions.is_empty() {
            println!("      {}", "no suggestion".bright_black());
        }
        for suggestion in suggestions {
            count += 1;
            println!(
                "      → {} {} ({:.0}%)",
                suggestion.suggested_url.green(),
                suggestion.correction_type.as_str().bright_black(),
                suggestion.confidence * 100.0
            );
        }
    }

    println!();
    println!("  Total suggestions: {}", count.to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Runs the maintenance pipeline and prints the summary.
///
/// Applying corrections rewrites source files, so a non-dry run asks first
/// unless `--yes` is given.
async fn run(state: &AppState, dry_run: bool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🛠️  Maintenance run".bright_blue().bold());
    println!();

    let applies = state.config.auto_correct && !dry_run;
    if applies && !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Auto-correct is on and may rewrite source files. Continue?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let mut options = RunOptions::new(AuditTrigger::Manual);
    options.dry_run = dry_run;

    let report = state
        .maintenance
        .run(options)
        .await
        .map_err(|e| anyhow::anyhow!("Maintenance run failed: {}", e))?;

    let summary = &report.summary;
    println!(
        "  Run:          {}",
        report
            .id
            .map_or_else(|| "not persisted".to_string(), |id| id.to_string())
            .bright_black()
    );
    println!("  Files:        {}", summary.files_scanned);
    println!("  Links:        {}", summary.links_found);
    println!("  Unique URLs:  {}", summary.unique_urls);
    println!("  Broken:       {}", summary.broken.to_string().red().bold());
    println!("  Redirects:    {}", summary.redirects.to_string().yellow());
    println!("  Suggestions:  {}", report.suggestions.len());
    println!(
        "  Applied:      {}",
        summary.corrections_applied.to_string().green().bold()
    );
    println!("  Health:       {}", health(report.health_score));
    println!("  Duration:     {} ms", report.duration_ms);

    for correction in report.corrections.iter().filter(|c| c.applied) {
        println!(
            "    {} {} → {} ({})",
            correction.file_path.bright_black(),
            correction.original_url,
            correction.new_url.green(),
            correction.rollback_id.as_deref().unwrap_or("-").cyan()
        );
    }
    for error in &report.errors {
        println!(
            "  {} {}",
            format!("⚠️  {}:", error.phase.as_str()).yellow(),
            error.message
        );
    }
    if report.alert_sent {
        println!("  {}", "🔔 Alert sent".yellow().bold());
    }
    println!();

    Ok(())
}

async fn rollback(state: &AppState, rollback_id: &str) -> Result<()> {
    println!("{}", "⏪ Rollback".bright_blue().bold());
    println!();

    let confirmed = Confirm::new()
        .with_prompt(format!("Restore the file saved under {rollback_id}?"))
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let outcome = state
        .corrector
        .rollback(rollback_id)
        .await
        .map_err(|e| anyhow::anyhow!("Rollback failed: {}", e))?;

    println!();
    println!(
        "{} {}",
        "✅ Restored".green().bold(),
        outcome.manifest.original_path.cyan()
    );
    if !outcome.ledger_updated {
        println!(
            "{}",
            "⚠️  No correction was recorded for this id".yellow()
        );
    }
    println!();

    Ok(())
}

async fn handle_backup_action(action: BackupAction, state: &AppState) -> Result<()> {
    match action {
        BackupAction::List => list_backups(state).await,
        BackupAction::Prune { keep } => prune_backups(state, keep).await,
    }
}

async fn list_backups(state: &AppState) -> Result<()> {
    println!("{}", "📦 Backups".bright_blue().bold());
    println!();

    let backups = state
        .corrector
        .list_backups()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list backups: {}", e))?;

    if backups.is_empty() {
        println!("{}", "  No backups found".yellow());
        return Ok(());
    }

    println!(
        "  {:<28} {:<20} {:>9} {}",
        "Rollback id".bright_white().bold(),
        "Created".bright_white().bold(),
        "Bytes".bright_white().bold(),
        "File".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    for backup in &backups {
        println!(
            "  {:<28} {:<20} {:>9} {}",
            backup.rollback_id.cyan(),
            backup
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            backup.size,
            backup.original_path
        );
    }

    println!();
    println!(
        "  Total: {}",
        backups.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn prune_backups(state: &AppState, keep: Option<usize>) -> Result<()> {
    let keep = keep.unwrap_or(state.config.backup_retention);

    let confirmed = Confirm::new()
        .with_prompt(format!("Delete all but the newest {keep} backups?"))
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let removed = state
        .corrector
        .prune_backups(Some(keep))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prune backups: {}", e))?;

    println!(
        "{} {} removed",
        "✅".green(),
        removed.to_string().bright_white().bold()
    );

    Ok(())
}

async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;

    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());
            let pool = server::connect_database(config, database_url).await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            println!("{}", "✅ Database connection OK".green().bold());
            println!("{}", "✅ Migrations up to date".green().bold());
        }
        DbAction::Info => {
            let pool = server::connect_database(config, database_url).await?;
            db_info(&pool).await?;
        }
    }

    Ok(())
}

async fn db_info(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Database".bright_blue().bold());
    println!();

    for (label, table) in [
        ("Audit runs", "audit_history"),
        ("Scanned links", "scanned_links"),
        ("Validations", "validation_results"),
        ("Corrections", "applied_corrections"),
        ("Health samples", "link_health_metrics"),
    ] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await?;
        println!(
            "  {:<15} {}",
            format!("{label}:"),
            count.to_string().bright_green().bold()
        );
    }
    println!();

    Ok(())
}

fn print_result(result: &ValidationResult) {
    let status = match result.status {
        LinkStatus::Valid => "VALID".green(),
        LinkStatus::Redirect => "REDIRECT".yellow(),
        LinkStatus::Broken => "BROKEN".red(),
        LinkStatus::Timeout => "TIMEOUT".red(),
        LinkStatus::Unknown => "UNKNOWN".bright_black(),
    };
    let detail = match (&result.status_code, &result.redirect_url, &result.error) {
        (_, Some(target), _) => format!("→ {target}"),
        (_, _, Some(error)) => error.clone(),
        (Some(code), _, _) => code.to_string(),
        _ => String::new(),
    };
    println!(
        "  {:<9} {} {}",
        status,
        result.url.cyan(),
        detail.bright_black()
    );
}

fn health(score: f64) -> ColoredString {
    let text = format!("{score:.1}%");
    if score >= 95.0 {
        text.green().bold()
    } else if score >= 80.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

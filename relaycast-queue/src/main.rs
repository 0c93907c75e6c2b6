//! relaycast-queue - Inspect the relay queue
//!
//! Read-only view of the posts collected by relaycast-bot.

use clap::{Parser, Subcommand};
use librelaycast::logging::{LogFormat, LoggingConfig};
use librelaycast::messaging::truncate_chars;
use librelaycast::config::DatabaseConfig;
use librelaycast::{Database, PostStatus, QueueStats, QueuedPost, RelaycastError, Result};
use std::path::PathBuf;

const PREVIEW_CHARS: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "relaycast-queue")]
#[command(version)]
#[command(about = "Inspect the relay queue")]
#[command(long_about = "\
relaycast-queue - Inspect the relay queue

DESCRIPTION:
    relaycast-queue shows what relaycast-bot has collected and what it has
    already published. It opens the queue read-only and never creates or
    modifies it. Only the [database] section of the config is read, so no
    bot token or API key is needed.

COMMANDS:
    list    List queued posts, oldest first
    stats   Show pending and sent counts

USAGE EXAMPLES:
    # Everything still waiting to be published
    relaycast-queue list --status new

    # Last run's output as JSON
    relaycast-queue list --format json --limit 20

    # Counts
    relaycast-queue stats

CONFIGURATION:
    Configuration file: ~/.config/relaycast/config.toml
    Database location: ~/.local/share/relaycast/x_posts.db

    Override with environment variables:
        RELAYCAST_CONFIG    - Path to config file

EXIT CODES:
    0 - Success
    1 - Operation failed (including a missing or unreadable database)
    2 - Configuration error
    3 - Invalid input (bad status or format)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List queued posts
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Only show posts with this status (new or sent)
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of posts to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::new(LogFormat::Text, "error".to_string(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Validate arguments before touching the filesystem
    match &cli.command {
        Commands::List { format, status, .. } => {
            validate_format(format)?;
            status.as_deref().map(parse_status).transpose()?;
        }
        Commands::Stats { format } => validate_format(format)?,
    }

    let store = match &cli.config {
        Some(path) => DatabaseConfig::load_from_path(path)?,
        None => DatabaseConfig::load()?,
    };
    let db = Database::open_read_only(&store.path).await?;

    match cli.command {
        Commands::List {
            format,
            status,
            limit,
        } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            cmd_list(&db, &format, status, limit).await?;
        }
        Commands::Stats { format } => {
            cmd_stats(&db, &format).await?;
        }
    }

    Ok(())
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(RelaycastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn parse_status(status: &str) -> Result<PostStatus> {
    status.parse().map_err(RelaycastError::InvalidInput)
}

/// List queued posts
async fn cmd_list(
    db: &Database,
    format: &str,
    status: Option<PostStatus>,
    limit: usize,
) -> Result<()> {
    let posts = db.list_posts(status, limit).await?;

    if format == "json" {
        output_list_json(&posts)?;
    } else {
        output_list_text(&posts);
    }

    Ok(())
}

fn output_list_json(posts: &[QueuedPost]) -> Result<()> {
    let json = serde_json::to_string_pretty(posts)
        .map_err(|e| RelaycastError::InvalidInput(format!("Failed to encode output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn output_list_text(posts: &[QueuedPost]) {
    for post in posts {
        println!(
            "{} | {} | {} | {} | {}",
            post.id,
            post.account,
            post.status,
            post.created_at,
            preview(&post.text)
        );
    }
}

/// Single-line preview of post text
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = truncate_chars(&flat, PREVIEW_CHARS);
    if cut.len() < flat.len() {
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Show queue statistics
async fn cmd_stats(db: &Database, format: &str) -> Result<()> {
    let stats = db.stats().await?;

    if format == "json" {
        output_stats_json(&stats)?;
    } else {
        output_stats_text(&stats);
    }

    Ok(())
}

fn output_stats_json(stats: &QueueStats) -> Result<()> {
    let json = serde_json::json!({
        "pending": stats.pending,
        "sent": stats.sent,
        "total": stats.total(),
    });
    let out = serde_json::to_string_pretty(&json)
        .map_err(|e| RelaycastError::InvalidInput(format!("Failed to encode output: {}", e)))?;
    println!("{}", out);
    Ok(())
}

fn output_stats_text(stats: &QueueStats) {
    println!("Queue statistics:");
    println!("  Pending: {}", stats.pending);
    println!("  Sent:    {}", stats.sent);
    println!("  Total:   {}", stats.total());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("line one\n\nline   two"), "line one line two");

        let long = "Срочно ".repeat(20);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_validate_format() {
        assert!(validate_format("text").is_ok());
        assert!(validate_format("json").is_ok());
        assert_eq!(validate_format("yaml").unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("new").unwrap(), PostStatus::New);
        assert_eq!(parse_status("sent").unwrap(), PostStatus::Sent);
        assert!(matches!(
            parse_status("failed"),
            Err(RelaycastError::InvalidInput(_))
        ));
    }
}

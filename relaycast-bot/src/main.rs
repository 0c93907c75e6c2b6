//! relaycast-bot - X to Telegram relay
//!
//! Runs one collection pass over the configured accounts, then waits for the
//! admin's `/start` command and publishes queued posts on a fixed interval.

use clap::Parser;
use librelaycast::collector::BrowserlessBrowser;
use librelaycast::logging::{LogFormat, LoggingConfig};
use librelaycast::{
    Bot, Collector, Config, CycleOutcome, Database, OpenRouterTranslator, Publisher, Result,
    Scheduler, TelegramClient,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "relaycast-bot")]
#[command(version)]
#[command(about = "Relay X posts into a Telegram channel, translated")]
#[command(long_about = "\
relaycast-bot - Relay X posts into a Telegram channel

DESCRIPTION:
    On startup relaycast-bot renders each configured X profile, extracts
    the visible posts and queues the ones it has not seen before. It then
    listens for Telegram commands from the configured admin.

    After the admin sends /start, one queued post is translated and
    published to the channel every post_interval seconds, oldest first.

COMMANDS (Telegram, admin only):
    /start   Start the publishing loop
    /status  Show pending and sent counts

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current cycle)

CONFIGURATION:
    Configuration file: ~/.config/relaycast/config.toml
    Database location: ~/.local/share/relaycast/x_posts.db

    Override with environment variables:
        RELAYCAST_CONFIG      - Path to config file
        TELEGRAM_BOT_TOKEN    - Bot token
        OPENROUTER_API_KEY    - Translation API key

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log output format: text, json or pretty
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Do not scrape profiles on startup
    #[arg(long)]
    skip_collect: bool,

    /// Collect, run a single publishing cycle and exit
    #[arg(long, hide = true)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.log_format, cli.verbose).init();

    if let Err(e) = run(cli).await {
        error!(error = %e, "relaycast-bot failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let db = Database::new(&config.database.path).await?;

    info!("relaycast-bot starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    if cli.skip_collect {
        info!("Skipping collection pass");
    } else {
        let browser = BrowserlessBrowser::new(&config.collector)?;
        let collector = Collector::new(Arc::new(browser), &config.collector)
            .with_shutdown(shutdown.clone());
        let summary = collector.collect_all(&config.collector.accounts, &db).await?;
        info!(
            accounts = summary.accounts,
            scraped = summary.scraped,
            inserted = summary.inserted,
            "Collection pass finished"
        );
    }

    if shutdown.load(Ordering::Relaxed) {
        info!("relaycast-bot stopped during startup");
        return Ok(());
    }

    let client = Arc::new(TelegramClient::new(&config.telegram)?);
    let translator = Arc::new(OpenRouterTranslator::new(&config.translator)?);
    let publisher = Publisher::new(
        db,
        translator,
        client.clone(),
        config.telegram.channel_id,
    );

    if cli.once {
        let outcome = publisher.run_cycle().await?;
        if let CycleOutcome::DeliveryFailed { id } = outcome {
            info!(id, "Post left pending after failed delivery");
        }
        info!("relaycast-bot: ran one publishing cycle, exiting");
        return Ok(());
    }

    let scheduler = Arc::new(Scheduler::new(shutdown.clone()));
    let bot = Bot::new(
        client,
        config.telegram.admin_id,
        publisher,
        scheduler.clone(),
        config.post_interval(),
        shutdown,
    );

    bot.run().await?;
    scheduler.join().await;

    info!("relaycast-bot stopped");
    Ok(())
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        librelaycast::RelaycastError::InvalidInput(format!("Signal setup failed: {}", e))
    })?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!(signal = sig, "Received shutdown signal, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });
    Ok(())
}

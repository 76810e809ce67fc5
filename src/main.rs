//! # Semiconductor Daily Digest
//!
//! Collects semiconductor industry news from the last 24 hours, groups it by
//! topic and delivers it as a single email once a day.
//!
//! ## Usage
//!
//! ```sh
//! # Print the digest now
//! semiconductor_digest --run-once --dry-run
//!
//! # Send every day at 08:00 America/Los_Angeles
//! SMTP_HOST=smtp.example.com SMTP_USER=... SMTP_PASSWORD=... \
//!   EMAIL_RECIPIENT=me@example.com semiconductor_digest
//! ```
//!
//! ## Architecture
//!
//! 1. **Search**: run every topic query against Google News RSS
//! 2. **Filter**: keep items inside the lookback window, dedupe by link
//! 3. **Render**: plain text and HTML grouped by topic
//! 4. **Deliver**: print (dry run) or send over SMTP
//!
//! The trigger is either immediate (`--run-once`, also used by the CI cron
//! workflow) or an in-process daily loop.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod digest;
mod job;
mod mailer;
mod models;
mod outputs;
mod scheduler;
mod sources;
mod topics;
mod utils;

use chrono::Utc;
use cli::Cli;
use job::DigestJob;
use mailer::SmtpMailer;
use sources::google_news::GoogleNewsSource;
use sources::retry::RetryingSource;
use topics::TopicCatalog;
use utils::ensure_writable_dir;

const SEARCH_RETRIES: usize = 3;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    // Logs go to stderr so a dry run's stdout carries only the digest.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "semiconductor_digest starting up");

    let args = Cli::parse();
    debug!(
        run_once = args.run_once,
        dry_run = args.dry_run,
        max_articles = args.max_articles,
        lookback_hours = args.lookback_hours,
        timezone = %args.timezone,
        "Parsed CLI arguments"
    );

    let catalog = match &args.topics {
        Some(path) => TopicCatalog::from_yaml_file(path)?,
        None => TopicCatalog::default(),
    };

    let smtp = args.smtp_settings();
    if !args.dry_run {
        // Fail at startup rather than after a full day's wait.
        if let Err(e) = smtp.validate() {
            error!(error = %e, "SMTP configuration incomplete");
            return Err(e);
        }
    }

    if let Some(dir) = &args.archive_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Archive directory is not writable");
            return Err(e);
        }
    }

    let source = RetryingSource::new(GoogleNewsSource::new()?, SEARCH_RETRIES, Duration::from_secs(1));
    let job = DigestJob::new(source, SmtpMailer::new(smtp), catalog, args.job_options());

    if args.run_once {
        let report = job.run(Utc::now(), &mut std::io::stdout()).await?;
        let elapsed = start_time.elapsed();
        info!(
            articles = report.article_count,
            delivery = ?report.delivery,
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Execution complete"
        );
        return Ok(());
    }

    scheduler::run_scheduler(&job, args.run_at).await;
    Ok(())
}

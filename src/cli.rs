//! Command-line interface definitions.
//!
//! Every option except the mode switches can also be supplied through an
//! environment variable, which is how the SMTP credentials are normally
//! provided (e.g. as CI secrets).

use crate::digest::CollectOptions;
use crate::job::JobOptions;
use crate::mailer::SmtpSettings;
use chrono::NaiveTime;
use chrono_tz::Tz;
use clap::Parser;
use std::path::PathBuf;

/// Send a daily summary of semiconductor industry news by email.
///
/// # Examples
///
/// ```sh
/// # Print today's digest without sending anything
/// semiconductor_digest --run-once --dry-run
///
/// # Send once now (SMTP_* and EMAIL_* taken from the environment)
/// semiconductor_digest --run-once
///
/// # Stay resident and send every day at 08:00 Los Angeles time
/// semiconductor_digest
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run immediately and exit instead of waiting for the daily trigger
    #[arg(long)]
    pub run_once: bool,

    /// Fetch and print the summary without sending email
    #[arg(long)]
    pub dry_run: bool,

    /// Cap total articles in the digest
    #[arg(long, env = "DIGEST_MAX_ARTICLES", default_value_t = 60)]
    pub max_articles: usize,

    /// Only include articles published within this many hours (1 to 8760)
    #[arg(long, env = "DIGEST_LOOKBACK_HOURS", default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..=8760))]
    pub lookback_hours: u32,

    /// Local time of the daily run (HH:MM)
    #[arg(long, env = "DIGEST_RUN_AT", default_value = "08:00", value_parser = parse_run_at)]
    pub run_at: NaiveTime,

    /// IANA time zone for the daily run and displayed timestamps
    #[arg(long, env = "DIGEST_TIMEZONE", default_value = "America/Los_Angeles", value_parser = parse_timezone)]
    pub timezone: Tz,

    /// YAML topic catalog replacing the built-in one
    #[arg(long, env = "DIGEST_TOPICS")]
    pub topics: Option<PathBuf>,

    /// Drop articles that never mention a sector term or tracked company
    #[arg(long)]
    pub strict_topics: bool,

    /// Produce no output at all when no article matched
    #[arg(long)]
    pub skip_empty: bool,

    /// Directory to archive each digest as JSON
    #[arg(long, env = "DIGEST_ARCHIVE_DIR")]
    pub archive_dir: Option<String>,

    /// SMTP relay host
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP port (STARTTLS)
    #[arg(long, env = "SMTP_PORT", default_value_t = crate::mailer::DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    /// SMTP login user
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP login password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// From address; defaults to the SMTP user
    #[arg(long, env = "EMAIL_SENDER")]
    pub email_sender: Option<String>,

    /// Recipient of the digest
    #[arg(long, env = "EMAIL_RECIPIENT")]
    pub email_recipient: Option<String>,
}

impl Cli {
    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            user: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
            sender: self.email_sender.clone(),
            recipient: self.email_recipient.clone(),
        }
    }

    pub fn job_options(&self) -> JobOptions {
        JobOptions {
            collect: CollectOptions {
                lookback_hours: self.lookback_hours,
                max_articles: self.max_articles,
                strict_topics: self.strict_topics,
            },
            dry_run: self.dry_run,
            skip_empty: self.skip_empty,
            timezone: self.timezone,
            archive_dir: self.archive_dir.clone(),
        }
    }
}

fn parse_run_at(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{}', expected HH:MM", s))
}

fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>()
        .map_err(|_| format!("unknown time zone '{}'", s))
}

//! One digest run: collect, render, then print or send.
//!
//! [`DigestJob`] owns a news source, a mailer and the run options. Each call
//! to [`DigestJob::run`] is independent; nothing is carried between runs.
//!
//! | Mode | Output | Mailer |
//! |------|--------|--------|
//! | dry-run | text body written to `out` | never called |
//! | send | one log line | called exactly once |
//! | `skip_empty` with zero articles | nothing | never called |

use crate::digest::{CollectOptions, collect};
use crate::mailer::{Mailer, OutgoingEmail};
use crate::outputs::{html, json, subject, text};
use crate::sources::NewsSource;
use crate::topics::TopicCatalog;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::error::Error;
use std::io::Write;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct JobOptions {
    pub collect: CollectOptions,
    pub dry_run: bool,
    /// Produce no output at all when nothing matched.
    pub skip_empty: bool,
    /// Zone used for the subject date and all displayed timestamps.
    pub timezone: Tz,
    pub archive_dir: Option<String>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            collect: CollectOptions::default(),
            dry_run: false,
            skip_empty: false,
            timezone: chrono_tz::America::Los_Angeles,
            archive_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Printed,
    Sent,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub article_count: usize,
    pub delivery: Delivery,
}

#[derive(Debug)]
pub struct DigestJob<S, M> {
    source: S,
    mailer: M,
    catalog: TopicCatalog,
    options: JobOptions,
}

impl<S, M> DigestJob<S, M>
where
    S: NewsSource,
    M: Mailer,
{
    pub fn new(source: S, mailer: M, catalog: TopicCatalog, options: JobOptions) -> Self {
        Self {
            source,
            mailer,
            catalog,
            options,
        }
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Run the digest once as of `now`.
    ///
    /// # Errors
    ///
    /// Archive failures, write failures on `out` and mail delivery failures
    /// are returned to the caller. Failed searches are not errors.
    #[instrument(level = "info", skip_all, fields(dry_run = self.options.dry_run))]
    pub async fn run<W: Write>(&self, now: DateTime<Utc>, out: &mut W) -> Result<RunReport, Box<dyn Error>> {
        let tz = self.options.timezone;
        let summary = collect(&self.source, &self.catalog, &self.options.collect, now).await?;
        let article_count = summary.len();
        debug!(window_start = %summary.window_start(), articles = article_count, "Digest assembled");

        if summary.is_empty() && self.options.skip_empty {
            info!("No articles matched; skipping output");
            return Ok(RunReport {
                article_count,
                delivery: Delivery::Skipped,
            });
        }

        if let Some(dir) = &self.options.archive_dir {
            json::write_archive(&summary, dir, tz).await?;
        }

        let text_body = text::render(&summary, tz);

        if self.options.dry_run {
            writeln!(out, "{}", text_body)?;
            out.flush()?;
            info!(articles = article_count, "Printed digest (dry run)");
            return Ok(RunReport {
                article_count,
                delivery: Delivery::Printed,
            });
        }

        let email = OutgoingEmail {
            subject: subject(now, tz),
            html_body: html::render(&summary, tz),
            text_body,
        };
        self.mailer.send(&email).await?;
        info!(articles = article_count, subject = %email.subject, "Sent summary email");

        Ok(RunReport {
            article_count,
            delivery: Delivery::Sent,
        })
    }
}

//! Renderings of a [`DigestSummary`](crate::models::DigestSummary).
//!
//! # Submodules
//!
//! - [`text`]: plain-text body, printed in dry-run mode and sent as the
//!   primary email part
//! - [`html`]: HTML alternative part of the email
//! - [`json`]: optional on-disk archive of the summary
//!
//! Timestamps are shown in the configured local time zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub mod html;
pub mod json;
pub mod text;

pub const DIGEST_TITLE: &str = "Semiconductor Daily Digest";

/// Articles listed in the spotlight section.
pub const SPOTLIGHT_LIMIT: usize = 10;

/// Articles listed per topic under the detailed highlights.
pub const PER_TOPIC_LIMIT: usize = 8;

/// Email subject line, dated in the local zone.
pub fn subject(now: DateTime<Utc>, tz: Tz) -> String {
    format!("{} - {}", DIGEST_TITLE, now.with_timezone(&tz).format("%Y-%m-%d"))
}

/// `YYYY-MM-DD HH:MM ZONE` in the local zone.
pub fn local_timestamp(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string()
}

fn spotlight_heading(topics: &[String]) -> String {
    format!("{} spotlight (semiconductor companies)", topics.join(" / "))
}

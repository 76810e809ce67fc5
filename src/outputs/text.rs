//! Plain-text rendering.
//!
//! ```text
//! Semiconductor Daily Digest (2025-05-06 08:00 PDT)
//! Collected 12 article(s) from the last 24 hours.
//!
//! Topline by category:
//! - Strategy: 3 article(s)
//! ...
//!
//! Earnings spotlight (semiconductor companies):
//! • Headline
//!   Source: Reuters | Published: 2025-05-06 07:12 PDT
//!   Link: https://...
//!
//! Detailed highlights:
//!
//! Strategy
//! --------
//! • Headline
//! ...
//! ```

use super::{DIGEST_TITLE, PER_TOPIC_LIMIT, SPOTLIGHT_LIMIT, local_timestamp, spotlight_heading};
use crate::models::{Article, DigestSummary};
use chrono_tz::Tz;

pub fn render(summary: &DigestSummary, tz: Tz) -> String {
    let generated = local_timestamp(summary.generated_at, tz);
    if summary.is_empty() {
        return format!(
            "{} ({})\n\nNo qualifying articles found in the last {} hours.",
            DIGEST_TITLE, generated, summary.lookback_hours
        );
    }

    let mut lines = vec![
        format!("{} ({})", DIGEST_TITLE, generated),
        format!(
            "Collected {} article(s) from the last {} hours.",
            summary.len(),
            summary.lookback_hours
        ),
        String::new(),
        "Topline by category:".to_string(),
    ];

    for topic in &summary.topics {
        lines.push(format!("- {}: {} article(s)", topic, summary.by_topic(topic).len()));
    }

    let spotlight = summary.spotlight();
    if !spotlight.is_empty() {
        lines.push(format!("\n{}:", spotlight_heading(&summary.spotlight_topics)));
        for article in spotlight.into_iter().take(SPOTLIGHT_LIMIT) {
            push_entry(&mut lines, article, tz);
        }
    }

    lines.push("\nDetailed highlights:".to_string());
    for topic in &summary.topics {
        let articles = summary.by_topic(topic);
        if articles.is_empty() {
            continue;
        }
        lines.push(format!("\n{}", topic));
        lines.push("-".repeat(topic.chars().count()));
        for article in articles.into_iter().take(PER_TOPIC_LIMIT) {
            push_entry(&mut lines, article, tz);
        }
    }

    lines.join("\n")
}

fn push_entry(lines: &mut Vec<String>, article: &Article, tz: Tz) {
    lines.push(format!("• {}", article.title));
    lines.push(format!(
        "  Source: {} | Published: {}",
        article.source,
        local_timestamp(article.published, tz)
    ));
    if !article.excerpt.is_empty() {
        lines.push(format!("  {}", article.excerpt));
    }
    lines.push(format!("  Link: {}", article.link));
}

//! Data models for collected articles and the digest built from them.
//!
//! - [`Article`]: one news item that survived window and relevance filtering
//! - [`DigestSummary`]: the ordered set of articles for a single run
//!
//! Neither type is persisted. A summary is built fresh for each run, rendered,
//! delivered (or printed) and dropped; the optional JSON archive is the only
//! place one is ever written down.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A news article collected from a feed search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The headline as published in the feed.
    pub title: String,
    /// The article link; unique within a summary.
    pub link: String,
    /// Publisher name (e.g. "Reuters").
    pub source: String,
    /// Publication timestamp, normalised to UTC.
    pub published: DateTime<Utc>,
    /// Short plain-text snippet taken from the feed description. May be empty.
    pub excerpt: String,
    /// The catalog topic whose query surfaced this article.
    pub topic: String,
}

/// The digest produced by a single run.
///
/// Articles are ordered newest first. Every article falls within
/// `lookback_hours` of `generated_at` and belongs to one of `topics`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DigestSummary {
    /// When the digest was assembled.
    pub generated_at: DateTime<Utc>,
    /// Size of the trailing window, in hours.
    pub lookback_hours: u32,
    /// Topic names in catalog order; drives grouping in every rendering.
    pub topics: Vec<String>,
    /// Topics whose queries are scoped to individual companies. These get
    /// a dedicated spotlight section ahead of the per-topic highlights.
    pub spotlight_topics: Vec<String>,
    /// Collected articles, newest first.
    pub articles: Vec<Article>,
}

impl DigestSummary {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Earliest publication time an article may have to belong to this digest.
    pub fn window_start(&self) -> DateTime<Utc> {
        self.generated_at - Duration::hours(i64::from(self.lookback_hours))
    }

    /// Articles for one topic, newest first.
    pub fn by_topic(&self, topic: &str) -> Vec<&Article> {
        self.articles.iter().filter(|a| a.topic == topic).collect()
    }

    /// Articles from all spotlight topics, newest first.
    pub fn spotlight(&self) -> Vec<&Article> {
        self.articles
            .iter()
            .filter(|a| self.spotlight_topics.iter().any(|t| *t == a.topic))
            .collect()
    }
}

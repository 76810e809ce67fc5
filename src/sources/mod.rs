//! News sources that answer keyword searches with RSS items.
//!
//! # Architecture
//!
//! - [`NewsSource`]: core trait; one search in, a list of raw feed items out
//! - [`google_news::GoogleNewsSource`]: Google News RSS search over HTTP
//! - [`retry::RetryingSource`]: decorator that adds backoff to any source
//!
//! Items come back exactly as the feed describes them. Window filtering,
//! deduplication and excerpt cleanup happen later in [`crate::digest`].

use serde::Deserialize;
use std::error::Error;

pub mod google_news;
pub mod retry;

/// A search backend for news articles.
pub trait NewsSource {
    /// Run one search query and return the raw feed items it produced.
    async fn search(&self, query: &str) -> Result<Vec<FeedItem>, Box<dyn Error>>;
}

/// One `<item>` of an RSS 2.0 feed. Every field is optional in practice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    /// RFC 2822 timestamp, e.g. `Tue, 06 May 2025 14:30:00 GMT`.
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    /// Usually an HTML fragment.
    pub description: Option<String>,
    pub source: Option<FeedSource>,
}

/// The `<source url="…">Publisher</source>` element Google News attaches to
/// each item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedSource {
    #[serde(rename = "@url")]
    pub url: Option<String>,
    #[serde(rename = "$text")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

/// Parse an RSS 2.0 document into its items.
///
/// # Errors
///
/// Returns an error if the body is not well-formed XML or has no `<channel>`.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, Box<dyn Error>> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss.channel.items)
}

//! Google News RSS search.
//!
//! Each query is sent to the public search feed:
//!
//! ```text
//! https://news.google.com/rss/search?q={query}&hl=en-US&gl=US&ceid=US:en
//! ```
//!
//! Item links point at `news.google.com` redirects; the publisher is carried
//! in the `<source>` element instead.

use super::{FeedItem, NewsSource, parse_feed};
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const GOOGLE_NEWS_SEARCH: &str = "https://news.google.com/rss/search";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// How much of an unexpected response body ends up in the logs.
const LOG_BODY_LIMIT: usize = 300;

#[derive(Debug, Clone)]
pub struct GoogleNewsSource {
    client: Client,
    base_url: String,
}

impl GoogleNewsSource {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::with_base_url(GOOGLE_NEWS_SEARCH)
    }

    /// Point the source at a different search endpoint, e.g. a caching mirror.
    pub fn with_base_url(base_url: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&hl=en-US&gl=US&ceid=US:en",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

impl NewsSource for GoogleNewsSource {
    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<FeedItem>, Box<dyn Error>> {
        let url = self.search_url(query);
        debug!(%url, "Requesting feed");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let items = feed_items(status, &body)?;
        info!(count = items.len(), bytes = body.len(), "Fetched feed");
        Ok(items)
    }
}

/// Turn a search response into feed items, logging a trimmed copy of any
/// body that is not a usable feed.
fn feed_items(status: StatusCode, body: &str) -> Result<Vec<FeedItem>, Box<dyn Error>> {
    if !status.is_success() {
        warn!(%status, body = %truncate_for_log(body, LOG_BODY_LIMIT), "Search request rejected");
        return Err(format!("news search returned HTTP {}", status).into());
    }
    parse_feed(body).inspect_err(|e| {
        warn!(error = %e, body = %truncate_for_log(body, LOG_BODY_LIMIT), "Response is not an RSS feed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let source = GoogleNewsSource::new().unwrap();
        let url = source.search_url("(\"chip industry\") new product when:1d");
        assert_eq!(
            url,
            "https://news.google.com/rss/search?q=%28%22chip%20industry%22%29%20new%20product%20when%3A1d&hl=en-US&gl=US&ceid=US:en"
        );
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let source = GoogleNewsSource::with_base_url("http://127.0.0.1:9000/rss/").unwrap();
        assert!(source.search_url("x").starts_with("http://127.0.0.1:9000/rss?q=x&"));
    }

    #[test]
    fn test_feed_items_rejects_error_status() {
        let body = "<html>".to_string() + &"unusual traffic ".repeat(100) + "</html>";
        let err = feed_items(StatusCode::TOO_MANY_REQUESTS, &body).unwrap_err();
        assert_eq!(err.to_string(), "news search returned HTTP 429 Too Many Requests");
    }

    #[test]
    fn test_feed_items_parses_success() {
        let body = "<rss version=\"2.0\"><channel><item><title>Chip news</title></item></channel></rss>";
        let items = feed_items(StatusCode::OK, body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("Chip news"));

        assert!(feed_items(StatusCode::OK, "<html><body>captcha</body></html>").is_err());
    }
}

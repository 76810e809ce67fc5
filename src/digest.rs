//! Article collection: search, window filtering and deduplication.
//!
//! [`collect`] runs every catalog query in order against a [`NewsSource`],
//! turns the returned feed items into [`Article`]s and assembles the
//! [`DigestSummary`] for one run:
//!
//! 1. Failed searches are logged and skipped; the run carries on.
//! 2. Items without a link, with an unparsable `pubDate`, or published before
//!    the window start are dropped.
//! 3. In strict mode, items that never mention a sector term or tracked
//!    company in their title or excerpt are dropped.
//! 4. The first occurrence of each link wins (earlier topics take priority).
//! 5. Articles are sorted newest first and capped at `max_articles`.

use crate::models::{Article, DigestSummary};
use crate::sources::{FeedItem, NewsSource};
use crate::topics::TopicCatalog;
use crate::utils::{domain_tag, excerpt, strip_markup};
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub lookback_hours: u32,
    pub max_articles: usize,
    /// Apply the catalog's keyword relevance filter on top of the search.
    pub strict_topics: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            max_articles: 60,
            strict_topics: false,
        }
    }
}

/// Collect the articles for one digest.
///
/// # Errors
///
/// Individual search failures never fail the run. An error is only returned
/// when the lookback window reaches outside the representable date range or
/// the catalog's relevance filter cannot be compiled.
#[instrument(level = "info", skip_all, fields(lookback_hours = options.lookback_hours, max_articles = options.max_articles))]
pub async fn collect<S: NewsSource>(
    source: &S,
    catalog: &TopicCatalog,
    options: &CollectOptions,
    now: DateTime<Utc>,
) -> Result<DigestSummary, Box<dyn Error>> {
    let cutoff = Duration::try_hours(i64::from(options.lookback_hours))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| format!("lookback of {} hours is out of range", options.lookback_hours))?;
    let relevance = if options.strict_topics {
        Some(catalog.relevance_filter()?)
    } else {
        None
    };

    let queries = catalog.queries();
    let total_queries = queries.len();
    info!(queries = total_queries, %cutoff, "Searching news source");

    let batches: Vec<(String, Vec<FeedItem>)> = stream::iter(queries)
        .then(move |q| async move {
            match source.search(&q.query).await {
                Ok(items) => {
                    debug!(topic = %q.topic, query = %q.query, count = items.len(), "Search returned");
                    Some((q.topic, items))
                }
                Err(e) => {
                    warn!(topic = %q.topic, query = %q.query, error = %e, "Search failed; skipping query");
                    None
                }
            }
        })
        .filter_map(|batch| std::future::ready(batch))
        .collect()
        .await;

    let answered = batches.len();
    let raw_items: usize = batches.iter().map(|(_, items)| items.len()).sum();

    let mut articles: Vec<Article> = batches
        .into_iter()
        .flat_map(|(topic, items)| items.into_iter().map(move |item| (topic.clone(), item)))
        .filter_map(|(topic, item)| to_article(topic, item, cutoff))
        .filter(|article| match &relevance {
            Some(re) => re.is_match(&article.title) || re.is_match(&article.excerpt),
            None => true,
        })
        .unique_by(|article| article.link.clone())
        .collect();

    articles.sort_by(|a, b| b.published.cmp(&a.published));
    let matched = articles.len();
    articles.truncate(options.max_articles);

    info!(
        queries = total_queries,
        failed_queries = total_queries - answered,
        raw_items,
        matched,
        kept = articles.len(),
        "Collected articles"
    );

    Ok(DigestSummary {
        generated_at: now,
        lookback_hours: options.lookback_hours,
        topics: catalog.topic_names(),
        spotlight_topics: catalog.spotlight_topics(),
        articles,
    })
}

/// Convert a feed item into an article, or `None` if it has no link, no
/// usable timestamp, or falls before `cutoff`.
fn to_article(topic: String, item: FeedItem, cutoff: DateTime<Utc>) -> Option<Article> {
    let link = non_empty(item.link.as_deref())?.to_string();
    let published = parse_pub_date(item.pub_date.as_deref()?)?;
    if published < cutoff {
        return None;
    }

    let title = non_empty(item.title.as_deref()).unwrap_or("(no title)").to_string();
    let source = item
        .source
        .as_ref()
        .and_then(|s| {
            non_empty(s.name.as_deref())
                .map(str::to_string)
                .or_else(|| s.url.as_deref().and_then(domain_tag))
        })
        .unwrap_or_else(|| "Unknown".to_string());
    let excerpt = item
        .description
        .as_deref()
        .map(|d| clean_excerpt(d, &title, &source))
        .unwrap_or_default();

    Some(Article {
        title,
        link,
        source,
        published,
        excerpt,
        topic,
    })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an RFC 2822 `pubDate` into UTC.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Turn a feed description into a short plain-text excerpt.
///
/// Google News descriptions repeat the headline followed by the publisher;
/// those carry nothing beyond the title and yield an empty excerpt.
fn clean_excerpt(description: &str, title: &str, source: &str) -> String {
    let plain = strip_markup(description);
    let body = plain
        .strip_suffix(source)
        .map(str::trim_end)
        .unwrap_or(&plain);
    if body.is_empty() || title.starts_with(body) {
        return String::new();
    }
    excerpt(body, EXCERPT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FeedSource;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned items keyed by query; unknown queries return nothing,
    /// queries listed in `failing` return an error.
    #[derive(Default)]
    struct FakeSource {
        responses: HashMap<String, Vec<FeedItem>>,
        failing: Vec<String>,
        calls: AtomicUsize,
    }

    impl NewsSource for FakeSource {
        async fn search(&self, query: &str) -> Result<Vec<FeedItem>, Box<dyn Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|q| q == query) {
                return Err("503 Service Unavailable".into());
            }
            Ok(self.responses.get(query).cloned().unwrap_or_default())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 16, 0, 0).unwrap()
    }

    fn item(title: &str, link: &str, pub_date: &str) -> FeedItem {
        FeedItem {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            pub_date: Some(pub_date.to_string()),
            description: None,
            source: Some(FeedSource {
                url: Some("https://www.reuters.com".to_string()),
                name: Some("Reuters".to_string()),
            }),
        }
    }

    fn catalog() -> TopicCatalog {
        TopicCatalog::from_yaml_str(
            r#"
sector_terms: ["semiconductor"]
companies: ["TSMC"]
topics:
  - name: Strategy
    keywords: ["roadmap"]
  - name: Earnings
    keywords: ["earnings"]
    company_scoped: true
"#,
        )
        .unwrap()
    }

    const STRATEGY_Q: &str = "(\"semiconductor\") roadmap when:1d";
    const EARNINGS_Q: &str = "(\"TSMC\") earnings semiconductor when:1d";

    #[tokio::test]
    async fn test_collect_filters_window_and_sorts() {
        let mut source = FakeSource::default();
        source.responses.insert(
            STRATEGY_Q.to_string(),
            vec![
                item("old", "https://a/old", "Mon, 05 May 2025 15:59:59 GMT"),
                item("edge", "https://a/edge", "Mon, 05 May 2025 16:00:00 GMT"),
                item("fresh", "https://a/fresh", "Tue, 06 May 2025 15:00:00 GMT"),
                item("bad date", "https://a/bad", "yesterday"),
            ],
        );

        let summary = collect(&source, &catalog(), &CollectOptions::default(), now())
            .await
            .unwrap();

        let titles: Vec<_> = summary.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "edge"]);
        assert!(summary.articles.iter().all(|a| a.published >= summary.window_start()));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collect_dedupes_by_link_first_topic_wins() {
        let mut source = FakeSource::default();
        let shared = item("TSMC roadmap", "https://a/shared", "Tue, 06 May 2025 12:00:00 GMT");
        source.responses.insert(STRATEGY_Q.to_string(), vec![shared.clone()]);
        source.responses.insert(EARNINGS_Q.to_string(), vec![shared]);

        let summary = collect(&source, &catalog(), &CollectOptions::default(), now())
            .await
            .unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.articles[0].topic, "Strategy");
    }

    #[tokio::test]
    async fn test_collect_skips_failed_queries() {
        let mut source = FakeSource::default();
        source.failing.push(STRATEGY_Q.to_string());
        source.responses.insert(
            EARNINGS_Q.to_string(),
            vec![item("TSMC earnings beat", "https://a/e", "Tue, 06 May 2025 13:00:00 GMT")],
        );

        let summary = collect(&source, &catalog(), &CollectOptions::default(), now())
            .await
            .unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.articles[0].topic, "Earnings");
        assert_eq!(summary.spotlight_topics, vec!["Earnings".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_caps_at_max_articles() {
        let mut source = FakeSource::default();
        let items = (0..10)
            .map(|h| {
                item(
                    &format!("story {}", h),
                    &format!("https://a/{}", h),
                    &format!("Tue, 06 May 2025 {:02}:00:00 GMT", h),
                )
            })
            .collect();
        source.responses.insert(STRATEGY_Q.to_string(), items);

        let options = CollectOptions {
            max_articles: 3,
            ..Default::default()
        };
        let summary = collect(&source, &catalog(), &options, now()).await.unwrap();

        let titles: Vec<_> = summary.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["story 9", "story 8", "story 7"]);
    }

    #[tokio::test]
    async fn test_collect_rejects_out_of_range_lookback() {
        let source = FakeSource::default();
        let options = CollectOptions {
            lookback_hours: u32::MAX,
            ..Default::default()
        };
        let err = collect(&source, &catalog(), &options, now()).await.unwrap_err();
        assert_eq!(err.to_string(), "lookback of 4294967295 hours is out of range");
    }

    #[tokio::test]
    async fn test_collect_strict_topics_drops_unrelated() {
        let mut source = FakeSource::default();
        source.responses.insert(
            STRATEGY_Q.to_string(),
            vec![
                item("Semiconductor roadmap unveiled", "https://a/1", "Tue, 06 May 2025 12:00:00 GMT"),
                item("Celebrity roadmap to fame", "https://a/2", "Tue, 06 May 2025 12:00:00 GMT"),
            ],
        );

        let options = CollectOptions {
            strict_topics: true,
            ..Default::default()
        };
        let summary = collect(&source, &catalog(), &options, now()).await.unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.articles[0].link, "https://a/1");
    }

    #[tokio::test]
    async fn test_collect_empty_is_valid() {
        let source = FakeSource::default();
        let summary = collect(&source, &catalog(), &CollectOptions::default(), now())
            .await
            .unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.topics, vec!["Strategy".to_string(), "Earnings".to_string()]);
        assert_eq!(summary.generated_at, now());
    }

    #[test]
    fn test_to_article_defaults() {
        let raw = FeedItem {
            title: Some("   ".to_string()),
            link: Some(" https://a/x ".to_string()),
            pub_date: Some("Tue, 06 May 2025 12:00:00 GMT".to_string()),
            description: None,
            source: None,
        };
        let article = to_article("Finance".to_string(), raw, now() - Duration::hours(24)).unwrap();
        assert_eq!(article.title, "(no title)");
        assert_eq!(article.link, "https://a/x");
        assert_eq!(article.source, "Unknown");
        assert_eq!(article.excerpt, "");
    }

    #[test]
    fn test_to_article_source_from_url() {
        let mut raw = item("t", "https://a/x", "Tue, 06 May 2025 12:00:00 GMT");
        raw.source = Some(FeedSource {
            url: Some("https://www.eetimes.com".to_string()),
            name: None,
        });
        let article = to_article("Finance".to_string(), raw, now() - Duration::hours(24)).unwrap();
        assert_eq!(article.source, "eetimes");
    }

    #[test]
    fn test_to_article_requires_link() {
        let mut raw = item("t", "", "Tue, 06 May 2025 12:00:00 GMT");
        assert!(to_article("Finance".to_string(), raw.clone(), now()).is_none());
        raw.link = None;
        assert!(to_article("Finance".to_string(), raw, now()).is_none());
    }

    #[test]
    fn test_parse_pub_date() {
        assert_eq!(
            parse_pub_date("Tue, 06 May 2025 14:30:00 GMT"),
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap())
        );
        assert_eq!(
            parse_pub_date("Tue, 06 May 2025 07:30:00 -0700"),
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap())
        );
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("2025-05-06"), None);
    }

    #[test]
    fn test_clean_excerpt_drops_title_echo() {
        let description = r##"<a href="https://news.google.com/x">TSMC expands Arizona fab plans</a>&nbsp;&nbsp;<font color="#6f6f6f">Reuters</font>"##;
        assert_eq!(
            clean_excerpt(description, "TSMC expands Arizona fab plans - Reuters", "Reuters"),
            ""
        );
    }

    #[test]
    fn test_clean_excerpt_keeps_real_text() {
        let description = "<p>The foundry will add two fabs by 2028.</p>";
        assert_eq!(
            clean_excerpt(description, "TSMC expands", "Reuters"),
            "The foundry will add two fabs by 2028."
        );
    }
}

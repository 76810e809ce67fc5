//! HTML rendering for the email's alternative part.
//!
//! Mirrors the plain-text layout section for section. Every piece of feed
//! content is escaped; links are only emitted for `http(s)` URLs.

use super::{DIGEST_TITLE, PER_TOPIC_LIMIT, SPOTLIGHT_LIMIT, local_timestamp, spotlight_heading};
use crate::models::{Article, DigestSummary};
use crate::utils::escape_html;
use chrono_tz::Tz;
use std::fmt::Write;

const STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #111827; }
        .container { max-width: 680px; margin: 0 auto; }
        h1 { color: #1d4ed8; font-size: 22px; }
        h2 { font-size: 17px; border-bottom: 1px solid #e5e7eb; padding-bottom: 4px; }
        h3 { font-size: 15px; margin-bottom: 4px; }
        .entry { margin: 10px 0; }
        .meta { color: #6b7280; font-size: 12px; }
        .excerpt { font-size: 13px; margin: 2px 0; }";

pub fn render(summary: &DigestSummary, tz: Tz) -> String {
    let generated = escape_html(&local_timestamp(summary.generated_at, tz));
    let mut body = String::new();

    writeln!(body, "<h1>{} <small>({})</small></h1>", DIGEST_TITLE, generated).unwrap();

    if summary.is_empty() {
        writeln!(
            body,
            "<p>No qualifying articles found in the last {} hours.</p>",
            summary.lookback_hours
        )
        .unwrap();
        return wrap(&body);
    }

    writeln!(
        body,
        "<p>Collected {} article(s) from the last {} hours.</p>",
        summary.len(),
        summary.lookback_hours
    )
    .unwrap();

    body.push_str("<h2>Topline by category</h2>\n<ul>\n");
    for topic in &summary.topics {
        writeln!(
            body,
            "<li>{}: {} article(s)</li>",
            escape_html(topic),
            summary.by_topic(topic).len()
        )
        .unwrap();
    }
    body.push_str("</ul>\n");

    let spotlight = summary.spotlight();
    if !spotlight.is_empty() {
        writeln!(
            body,
            "<h2>{}</h2>",
            escape_html(&spotlight_heading(&summary.spotlight_topics))
        )
        .unwrap();
        for article in spotlight.into_iter().take(SPOTLIGHT_LIMIT) {
            push_entry(&mut body, article, tz);
        }
    }

    body.push_str("<h2>Detailed highlights</h2>\n");
    for topic in &summary.topics {
        let articles = summary.by_topic(topic);
        if articles.is_empty() {
            continue;
        }
        writeln!(body, "<h3>{}</h3>", escape_html(topic)).unwrap();
        for article in articles.into_iter().take(PER_TOPIC_LIMIT) {
            push_entry(&mut body, article, tz);
        }
    }

    wrap(&body)
}

fn push_entry(body: &mut String, article: &Article, tz: Tz) {
    let title = escape_html(&article.title);
    body.push_str("<div class=\"entry\">\n");
    if is_web_link(&article.link) {
        writeln!(
            body,
            "<a href=\"{}\"><strong>{}</strong></a>",
            escape_html(&article.link),
            title
        )
        .unwrap();
    } else {
        writeln!(body, "<strong>{}</strong>", title).unwrap();
    }
    writeln!(
        body,
        "<div class=\"meta\">{} | {}</div>",
        escape_html(&article.source),
        escape_html(&local_timestamp(article.published, tz))
    )
    .unwrap();
    if !article.excerpt.is_empty() {
        writeln!(body, "<p class=\"excerpt\">{}</p>", escape_html(&article.excerpt)).unwrap();
    }
    body.push_str("</div>\n");
}

fn is_web_link(link: &str) -> bool {
    url::Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn wrap(body: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html>
<head>
    <meta charset=\"utf-8\">
    <title>{}</title>
    <style>
        {}
    </style>
</head>
<body>
<div class=\"container\">
{}</div>
</body>
</html>
",
        DIGEST_TITLE, STYLE, body
    )
}

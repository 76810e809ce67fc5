//! The topic catalog that drives news searches.
//!
//! A catalog is a set of sector terms, a list of companies and an ordered list
//! of topics, each with its own keywords. Every `(topic, keyword)` pair is
//! expanded into one Google News query per sector term, or, for
//! company-scoped topics such as earnings, one query per company.
//!
//! The built-in catalog covers the semiconductor industry. A replacement can
//! be loaded from YAML:
//!
//! ```yaml
//! sector_terms: ["semiconductor", "foundry"]
//! companies: ["TSMC", "Intel"]
//! topics:
//!   - name: Strategy
//!     keywords: ["roadmap", "partnership"]
//!   - name: Earnings
//!     keywords: ["earnings"]
//!     company_scoped: true
//! ```

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

const SECTOR_TERMS: &[&str] = &["semiconductor", "chip industry", "integrated circuits", "foundry"];

const COMPANIES: &[&str] = &[
    "NVIDIA",
    "TSMC",
    "Intel",
    "Samsung Electronics",
    "AMD",
    "Qualcomm",
    "Broadcom",
    "Micron",
    "Texas Instruments",
    "SK hynix",
    "ASML",
    "Applied Materials",
    "Lam Research",
    "KLA",
    "MediaTek",
];

const TOPICS: &[(&str, &[&str], bool)] = &[
    ("Strategy", &["strategy", "expansion", "roadmap", "partnership"], false),
    ("Finance", &["finance", "revenue", "profit", "guidance"], false),
    ("Earnings", &["earnings", "quarterly results", "EPS", "outlook"], true),
    ("Investment", &["investment", "investments"], false),
    ("Fundraising", &["fundraising", "funding round", "capital raise", "series"], false),
    ("New Product Release", &["new product", "launch", "release"], false),
    ("Major Events", &["major event", "acquisition", "merger", "regulation", "sanctions"], false),
];

/// A single topic and the keywords used to search for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    pub name: String,
    pub keywords: Vec<String>,
    /// Search per company instead of per sector term.
    #[serde(default)]
    pub company_scoped: bool,
}

/// One search to run against the news source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicQuery {
    pub topic: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopicCatalog {
    #[serde(default)]
    pub sector_terms: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    pub topics: Vec<Topic>,
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self {
            sector_terms: SECTOR_TERMS.iter().map(|s| s.to_string()).collect(),
            companies: COMPANIES.iter().map(|s| s.to_string()).collect(),
            topics: TOPICS
                .iter()
                .map(|(name, keywords, company_scoped)| Topic {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                    company_scoped: *company_scoped,
                })
                .collect(),
        }
    }
}

impl TopicCatalog {
    /// Load a catalog from a YAML file and validate it.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_yaml_str(&raw)?;
        info!(topics = catalog.topics.len(), "Loaded topic catalog");
        Ok(catalog)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, Box<dyn Error>> {
        let catalog: TopicCatalog = serde_yaml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that every topic can produce at least one query.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.topics.is_empty() {
            return Err("topic catalog defines no topics".into());
        }
        for topic in &self.topics {
            if topic.keywords.is_empty() {
                return Err(format!("topic '{}' has no keywords", topic.name).into());
            }
            if topic.company_scoped && self.companies.is_empty() {
                return Err(format!("topic '{}' is company scoped but no companies are listed", topic.name).into());
            }
            if !topic.company_scoped && self.sector_terms.is_empty() {
                return Err(format!("topic '{}' needs sector terms but none are listed", topic.name).into());
            }
        }
        Ok(())
    }

    /// Topic names in catalog order.
    pub fn topic_names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    pub fn spotlight_topics(&self) -> Vec<String> {
        self.topics
            .iter()
            .filter(|t| t.company_scoped)
            .map(|t| t.name.clone())
            .collect()
    }

    /// Expand the catalog into the ordered list of searches to run.
    ///
    /// Every query is restricted to the last day with `when:1d`.
    pub fn queries(&self) -> Vec<TopicQuery> {
        let mut out = Vec::new();
        for topic in &self.topics {
            for keyword in &topic.keywords {
                if topic.company_scoped {
                    for company in &self.companies {
                        out.push(TopicQuery {
                            topic: topic.name.clone(),
                            query: format!("(\"{}\") {} semiconductor when:1d", company, keyword),
                        });
                    }
                } else {
                    for sector in &self.sector_terms {
                        out.push(TopicQuery {
                            topic: topic.name.clone(),
                            query: format!("(\"{}\") {} when:1d", sector, keyword),
                        });
                    }
                }
            }
        }
        out
    }

    /// Case-insensitive, word-bounded matcher for any sector term or company.
    pub fn relevance_filter(&self) -> Result<Regex, regex::Error> {
        let alternatives = self
            .sector_terms
            .iter()
            .chain(self.companies.iter())
            .map(|term| regex::escape(term.trim()))
            .filter(|term| !term.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives))
            .case_insensitive(true)
            .build()
    }
}

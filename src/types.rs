//! Core data model: articles, sites, and source descriptors.
//!
//! `Article` is the value object passed between every pipeline stage.
//! `Site`/`Source` mirror the `sites.json` configuration format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One news article, normalized from whichever source produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Canonical host of the publisher, not of the feed that carried the
    /// entry (a Google News feed still yields the publisher's domain).
    pub source_domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl Article {
    /// Title + summary + tags, lowercased, for keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.summary.len() + 32);
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.summary);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }
}

/// Sort newest-first; ties broken by quality score (desc) then URL (asc)
/// so the final ordering is fully deterministic. Undated articles sink to
/// the end.
pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| {
                let qa = a.quality_score.unwrap_or(0.0);
                let qb = b.quality_score.unwrap_or(0.0);
                qb.partial_cmp(&qa).unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.url.cmp(&b.url))
    });
}

/// The four source layers, in ladder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    OfficialRss,
    Rsshub,
    GoogleNews,
    Scraper,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OfficialRss => "official_rss",
            SourceKind::Rsshub => "rsshub",
            SourceKind::GoogleNews => "google_news",
            SourceKind::Scraper => "scraper",
        }
    }
}

/// One feed or scrape target belonging to a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    /// Ladder tier, 1..4. Multiple sources may share a tier.
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Publisher configuration entry from `sites.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    #[serde(default)]
    pub name: String,
    pub domain: String,
    /// Lower = better. Sites without a priority are explicit-only and
    /// never participate in top-news.
    #[serde(default)]
    pub priority: Option<u32>,
    pub sources: Vec<Source>,
}

/// Terminal state of a single source fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    Empty,
    Timeout,
    HttpError,
    ParseError,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Empty => "empty",
            FetchOutcome::Timeout => "timeout",
            FetchOutcome::HttpError => "http_error",
            FetchOutcome::ParseError => "parse_error",
        }
    }
}

/// Articles plus how the fetch ended, per source.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub articles: Vec<Article>,
    pub outcome: FetchOutcome,
}

impl SourceResult {
    pub fn empty(outcome: FetchOutcome) -> Self {
        Self {
            articles: Vec::new(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn art(url: &str, ts: Option<i64>, score: Option<f64>) -> Article {
        Article {
            title: "t".into(),
            url: url.into(),
            published_at: ts.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            summary: String::new(),
            author: None,
            tags: vec![],
            source_domain: "example.com".into(),
            quality_score: score,
        }
    }

    #[test]
    fn sort_is_newest_first_with_deterministic_ties() {
        let mut v = vec![
            art("https://b.com/1", Some(100), Some(50.0)),
            art("https://a.com/1", Some(100), Some(50.0)),
            art("https://c.com/1", Some(200), None),
            art("https://d.com/1", None, Some(90.0)),
        ];
        sort_articles(&mut v);
        assert_eq!(v[0].url, "https://c.com/1");
        assert_eq!(v[1].url, "https://a.com/1");
        assert_eq!(v[2].url, "https://b.com/1");
        assert_eq!(v[3].url, "https://d.com/1"); // undated last
    }

    #[test]
    fn source_kind_round_trips_config_names() {
        let s: SourceKind = serde_json::from_str("\"official_rss\"").unwrap();
        assert_eq!(s, SourceKind::OfficialRss);
        assert_eq!(serde_json::to_string(&SourceKind::GoogleNews).unwrap(), "\"google_news\"");
    }
}

//! Quality scoring, 0–100 per article.
//!
//! Informativeness (summary length + numeric specifics), source rank by
//! site priority band, keyword richness across the AI/tech/business
//! dictionaries, recency, and a one-shot penalty for hedging and
//! clickbait phrasing. The penalty table is compiled once and public so
//! tests can assert exact matching.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::topics;
use crate::types::Article;

const SUMMARY_FULL_CREDIT_CHARS: f64 = 600.0;
const SUMMARY_MAX_POINTS: f64 = 30.0;
const NUMERIC_BONUS_PER_TOKEN: f64 = 5.0;
const NUMERIC_BONUS_CAP: f64 = 10.0;
const RICHNESS_TOPICS: [&str; 3] = ["ai", "tech", "business"];
const PENALTY: f64 = 15.0;

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\d+(\.\d+)?[%BMK]?").expect("numeric token pattern"));

/// Hedging and clickbait patterns; any single match costs the penalty
/// once.
pub static LOW_QUALITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(optimistic|pessimistic)\s+about\b",
        r"\beyes\s+(on|for)\b",
        r"\b(may|could|might)\s+be\b",
        r"\byou\s+won'?t\s+believe\b",
        r"\bhere'?s\s+why\b",
        r"\bwhat\s+you\s+need\s+to\s+know\b",
        r"\bthis\s+one\s+trick\b",
        r"\bgoes?\s+viral\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("low quality pattern"))
    .collect()
});

fn informativeness(article: &Article) -> f64 {
    let chars = article.summary.chars().count() as f64;
    let length_points = (chars / SUMMARY_FULL_CREDIT_CHARS).min(1.0) * SUMMARY_MAX_POINTS;
    let numeric_tokens = NUMERIC_TOKEN.find_iter(&article.summary).count() as f64;
    let bonus = (numeric_tokens * NUMERIC_BONUS_PER_TOKEN).min(NUMERIC_BONUS_CAP);
    length_points + bonus
}

fn source_rank(site_priority: Option<u32>) -> f64 {
    match site_priority {
        Some(1..=3) => 20.0,
        Some(4..=6) => 15.0,
        Some(7..=9) => 10.0,
        Some(10..=12) => 5.0,
        _ => 0.0,
    }
}

fn keyword_richness(text: &str) -> f64 {
    let mut matches = 0usize;
    for topic in RICHNESS_TOPICS {
        if let Some(re) = topics::pattern_for(topic) {
            matches += re.find_iter(text).count();
            if matches >= 3 {
                break;
            }
        }
    }
    match matches {
        0 => 0.0,
        1 => 10.0,
        2 => 20.0,
        _ => 30.0,
    }
}

fn recency(article: &Article, now: DateTime<Utc>) -> f64 {
    let Some(published) = article.published_at else {
        return 0.0;
    };
    let hours = (now - published).num_hours();
    match hours {
        h if h < 6 => 10.0,
        h if h < 24 => 7.0,
        h if h < 48 => 5.0,
        h if h < 72 => 3.0,
        _ => 0.0,
    }
}

fn penalty(text: &str) -> f64 {
    if LOW_QUALITY_PATTERNS.iter().any(|re| re.is_match(text)) {
        PENALTY
    } else {
        0.0
    }
}

/// Score one article against its site's priority.
pub fn score_article(article: &Article, site_priority: Option<u32>, now: DateTime<Utc>) -> f64 {
    let text = article.searchable_text();
    let score = informativeness(article)
        + source_rank(site_priority)
        + keyword_richness(&text)
        + recency(article, now)
        - penalty(&text);
    score.clamp(0.0, 100.0)
}

/// Score a batch in place, with per-domain priority lookup.
pub fn score_articles(
    articles: &mut [Article],
    priority_of: impl Fn(&Article) -> Option<u32>,
    now: DateTime<Utc>,
) {
    for article in articles.iter_mut() {
        article.quality_score = Some(score_article(article, priority_of(article), now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn art(title: &str, summary: &str, hours_old: i64) -> Article {
        Article {
            title: title.into(),
            url: "https://example.com/a".into(),
            published_at: Some(Utc::now() - Duration::hours(hours_old)),
            summary: summary.into(),
            author: None,
            tags: vec![],
            source_domain: "example.com".into(),
            quality_score: None,
        }
    }

    #[test]
    fn rich_fresh_article_from_top_site_scores_high() {
        let summary = "The chipmaker reported $12B in quarterly revenue, up 45% year over year, \
            driven by surging demand for ai accelerators across cloud providers. Production \
            capacity doubled and the company raised guidance for the next quarter on continued \
            software and hardware momentum in enterprise technology deployments worldwide. \
            Analysts noted the startup ecosystem around machine learning tooling also expanded, \
            with several acquisition deals closing this week across the industry at record pace.";
        let a = art("Chipmaker posts record earnings on ai demand", summary, 2);
        let score = score_article(&a, Some(1), Utc::now());
        assert!(score > 80.0, "expected a high score, got {score}");
    }

    #[test]
    fn hedged_headline_pays_the_penalty_once() {
        let base = art("Markets rally after strong jobs report", "Numbers were solid.", 2);
        let hedged = art(
            "Markets may be heading lower, eyes on jobs report",
            "Numbers were solid.",
            2,
        );
        let delta = score_article(&base, Some(1), Utc::now())
            - score_article(&hedged, Some(1), Utc::now());
        assert!((delta - PENALTY).abs() < f64::EPSILON, "delta was {delta}");
    }

    #[test]
    fn source_rank_bands() {
        assert_eq!(source_rank(Some(2)), 20.0);
        assert_eq!(source_rank(Some(5)), 15.0);
        assert_eq!(source_rank(Some(8)), 10.0);
        assert_eq!(source_rank(Some(11)), 5.0);
        assert_eq!(source_rank(Some(13)), 0.0);
        assert_eq!(source_rank(None), 0.0);
    }

    #[test]
    fn recency_tiers() {
        let now = Utc::now();
        assert_eq!(recency(&art("t", "", 2), now), 10.0);
        assert_eq!(recency(&art("t", "", 12), now), 7.0);
        assert_eq!(recency(&art("t", "", 30), now), 5.0);
        assert_eq!(recency(&art("t", "", 60), now), 3.0);
        assert_eq!(recency(&art("t", "", 100), now), 0.0);
    }

    #[test]
    fn numeric_bonus_is_capped() {
        let a = art("t", "$5B raised, 20% growth, 3 deals, 7 launches", 200);
        let inf = informativeness(&a);
        let length_only = (a.summary.chars().count() as f64 / SUMMARY_FULL_CREDIT_CHARS) * 30.0;
        assert!((inf - length_only - NUMERIC_BONUS_CAP).abs() < 1e-9);
    }

    #[test]
    fn score_stays_in_bounds() {
        let empty = art("Plain title here", "", 500);
        assert_eq!(score_article(&empty, None, Utc::now()), 0.0);
    }
}

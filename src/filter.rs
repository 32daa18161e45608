//! Filter pipeline: date window, topic keywords, location.
//!
//! Runs after dedup and before scoring. Matching is word-boundary only;
//! `ai` must never match `paint` or `Ukraine`. Filters AND-compose.

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::topics;
use crate::types::Article;

/// Normalized filter set for one request.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Sanitized, lowercased topic token.
    pub topic: Option<String>,
    /// Sanitized, lowercased location keyword.
    pub location: Option<String>,
    pub last_n_days: i64,
    /// Whether the caller set the window explicitly. Undated articles
    /// survive the implicit recent-news default but not an explicit
    /// window.
    pub explicit_window: bool,
}

/// Word-boundary regex for a literal (possibly multi-word) phrase.
fn literal_pattern(phrase: &str) -> Option<Regex> {
    let escaped = regex::escape(phrase);
    Regex::new(&format!(r"(?u)\b{escaped}\b")).ok()
}

fn matches_topic(text: &str, topic: &str) -> bool {
    match topics::pattern_for(topic) {
        Some(re) => re.is_match(text),
        // Unknown key: the token itself, word-bounded.
        None => literal_pattern(topic).map(|re| re.is_match(text)).unwrap_or(false),
    }
}

/// Apply all requested filters, dropping non-matching articles.
pub fn filter_articles(articles: Vec<Article>, filters: &Filters, now: DateTime<Utc>) -> Vec<Article> {
    let location_re = filters
        .location
        .as_deref()
        .filter(|l| !l.is_empty())
        .and_then(literal_pattern);
    let before = articles.len();

    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|article| {
            match article.published_at {
                Some(published) => {
                    let age_days = (now - published).num_days();
                    if age_days > filters.last_n_days {
                        return false;
                    }
                }
                None => {
                    if filters.explicit_window {
                        return false;
                    }
                }
            }

            if filters.topic.as_deref().map_or(false, |t| !t.is_empty()) {
                let text = article.searchable_text();
                let topic = filters.topic.as_deref().unwrap_or_default();
                if !matches_topic(&text, topic) {
                    return false;
                }
            }

            if let Some(re) = &location_re {
                if !re.is_match(&article.searchable_text()) {
                    return false;
                }
            }

            true
        })
        .collect();

    debug!(before, after = kept.len(), "filter pipeline applied");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn art(title: &str, summary: &str, age_days: i64) -> Article {
        Article {
            title: title.into(),
            url: format!("https://example.com/{}", title.len()),
            published_at: Some(Utc::now() - Duration::days(age_days)),
            summary: summary.into(),
            author: None,
            tags: vec![],
            source_domain: "example.com".into(),
            quality_score: None,
        }
    }

    fn undated(title: &str) -> Article {
        Article {
            published_at: None,
            ..art(title, "", 0)
        }
    }

    #[test]
    fn topic_expansion_matches_word_boundaries_only() {
        let filters = Filters {
            topic: Some("ai".into()),
            last_n_days: 15,
            ..Default::default()
        };
        let kept = filter_articles(
            vec![
                art("Ukraine war update", "frontline news", 1),
                art("ChatGPT adoption rises", "enterprise rollout", 1),
                art("Fresh paint for the stadium", "renovation", 1),
            ],
            &filters,
            Utc::now(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "ChatGPT adoption rises");
    }

    #[test]
    fn unknown_topic_falls_back_to_literal_match() {
        let filters = Filters {
            topic: Some("quantum".into()),
            last_n_days: 15,
            ..Default::default()
        };
        let kept = filter_articles(
            vec![
                art("Quantum computing milestone", "", 1),
                art("Quantification methods", "", 1),
            ],
            &filters,
            Utc::now(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Quantum computing milestone");
    }

    #[test]
    fn date_window_drops_old_articles() {
        let filters = Filters {
            last_n_days: 30,
            explicit_window: true,
            ..Default::default()
        };
        let kept = filter_articles(
            vec![
                art("Fresh today", "", 0),
                art("Five days old", "", 5),
                art("Twenty days old", "", 20),
                art("Forty days old", "", 40),
            ],
            &filters,
            Utc::now(),
        );
        let titles: Vec<&str> = kept.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Fresh today", "Five days old", "Twenty days old"]);
    }

    #[test]
    fn undated_articles_drop_only_with_explicit_window() {
        let implicit = Filters {
            last_n_days: 15,
            explicit_window: false,
            ..Default::default()
        };
        let explicit = Filters {
            explicit_window: true,
            ..implicit.clone()
        };
        let articles = vec![undated("No date on this one")];
        assert_eq!(filter_articles(articles.clone(), &implicit, Utc::now()).len(), 1);
        assert_eq!(filter_articles(articles, &explicit, Utc::now()).len(), 0);
    }

    #[test]
    fn filters_and_compose() {
        let filters = Filters {
            topic: Some("ai".into()),
            location: Some("bangalore".into()),
            last_n_days: 15,
            ..Default::default()
        };
        let kept = filter_articles(
            vec![
                art("ChatGPT event in Bangalore", "developer meetup", 1),
                art("ChatGPT event in Mumbai", "developer meetup", 1),
                art("Bangalore traffic report", "daily commute", 1),
            ],
            &filters,
            Utc::now(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "ChatGPT event in Bangalore");
    }
}

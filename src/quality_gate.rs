//! Google News quality gate.
//!
//! Google News feeds return redirect URLs under `news.google.com`. Each
//! one gets a fast HEAD resolution attempt; articles that resolve are
//! rewritten to the publisher's real URL and host. If fewer than half of
//! the feed's articles end up pointing somewhere real, the whole source
//! is discarded and counts as failed for fallback purposes.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::info;

use crate::fetch::RedirectResolver;
use crate::types::Article;
use crate::validate;

const GOOGLE_NEWS_HOST: &str = "news.google.com";
const RESOLVE_CONCURRENCY: usize = 8;
const MIN_VALID_RATIO: f64 = 0.5;

/// Outcome of gating one Google News source.
#[derive(Debug)]
pub struct GateResult {
    pub articles: Vec<Article>,
    /// False means the source flunked the ratio check and must be
    /// treated as failed by the ladder.
    pub passed: bool,
}

fn is_google_host(url: &str) -> bool {
    validate::host_of(url)
        .map(|h| h == GOOGLE_NEWS_HOST || h.ends_with(".google.com"))
        .unwrap_or(false)
}

/// Run the gate: resolve redirects, compute the valid ratio, and drop
/// stale articles.
pub async fn apply(
    resolver: &dyn RedirectResolver,
    articles: Vec<Article>,
    last_n_days: i64,
    now: DateTime<Utc>,
) -> GateResult {
    if articles.is_empty() {
        return GateResult {
            articles,
            passed: true,
        };
    }
    let total = articles.len();

    let resolved: Vec<Article> = stream::iter(articles)
        .map(|mut article| async move {
            if is_google_host(&article.url) {
                if let Some(final_url) = resolver.resolve(&article.url).await {
                    if !is_google_host(&final_url) {
                        if let Some(host) = validate::host_of(&final_url) {
                            article.source_domain = host;
                        }
                        article.url = final_url;
                    }
                }
            }
            article
        })
        .buffer_unordered(RESOLVE_CONCURRENCY)
        .collect()
        .await;

    let valid = resolved.iter().filter(|a| !is_google_host(&a.url)).count();
    let valid_ratio = valid as f64 / total as f64;
    if valid_ratio < MIN_VALID_RATIO {
        info!(total, valid, "google news source discarded by quality gate");
        return GateResult {
            articles: Vec::new(),
            passed: false,
        };
    }

    let cutoff = now - Duration::days(last_n_days);
    let articles = resolved
        .into_iter()
        .filter(|a| match a.published_at {
            Some(ts) => ts >= cutoff,
            None => true,
        })
        .collect();

    GateResult {
        articles,
        passed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapResolver(HashMap<String, String>);

    #[async_trait]
    impl RedirectResolver for MapResolver {
        async fn resolve(&self, url: &str) -> Option<String> {
            self.0.get(url).cloned()
        }
    }

    fn google_article(n: usize) -> Article {
        Article {
            title: format!("Story number {n} with a headline"),
            url: format!("https://news.google.com/rss/articles/{n}"),
            published_at: Some(Utc::now()),
            summary: String::new(),
            author: None,
            tags: vec![],
            source_domain: "example.com".into(),
            quality_score: None,
        }
    }

    #[tokio::test]
    async fn resolving_majority_passes_and_rewrites() {
        let mut map = HashMap::new();
        for n in 0..3 {
            map.insert(
                format!("https://news.google.com/rss/articles/{n}"),
                format!("https://publisher.com/story/{n}"),
            );
        }
        let resolver = MapResolver(map);
        let articles: Vec<Article> = (0..4).map(google_article).collect();

        let result = apply(&resolver, articles, 15, Utc::now()).await;
        assert!(result.passed);
        assert_eq!(result.articles.len(), 4);
        let rewritten = result
            .articles
            .iter()
            .filter(|a| a.source_domain == "publisher.com")
            .count();
        assert_eq!(rewritten, 3);
    }

    #[tokio::test]
    async fn unresolvable_majority_discards_source() {
        let resolver = MapResolver(HashMap::new());
        let articles: Vec<Article> = (0..10).map(google_article).collect();

        let result = apply(&resolver, articles, 15, Utc::now()).await;
        assert!(!result.passed);
        assert!(result.articles.is_empty());
    }

    #[tokio::test]
    async fn stale_articles_are_dropped_after_resolution() {
        let mut map = HashMap::new();
        map.insert(
            "https://news.google.com/rss/articles/0".to_string(),
            "https://publisher.com/story/0".to_string(),
        );
        let resolver = MapResolver(map);
        let mut fresh = google_article(0);
        fresh.published_at = Some(Utc::now());
        let mut stale = Article {
            url: "https://publisher.com/old".into(),
            ..google_article(1)
        };
        stale.published_at = Some(Utc::now() - Duration::days(30));

        let result = apply(&resolver, vec![fresh, stale], 15, Utc::now()).await;
        assert!(result.passed);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].source_domain, "publisher.com");
    }
}

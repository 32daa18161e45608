// tests/filter_scenarios.rs
// Engine-level filter behavior: word-boundary topic matching, explicit
// date-window overrides, and parameter boundary cases.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use newsnexus::config::{Settings, SiteRegistry};
use newsnexus::engine::{get_articles, AppState, ArticlesQuery};
use newsnexus::fetch::{RedirectResolver, SourceFetch};
use newsnexus::metrics::Metrics;
use newsnexus::types::{Article, FetchOutcome, Site, Source, SourceKind, SourceResult};

struct FixedFetcher {
    articles: Vec<Article>,
}

#[async_trait]
impl SourceFetch for FixedFetcher {
    async fn fetch(&self, _source: &Source, _domain: &str) -> SourceResult {
        SourceResult {
            articles: self.articles.clone(),
            outcome: FetchOutcome::Ok,
        }
    }
}

struct NoResolver;

#[async_trait]
impl RedirectResolver for NoResolver {
    async fn resolve(&self, _url: &str) -> Option<String> {
        None
    }
}

fn article(title: &str, age_days: i64) -> Article {
    Article {
        title: title.to_string(),
        url: format!("https://example.com/{}", title.replace(' ', "-").to_lowercase()),
        published_at: Some(Utc::now() - Duration::days(age_days)),
        summary: "A normal-length summary for the article in question.".into(),
        author: None,
        tags: vec![],
        source_domain: "example.com".into(),
        quality_score: None,
    }
}

fn state_with(articles: Vec<Article>) -> AppState {
    let site = Site {
        name: "Example".into(),
        domain: "example.com".into(),
        priority: Some(1),
        sources: vec![Source {
            kind: SourceKind::OfficialRss,
            url: "https://example.com/rss".into(),
            priority: 1,
            timeout_ms: None,
        }],
    };
    AppState::new(
        Settings::default(),
        SiteRegistry::from_sites(vec![site]),
        Arc::new(FixedFetcher { articles }),
        Arc::new(NoResolver),
        Arc::new(Metrics::new()),
    )
}

fn query(domain: &str) -> ArticlesQuery {
    ArticlesQuery {
        domain: domain.into(),
        ..Default::default()
    }
}

// S3: `topic=ai` must match via dictionary expansion (chatgpt), never
// as a substring (Ukraine).
#[tokio::test]
async fn topic_filter_is_word_boundary_with_expansion() {
    let state = state_with(vec![
        article("Ukraine war update", 1),
        article("ChatGPT adoption rises", 1),
        article("Painting the town red", 1),
        article("Llm benchmarks released", 1),
        article("Unrelated cricket scores", 1),
        article("Another plain story", 1),
    ]);
    let mut q = query("example.com");
    q.topic = Some("ai".into());

    let resp = get_articles(&state, q).await.unwrap();
    let titles: Vec<&str> = resp.articles.iter().map(|a| a.title.as_str()).collect();
    assert!(titles.contains(&"ChatGPT adoption rises"));
    assert!(titles.contains(&"Llm benchmarks released"));
    assert!(!titles.contains(&"Ukraine war update"));
    assert!(!titles.contains(&"Painting the town red"));
}

// S5: an explicit lastNDays=30 admits ages {0, 5, 20} and drops 40.
#[tokio::test]
async fn explicit_window_overrides_the_recent_default() {
    let state = state_with(vec![
        article("Story from today", 0),
        article("Story from five days ago", 5),
        article("Story from twenty days ago", 20),
        article("Story from forty days ago", 40),
        article("Another current story entirely", 0),
    ]);
    let mut q = query("example.com");
    q.last_n_days = Some(30);

    let resp = get_articles(&state, q).await.unwrap();
    let titles: Vec<&str> = resp.articles.iter().map(|a| a.title.as_str()).collect();
    assert!(titles.contains(&"Story from twenty days ago"));
    assert!(!titles.contains(&"Story from forty days ago"));
}

// Without an explicit window, the recent default caps the view at 15
// days.
#[tokio::test]
async fn default_window_caps_at_fifteen_days() {
    let state = state_with(vec![
        article("Fresh story one of several", 1),
        article("Fresh story two of several", 2),
        article("Fresh story three of several", 3),
        article("Fresh story four of several", 4),
        article("Fresh story five of several", 5),
        article("Story from twenty days ago", 20),
    ]);
    let resp = get_articles(&state, query("example.com")).await.unwrap();
    assert!(resp
        .articles
        .iter()
        .all(|a| a.title != "Story from twenty days ago"));
}

// Boundary: lastNDays=365 is allowed only when explicit; out-of-range
// values and bad counts are BadInput.
#[tokio::test]
async fn parameter_boundaries() {
    let state = state_with(vec![
        article("A story from last quarter", 100),
        article("Recent story number one here", 1),
        article("Recent story number two here", 2),
        article("Recent story number three here", 3),
        article("Recent story number four here", 4),
    ]);

    let mut q = query("example.com");
    q.last_n_days = Some(365);
    let resp = get_articles(&state, q).await.unwrap();
    assert!(resp
        .articles
        .iter()
        .any(|a| a.title == "A story from last quarter"));

    let mut q = query("example.com");
    q.last_n_days = Some(366);
    assert_eq!(get_articles(&state, q).await.unwrap_err().code(), "bad_input");

    let mut q = query("example.com");
    q.count = Some(0);
    assert_eq!(get_articles(&state, q).await.unwrap_err().code(), "bad_input");

    assert_eq!(
        get_articles(&state, query("not a domain"))
            .await
            .unwrap_err()
            .code(),
        "bad_input"
    );
}

// Every response invariant from the contract: unique canonical URLs,
// unique normalized titles, newest-first order, window honored, count
// cap.
#[tokio::test]
async fn universal_response_invariants_hold() {
    let mut articles = Vec::new();
    for i in 0..20 {
        articles.push(article(&format!("Completely distinct headline {i} today"), i % 10));
    }
    // Near-duplicates and an exact URL duplicate.
    articles.push(article("Completely distinct headline 0 today", 1));
    let state = state_with(articles);

    let mut q = query("example.com");
    q.count = Some(8);
    let resp = get_articles(&state, q).await.unwrap();

    assert!(resp.articles.len() <= 8);

    let mut urls: Vec<String> = resp
        .articles
        .iter()
        .map(|a| newsnexus::validate::canonical_url(&a.url))
        .collect();
    urls.sort();
    let before = urls.len();
    urls.dedup();
    assert_eq!(before, urls.len(), "canonical URLs must be unique");

    let mut titles: Vec<String> = resp
        .articles
        .iter()
        .map(|a| newsnexus::dedup::normalize_title(&a.title))
        .collect();
    titles.sort();
    let before = titles.len();
    titles.dedup();
    assert_eq!(before, titles.len(), "normalized titles must be unique");

    for pair in resp.articles.windows(2) {
        assert!(pair[0].published_at >= pair[1].published_at, "newest first");
    }
    for a in &resp.articles {
        let age = (Utc::now() - a.published_at.unwrap()).num_days();
        assert!(age <= 15);
        assert!(a.quality_score.is_some());
    }
}

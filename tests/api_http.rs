// tests/api_http.rs
// In-process router tests: response shapes and error mapping, no
// network.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt; // for oneshot

use newsnexus::config::{Settings, SiteRegistry};
use newsnexus::engine::AppState;
use newsnexus::fetch::{RedirectResolver, SourceFetch};
use newsnexus::metrics::Metrics;
use newsnexus::types::{Article, FetchOutcome, Site, Source, SourceKind, SourceResult};

struct FixedFetcher {
    per_call: usize,
}

#[async_trait]
impl SourceFetch for FixedFetcher {
    async fn fetch(&self, _source: &Source, domain: &str) -> SourceResult {
        let articles = (0..self.per_call)
            .map(|i| Article {
                title: format!("{domain} wire report number {i}"),
                url: format!("https://{domain}/wire/{i}"),
                published_at: Some(Utc::now() - Duration::hours(i as i64 + 1)),
                summary: "Steady coverage of the beat.".into(),
                author: None,
                tags: vec![],
                source_domain: domain.to_string(),
                quality_score: None,
            })
            .collect();
        SourceResult {
            articles,
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

fn app(per_call: usize) -> axum::Router {
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
    let state = Arc::new(AppState::new(
        Settings::default(),
        SiteRegistry::from_sites(vec![site]),
        Arc::new(FixedFetcher { per_call }),
        Arc::new(NoResolver),
        Arc::new(Metrics::new()),
    ));
    newsnexus::router(state)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_configuration() {
    let app = app(6);
    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["configured_domains"], 1);
    assert_eq!(body["constants"]["MAX_RECENT_DAYS"], 15);
    assert_eq!(body["constants"]["MIN_ARTICLES_THRESHOLD"], 5);
    assert_eq!(body["cache"]["max_size"], 1000);
}

#[tokio::test]
async fn articles_round_trip_with_cached_flag() {
    let app = app(8);
    let (status, first) = get_json(&app, "/api/articles?domain=example.com&count=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(first["articles"].as_array().unwrap().len(), 5);
    assert!(first["sourceUsed"].as_str().unwrap().starts_with("tier 1"));

    let (_, second) = get_json(&app, "/api/articles?domain=example.com&count=5").await;
    assert_eq!(second["cached"], true);
    assert_eq!(first["articles"], second["articles"]);
}

#[tokio::test]
async fn bad_input_maps_to_400() {
    let app = app(8);
    let (status, body) = get_json(&app, "/api/articles?domain=example.com&count=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_input");
}

#[tokio::test]
async fn unknown_domain_maps_to_404() {
    let app = app(8);
    let (status, body) = get_json(&app, "/api/articles?domain=missing-site.org").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "no_match");
}

#[tokio::test]
async fn rate_limit_maps_to_429_with_retry_hint() {
    let app = app(0); // empty results are never cached, every call hits the limiter
    let mut last = (StatusCode::OK, serde_json::Value::Null);
    for _ in 0..=Settings::default().rate_limit {
        last = get_json(&app, "/api/articles?domain=example.com").await;
    }
    assert_eq!(last.0, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(last.1["error"]["code"], "rate_limited");
    assert!(last.1["retryAfter"].is_number());
}

#[tokio::test]
async fn metrics_expose_counters_and_histograms() {
    let app = app(8);
    let _ = get_json(&app, "/api/articles?domain=example.com").await;
    let (status, body) = get_json(&app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let counters = &body["metrics"]["counters"];
    assert_eq!(counters["get_articles_requests"], 1);
    assert!(body["metrics"]["histograms"]["get_articles_duration_ms"]["count"].is_number());
    assert!(body["metrics"]["uptime_seconds"].is_number());
}

#[tokio::test]
async fn top_news_accepts_comma_separated_domains() {
    let app = app(8);
    let (status, body) =
        get_json(&app, "/api/top-news?domains=example.com&count=3&enable_quality_filter=false")
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["articles"].as_array().unwrap().len(), 3);
    assert_eq!(body["qualityFilterEnabled"], false);
}

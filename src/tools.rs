//! The four tool operations, transport-agnostic.
//!
//! `get_articles` and `get_top_news` are the orchestrating operations;
//! `health_check` and `get_metrics` are cheap reads over the shared
//! services. The HTTP layer in `api.rs` is one thin adapter over these.

use chrono::Utc;
use serde::Serialize;

use crate::config::{DEFAULT_ARTICLE_COUNT, MAX_RECENT_DAYS, MIN_ARTICLES_THRESHOLD};
use crate::engine::AppState;
use crate::metrics::MetricsSnapshot;

pub use crate::engine::{get_articles, ArticlesQuery, ArticlesResponse};
pub use crate::top_news::{get_top_news, TopNewsQuery, TopNewsResponse};

#[derive(Debug, Serialize)]
pub struct CacheInfo {
    pub size: usize,
    pub ttl_seconds: u64,
    pub max_size: usize,
}

#[derive(Debug, Serialize)]
pub struct ConstantsInfo {
    #[serde(rename = "MAX_RECENT_DAYS")]
    pub max_recent_days: i64,
    #[serde(rename = "DEFAULT_ARTICLE_COUNT")]
    pub default_article_count: usize,
    #[serde(rename = "MIN_ARTICLES_THRESHOLD")]
    pub min_articles_threshold: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub configured_domains: usize,
    pub priority_sites: usize,
    pub cache: CacheInfo,
    pub constants: ConstantsInfo,
    pub timestamp: String,
}

/// Server status and configuration summary.
pub fn health_check(state: &AppState) -> HealthResponse {
    HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        configured_domains: state.registry.len(),
        priority_sites: state.registry.priority_site_count(),
        cache: CacheInfo {
            size: state.cache.len(),
            ttl_seconds: state.cache.ttl_secs(),
            max_size: state.cache.capacity(),
        },
        constants: ConstantsInfo {
            max_recent_days: MAX_RECENT_DAYS,
            default_article_count: DEFAULT_ARTICLE_COUNT,
            min_articles_threshold: MIN_ARTICLES_THRESHOLD,
        },
        timestamp: Utc::now().to_rfc3339(),
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: MetricsSnapshot,
    pub timestamp: String,
}

/// Counters, histograms, uptime.
pub fn get_metrics(state: &AppState) -> MetricsResponse {
    MetricsResponse {
        metrics: state.metrics.snapshot(),
        timestamp: Utc::now().to_rfc3339(),
    }
}

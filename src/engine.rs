//! Per-domain request path: validate → cache → rate-limit → ladder →
//! dedup → filter → score → sort → cap.
//!
//! `AppState` owns the injected services; handlers and the top-news
//! orchestrator share it behind an `Arc`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{request_key, Cache};
use crate::config::{
    Settings, SiteRegistry, DEFAULT_ARTICLE_COUNT, FETCH_POOL_SIZE, MAX_RECENT_DAYS,
    MIN_ARTICLES_THRESHOLD,
};
use crate::dedup;
use crate::error::ToolError;
use crate::fetch::{RedirectResolver, SourceFetch};
use crate::filter::{self, Filters};
use crate::ladder::{self, LadderConfig};
use crate::metrics::Metrics;
use crate::ratelimit::RateLimiter;
use crate::score;
use crate::types::{sort_articles, Article};
use crate::validate;

/// Shared services, constructed once at startup.
pub struct AppState {
    pub settings: Settings,
    pub registry: SiteRegistry,
    pub cache: Cache,
    pub limiter: RateLimiter,
    pub metrics: Arc<Metrics>,
    pub fetcher: Arc<dyn SourceFetch>,
    pub resolver: Arc<dyn RedirectResolver>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        registry: SiteRegistry,
        fetcher: Arc<dyn SourceFetch>,
        resolver: Arc<dyn RedirectResolver>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let cache = Cache::new(
            std::time::Duration::from_secs(settings.cache_ttl_secs),
            settings.cache_capacity,
        );
        let limiter = RateLimiter::new(
            settings.rate_limit,
            std::time::Duration::from_secs(settings.rate_window_secs),
        );
        Self {
            settings,
            registry,
            cache,
            limiter,
            metrics,
            fetcher,
            resolver,
        }
    }
}

/// Parameters of one `get_articles` call, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlesQuery {
    pub domain: String,
    pub topic: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "lastNDays")]
    pub last_n_days: Option<i64>,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesResponse {
    #[serde(rename = "sourceUsed")]
    pub source_used: String,
    pub articles: Vec<Article>,
    pub cached: bool,
    #[serde(rename = "durationMs")]
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Retrieve recent articles for one domain through the fallback ladder.
pub async fn get_articles(
    state: &AppState,
    query: ArticlesQuery,
) -> Result<ArticlesResponse, ToolError> {
    let started = Instant::now();
    state.metrics.increment("get_articles_requests");

    let domain = validate_request(state, &query)?;
    let count = validate::clamp_count(query.count, DEFAULT_ARTICLE_COUNT)?;
    let (last_n_days, explicit_window) =
        validate::clamp_last_n_days(query.last_n_days, MAX_RECENT_DAYS)?;
    let topic = query
        .topic
        .as_deref()
        .map(validate::sanitize_filter)
        .filter(|t| !t.is_empty());
    let location = query
        .location
        .as_deref()
        .map(validate::sanitize_filter)
        .filter(|l| !l.is_empty());

    // Cache first: hits must not consume rate-limit budget.
    let key = request_key(
        "get_articles",
        &domain,
        topic.as_deref(),
        location.as_deref(),
        last_n_days,
        count,
    );
    if let Some(value) = state.cache.get(&key) {
        state.metrics.increment("cache_hits");
        if let Ok(mut cached) = serde_json::from_value::<ArticlesResponse>(value) {
            info!(domain = %domain, "cache hit");
            cached.cached = true;
            return Ok(cached);
        }
    }
    state.metrics.increment("cache_misses");

    if let Err(retry_after_secs) = state.limiter.check(&domain) {
        warn!(domain = %domain, "rate limit exceeded");
        state.metrics.increment("get_articles_rate_limited");
        return Err(ToolError::RateLimited {
            domain,
            retry_after_secs,
        });
    }

    let site = state.registry.find(&domain).cloned().ok_or_else(|| {
        state.metrics.increment("get_articles_domain_not_found");
        ToolError::NoMatch(domain.clone())
    })?;

    let ladder_cfg = LadderConfig {
        threshold: MIN_ARTICLES_THRESHOLD,
        fuzzy_title_threshold: state.settings.fuzzy_title_threshold,
        last_n_days,
        pool_size: if state.settings.parallel { FETCH_POOL_SIZE } else { 1 },
    };
    let outcome = ladder::run_ladder(
        state.fetcher.as_ref(),
        state.resolver.as_ref(),
        &site,
        &ladder_cfg,
        &state.metrics,
    )
    .await;

    let filters = Filters {
        topic,
        location,
        last_n_days,
        explicit_window,
    };
    let now = Utc::now();
    let site_priority = site.priority;
    let ladder_was_empty = outcome.articles.is_empty();
    let articles = dedup::dedup_articles(
        outcome.articles,
        state.settings.fuzzy_title_threshold,
        |_| site_priority.unwrap_or(u32::MAX),
    );
    let mut articles = filter::filter_articles(articles, &filters, now);
    score::score_articles(&mut articles, |_| site_priority, now);
    sort_articles(&mut articles);
    articles.truncate(count);

    let message = if outcome.degraded {
        outcome.message.clone()
    } else if articles.len() < count {
        Some(format!(
            "Found {} article(s) (requested {count}) from the last {last_n_days} days. \
             This is all the recent content available.",
            articles.len()
        ))
    } else {
        None
    };

    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    let response = ArticlesResponse {
        source_used: outcome.source_used.clone(),
        articles,
        cached: false,
        duration_ms,
        message,
    };

    if outcome.degraded {
        state.metrics.increment(if ladder_was_empty {
            "get_articles_upstream_unavailable"
        } else {
            "get_articles_degraded"
        });
    } else {
        state.metrics.increment("get_articles_success");
        state
            .metrics
            .increment_by("articles_returned", response.articles.len() as u64);
        if let Ok(value) = serde_json::to_value(&response) {
            state.cache.put(&key, value);
        }
    }

    state
        .metrics
        .record_duration_ms("get_articles_duration_ms", duration_ms);
    info!(
        domain = %domain,
        source_type = %response.source_used,
        duration_ms,
        article_count = response.articles.len(),
        "get_articles completed"
    );

    Ok(response)
}

fn validate_request(state: &AppState, query: &ArticlesQuery) -> Result<String, ToolError> {
    let domain = validate::validate_domain(&query.domain).map_err(|e| {
        state.metrics.increment("get_articles_invalid_domain");
        e
    })?;
    Ok(domain)
}

//! Top-news orchestrator: fan out per-site ladders, merge, dedup,
//! filter, score, diversify, cap.
//!
//! With explicit `domains` the result is scoped to the resolved sites
//! only. Without them, the priority band (1..=12) is used, and a deep
//! search over the next-priority sites supplements the pool when the
//! first pass comes up short.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::request_key;
use crate::config::{
    DEFAULT_ARTICLE_COUNT, FETCH_POOL_SIZE, MAX_RECENT_DAYS, MIN_ARTICLES_THRESHOLD,
    TIER_DEADLINE_SECS,
};
use crate::dedup;
use crate::engine::AppState;
use crate::error::ToolError;
use crate::filter::{self, Filters};
use crate::ladder::{self, LadderConfig, LadderOutcome};
use crate::score;
use crate::types::{sort_articles, Article, Site};
use crate::validate;
use crate::diversity;

/// Per-site wall clock for one ladder run inside the fan-out.
const SITE_DEADLINE_SECS: u64 = TIER_DEADLINE_SECS;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopNewsQuery {
    pub count: Option<i64>,
    pub topic: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "lastNDays")]
    pub last_n_days: Option<i64>,
    pub domains: Option<Vec<String>>,
    pub min_quality_score: Option<f64>,
    pub enable_quality_filter: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUsage {
    pub domain: String,
    pub source: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopNewsResponse {
    pub sources_used: Vec<SourceUsage>,
    pub articles: Vec<Article>,
    pub total_articles: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: f64,
    #[serde(rename = "qualityFilterEnabled")]
    pub quality_filter_enabled: bool,
    #[serde(rename = "minQualityScore")]
    pub min_quality_score: f64,
    #[serde(rename = "filteredOut")]
    pub filtered_out: usize,
}

/// Resolve explicit domain tokens against the registry. All-miss is a
/// `NoMatch` carrying the unmatched tokens.
fn resolve_domains(state: &AppState, tokens: &[String]) -> Result<Vec<Site>, ToolError> {
    let mut resolved: Vec<Site> = Vec::new();
    let mut unmatched: Vec<String> = Vec::new();
    for token in tokens {
        let cleaned = validate::sanitize_filter(token);
        if cleaned.is_empty() {
            continue;
        }
        match state.registry.find(&cleaned) {
            Some(site) => {
                if !resolved.iter().any(|s| s.domain == site.domain) {
                    resolved.push(site.clone());
                }
            }
            None => unmatched.push(cleaned),
        }
    }
    if resolved.is_empty() {
        return Err(ToolError::NoMatch(unmatched.join(", ")));
    }
    Ok(resolved)
}

async fn run_one_site(
    state: &AppState,
    site: Site,
    cfg: &LadderConfig,
) -> Option<(Site, LadderOutcome)> {
    let run = ladder::run_ladder(
        state.fetcher.as_ref(),
        state.resolver.as_ref(),
        &site,
        cfg,
        &state.metrics,
    );
    match tokio::time::timeout(Duration::from_secs(SITE_DEADLINE_SECS), run).await {
        Ok(outcome) => Some((site, outcome)),
        Err(_) => {
            warn!(domain = %site.domain, "per-site deadline reached, dropping result");
            None
        }
    }
}

/// Run ladders for a set of sites in parallel, with a per-site
/// deadline. Sites that miss the deadline contribute nothing.
async fn fan_out(state: &AppState, sites: &[Site], cfg: &LadderConfig) -> Vec<(Site, LadderOutcome)> {
    let runs = sites.iter().map(|site| {
        Box::pin(run_one_site(state, site.clone(), cfg))
            as Pin<Box<dyn Future<Output = Option<(Site, LadderOutcome)>> + Send + '_>>
    });

    stream::iter(runs)
        .buffer_unordered(FETCH_POOL_SIZE)
        .filter_map(|r| async move { r })
        .collect()
        .await
}

struct Pipeline<'a> {
    state: &'a AppState,
    filters: Filters,
    quality_filter_enabled: bool,
    min_quality_score: f64,
}

impl Pipeline<'_> {
    /// Merge raw ladder articles through dedup → filter → score →
    /// quality gate → date sort. Returns the kept list and how many the
    /// quality filter dropped.
    fn run(&self, raw: Vec<Article>, priorities: &HashMap<String, u32>) -> (Vec<Article>, usize) {
        let now = Utc::now();
        let deduped = dedup::dedup_articles(
            raw,
            self.state.settings.fuzzy_title_threshold,
            |a: &Article| priorities.get(&a.source_domain).copied().unwrap_or(u32::MAX),
        );
        let mut kept = filter::filter_articles(deduped, &self.filters, now);
        score::score_articles(
            &mut kept,
            |a| priorities.get(&a.source_domain).copied(),
            now,
        );

        let mut filtered_out = 0usize;
        if self.quality_filter_enabled {
            let before = kept.len();
            kept.retain(|a| a.quality_score.unwrap_or(0.0) >= self.min_quality_score);
            filtered_out = before - kept.len();
        }

        sort_articles(&mut kept);
        (kept, filtered_out)
    }
}

/// Aggregate top news across priority sites (or an explicit domain
/// list).
pub async fn get_top_news(
    state: &AppState,
    query: TopNewsQuery,
) -> Result<TopNewsResponse, ToolError> {
    let started = Instant::now();
    state.metrics.increment("get_top_news_requests");

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
    let quality_filter_enabled = query.enable_quality_filter.unwrap_or(true);
    let min_quality_score = query
        .min_quality_score
        .unwrap_or(state.settings.min_quality_score)
        .clamp(0.0, 100.0);

    let explicit_domains = query.domains.as_deref().map(|d| !d.is_empty()).unwrap_or(false);
    let sites: Vec<Site> = if explicit_domains {
        resolve_domains(state, query.domains.as_deref().unwrap_or_default())?
    } else {
        state.registry.top_news_sites().into_iter().cloned().collect()
    };
    if sites.is_empty() {
        return Err(ToolError::NoMatch("no prioritized sites configured".into()));
    }

    let mut scope: Vec<String> = sites.iter().map(|s| s.domain.clone()).collect();
    scope.sort();
    let cache_scope = if explicit_domains {
        format!("{}|q{min_quality_score}|{quality_filter_enabled}", scope.join(","))
    } else {
        format!("TOP|q{min_quality_score}|{quality_filter_enabled}")
    };
    let key = request_key(
        "get_top_news",
        &cache_scope,
        topic.as_deref(),
        location.as_deref(),
        last_n_days,
        count,
    );
    if let Some(value) = state.cache.get(&key) {
        state.metrics.increment("cache_hits");
        if let Ok(cached) = serde_json::from_value::<TopNewsResponse>(value) {
            return Ok(cached);
        }
    }
    state.metrics.increment("cache_misses");

    let ladder_cfg = LadderConfig {
        threshold: MIN_ARTICLES_THRESHOLD,
        fuzzy_title_threshold: state.settings.fuzzy_title_threshold,
        last_n_days,
        pool_size: if state.settings.parallel { FETCH_POOL_SIZE } else { 1 },
    };
    let pipeline = Pipeline {
        state,
        filters: Filters {
            topic,
            location,
            last_n_days,
            explicit_window,
        },
        quality_filter_enabled,
        min_quality_score,
    };

    let mut priorities: HashMap<String, u32> = sites
        .iter()
        .filter_map(|s| s.priority.map(|p| (s.domain.clone(), p)))
        .collect();
    let mut domain_order = ordered_domains(&sites);

    let outcomes = fan_out(state, &sites, &ladder_cfg).await;
    let mut sources_used: Vec<SourceUsage> = Vec::new();
    let mut raw: Vec<Article> = Vec::new();
    collect_outcomes(outcomes, &mut sources_used, &mut raw);

    let (mut kept, mut filtered_out) = pipeline.run(raw.clone(), &priorities);

    // Deep search: supplement with the next-priority sites and rebuild
    // the pool, but only for the default (no explicit domains) path.
    if !explicit_domains && kept.len() < count {
        let extra_sites: Vec<Site> = state
            .registry
            .deep_search_sites()
            .into_iter()
            .cloned()
            .collect();
        if !extra_sites.is_empty() {
            info!(
                shortfall = count - kept.len(),
                extra_sites = extra_sites.len(),
                "deep search engaged"
            );
            state.metrics.increment("top_news_deep_search");
            for site in &extra_sites {
                if let Some(p) = site.priority {
                    priorities.insert(site.domain.clone(), p);
                }
            }
            domain_order = ordered_domains(
                &sites
                    .iter()
                    .chain(extra_sites.iter())
                    .cloned()
                    .collect::<Vec<_>>(),
            );
            let extra_outcomes = fan_out(state, &extra_sites, &ladder_cfg).await;
            collect_outcomes(extra_outcomes, &mut sources_used, &mut raw);
            let (rebuilt, dropped) = pipeline.run(raw.clone(), &priorities);
            kept = rebuilt;
            filtered_out = dropped;
        }
    }

    let total_articles = kept.len();
    let distinct_domains = {
        let mut d: Vec<&str> = kept.iter().map(|a| a.source_domain.as_str()).collect();
        d.sort_unstable();
        d.dedup();
        d.len()
    };
    let articles = if distinct_domains >= 2 {
        diversity::round_robin(kept, count, &domain_order)
    } else {
        let mut kept = kept;
        kept.truncate(count);
        kept
    };

    // Fan-out completion order is nondeterministic; keep the report stable.
    sources_used.sort_by(|a, b| a.domain.cmp(&b.domain));

    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    let response = TopNewsResponse {
        sources_used,
        articles,
        total_articles,
        duration_ms,
        quality_filter_enabled,
        min_quality_score,
        filtered_out,
    };

    if response.articles.is_empty() {
        state.metrics.increment("get_top_news_empty");
    } else {
        state.metrics.increment("get_top_news_success");
        if let Ok(value) = serde_json::to_value(&response) {
            state.cache.put(&key, value);
        }
    }
    state
        .metrics
        .record_duration_ms("get_top_news_duration_ms", duration_ms);
    info!(
        article_count = response.articles.len(),
        sources = response.sources_used.len(),
        duration_ms,
        "get_top_news completed"
    );

    Ok(response)
}

fn ordered_domains(sites: &[Site]) -> Vec<String> {
    let mut ordered: Vec<&Site> = sites.iter().collect();
    ordered.sort_by_key(|s| (s.priority.unwrap_or(u32::MAX), s.domain.clone()));
    ordered.iter().map(|s| s.domain.clone()).collect()
}

fn collect_outcomes(
    outcomes: Vec<(Site, LadderOutcome)>,
    sources_used: &mut Vec<SourceUsage>,
    raw: &mut Vec<Article>,
) {
    for (site, outcome) in outcomes {
        if outcome.is_empty() {
            continue;
        }
        sources_used.push(SourceUsage {
            domain: site.domain.clone(),
            source: outcome.source_used.clone(),
            count: outcome.articles.len(),
        });
        for mut article in outcome.articles {
            if article.source_domain.is_empty() {
                article.source_domain = site.domain.clone();
            }
            raw.push(article);
        }
    }
}

//! Priority-tiered fallback ladder for a single site.
//!
//! Tiers run in ascending order; sources within a tier fan out in
//! parallel. A tier that survives dedup with at least the article
//! threshold wins and the ladder stops (greedy, no cross-tier merging).
//! Otherwise the largest non-empty tier result is remembered and
//! returned, flagged as degraded, with a note naming the tiers tried.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::TIER_DEADLINE_SECS;
use crate::dedup;
use crate::fetch::{RedirectResolver, SourceFetch};
use crate::metrics::Metrics;
use crate::quality_gate;
use crate::types::{Article, FetchOutcome, Site, SourceKind};

#[derive(Debug, Clone)]
pub struct LadderConfig {
    /// Minimum surviving articles for a tier to satisfy the ladder.
    pub threshold: usize,
    pub fuzzy_title_threshold: f64,
    pub last_n_days: i64,
    /// Within-tier fan-out width; 1 when parallel fetching is disabled.
    pub pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct LadderOutcome {
    pub articles: Vec<Article>,
    /// Human-readable label, e.g. `tier 2 [google_news]`, or `none`.
    pub source_used: String,
    /// True when no tier met the threshold.
    pub degraded: bool,
    pub message: Option<String>,
}

impl LadderOutcome {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

fn tier_label(tier: u8, kinds: &[SourceKind]) -> String {
    let mut names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    format!("tier {} [{}]", tier, names.join(", "))
}

async fn fetch_one_source(
    fetcher: &dyn SourceFetch,
    resolver: &dyn RedirectResolver,
    source: &crate::types::Source,
    domain: &str,
    cfg: &LadderConfig,
    metrics: &Metrics,
) -> (SourceKind, crate::types::SourceResult) {
    let result = fetcher.fetch(source, domain).await;
    let result = match (source.kind, result.outcome) {
        (SourceKind::GoogleNews, FetchOutcome::Ok) => {
            let gated = quality_gate::apply(resolver, result.articles, cfg.last_n_days, Utc::now()).await;
            if gated.passed {
                crate::types::SourceResult {
                    articles: gated.articles,
                    outcome: FetchOutcome::Ok,
                }
            } else {
                metrics.increment("quality_gate_discarded");
                crate::types::SourceResult::empty(FetchOutcome::HttpError)
            }
        }
        _ => result,
    };
    (source.kind, result)
}

/// Run the ladder for one site.
pub fn run_ladder<'a>(
    fetcher: &'a dyn SourceFetch,
    resolver: &'a dyn RedirectResolver,
    site: &'a Site,
    cfg: &'a LadderConfig,
    metrics: &'a Metrics,
) -> Pin<Box<dyn Future<Output = LadderOutcome> + Send + 'a>> {
    Box::pin(async move {
    let mut tiers: BTreeMap<u8, Vec<&crate::types::Source>> = BTreeMap::new();
    for source in &site.sources {
        tiers.entry(source.priority).or_default().push(source);
    }

    let mut tiers_tried: Vec<u8> = Vec::new();
    let mut best: Option<(u8, Vec<Article>, Vec<SourceKind>)> = None;

    for (&tier, sources) in &tiers {
        tiers_tried.push(tier);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(TIER_DEADLINE_SECS);

        let mut fetches: Vec<Pin<Box<dyn Future<Output = (SourceKind, crate::types::SourceResult)> + Send + '_>>> =
            Vec::with_capacity(sources.len());
        for source in sources.iter() {
            fetches.push(Box::pin(fetch_one_source(
                fetcher,
                resolver,
                source,
                &site.domain,
                cfg,
                metrics,
            )));
        }

        let mut tier_articles: Vec<Article> = Vec::new();
        let mut contributing: Vec<SourceKind> = Vec::new();
        let mut pending = stream::iter(fetches).buffer_unordered(cfg.pool_size.max(1));
        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((kind, result))) => {
                    metrics.increment(&format!("source_{}", result.outcome.as_str()));
                    if !result.articles.is_empty() {
                        contributing.push(kind);
                        tier_articles.extend(result.articles);
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(domain = %site.domain, tier, "tier deadline reached, using partial results");
                    break;
                }
            }
        }

        let deduped = dedup::dedup_articles(tier_articles, cfg.fuzzy_title_threshold, |_| {
            tier as u32
        });

        info!(
            domain = %site.domain,
            tier,
            article_count = deduped.len(),
            "tier finished"
        );

        if deduped.len() >= cfg.threshold {
            metrics.increment("ladder_tier_satisfied");
            return LadderOutcome {
                source_used: tier_label(tier, &contributing),
                articles: deduped,
                degraded: false,
                message: None,
            };
        }

        let best_len = best.as_ref().map(|(_, a, _)| a.len()).unwrap_or(0);
        if !deduped.is_empty() && deduped.len() > best_len {
            best = Some((tier, deduped, contributing));
        }
    }

    let tiers_list = tiers_tried
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    match best {
        Some((tier, articles, kinds)) => {
            metrics.increment("ladder_degraded");
            let message = format!(
                "Tried tiers {tiers_list}; best result {} article(s) from tier {tier}, below the threshold of {}.",
                articles.len(),
                cfg.threshold
            );
            LadderOutcome {
                source_used: tier_label(tier, &kinds),
                articles,
                degraded: true,
                message: Some(message),
            }
        }
        None => {
            metrics.increment("ladder_exhausted");
            let message = format!(
                "No articles found from {} in the last {} days. Tried tiers {tiers_list} \
                 (official RSS, RSSHub, Google News, scraper). The site may not have published \
                 recent content or may be blocking requests.",
                site.domain, cfg.last_n_days
            );
            LadderOutcome {
                articles: Vec::new(),
                source_used: "none".to_string(),
                degraded: true,
                message: Some(message),
            }
        }
    }
    })
}

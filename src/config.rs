//! Runtime configuration: environment settings, the `sites.json`
//! registry, and domain matching for user-supplied tokens.
//!
//! Settings are read once at startup; the site list is immutable for the
//! life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::types::{Site, Source};

// Engine constants. The recent-news cap and thresholds interact with the
// ladder and the filters; change with care.
pub const MAX_RECENT_DAYS: i64 = 15;
pub const DEFAULT_ARTICLE_COUNT: usize = 10;
pub const MIN_ARTICLES_THRESHOLD: usize = 5;
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const SCRAPER_TIMEOUT_MS: u64 = 5000;
pub const TOP_NEWS_SITE_LIMIT: usize = 12;
pub const FUZZY_TITLE_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 35.0;
pub const FETCH_POOL_SIZE: usize = 8;
pub const TIER_DEADLINE_SECS: u64 = 10;
pub const DEEP_SEARCH_EXTRA_SITES: usize = 8;

const ENV_CONFIG_PATH: &str = "NEWSNEXUS_CONFIG_PATH";

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(default)
}

/// Process-wide settings, loaded from `NEWSNEXUS_*` environment
/// variables with documented defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_articles: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub rate_limit: usize,
    pub rate_window_secs: u64,
    pub parallel: bool,
    pub config_path: PathBuf,
    pub deep_scrape: bool,
    pub deep_scrape_max: usize,
    pub deep_scrape_timeout_ms: u64,
    pub summary_length: usize,
    pub deep_workers: usize,
    /// Token-Jaccard threshold for fuzzy title dedup.
    pub fuzzy_title_threshold: f64,
    pub min_quality_score: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_articles: 50,
            cache_ttl_secs: 300,
            cache_capacity: 1000,
            rate_limit: 10,
            rate_window_secs: 60,
            parallel: true,
            config_path: PathBuf::from("sites.json"),
            deep_scrape: true,
            deep_scrape_max: 10,
            deep_scrape_timeout_ms: 2000,
            summary_length: 500,
            deep_workers: 5,
            fuzzy_title_threshold: FUZZY_TITLE_THRESHOLD,
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let d = Settings::default();
        Self {
            max_articles: env_parse("NEWSNEXUS_MAX_ARTICLES", d.max_articles),
            cache_ttl_secs: env_parse("NEWSNEXUS_CACHE_TTL", d.cache_ttl_secs),
            cache_capacity: env_parse("NEWSNEXUS_CACHE_CAPACITY", d.cache_capacity),
            rate_limit: env_parse("NEWSNEXUS_RATE_LIMIT", d.rate_limit),
            rate_window_secs: env_parse("NEWSNEXUS_RATE_WINDOW", d.rate_window_secs),
            parallel: env_bool("NEWSNEXUS_PARALLEL", d.parallel),
            config_path: std::env::var(ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.config_path),
            deep_scrape: env_bool("NEWSNEXUS_DEEP_SCRAPE", d.deep_scrape),
            deep_scrape_max: env_parse("NEWSNEXUS_DEEP_SCRAPE_MAX", d.deep_scrape_max),
            deep_scrape_timeout_ms: env_parse(
                "NEWSNEXUS_DEEP_SCRAPE_TIMEOUT",
                d.deep_scrape_timeout_ms,
            ),
            summary_length: env_parse("NEWSNEXUS_SUMMARY_LENGTH", d.summary_length),
            deep_workers: env_parse("NEWSNEXUS_DEEP_WORKERS", d.deep_workers),
            fuzzy_title_threshold: env_parse(
                "NEWSNEXUS_FUZZY_TITLE_THRESHOLD",
                d.fuzzy_title_threshold,
            ),
            min_quality_score: env_parse("NEWSNEXUS_MIN_QUALITY_SCORE", d.min_quality_score),
        }
    }
}

/// Raw site entry as it appears on disk; invalid entries are skipped
/// with a warning instead of failing the whole load.
#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(default)]
    name: String,
    domain: Option<String>,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    sources: Vec<Source>,
}

/// Immutable site registry with O(1) exact lookup and fuzzy token
/// resolution for user-supplied domains.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
    by_domain: HashMap<String, usize>,
}

impl SiteRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading site config from {}", path.display()))?;
        let entries: Vec<RawSite> =
            serde_json::from_str(&raw).context("site config must be a JSON array")?;

        let mut sites = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(domain) = entry.domain else {
                warn!("skipping site config entry without a domain");
                continue;
            };
            if entry.sources.is_empty() {
                warn!(domain = %domain, "skipping site with no sources");
                continue;
            }
            let domain = domain.trim().to_lowercase();
            let domain = domain.strip_prefix("www.").unwrap_or(&domain).to_string();
            sites.push(Site {
                name: entry.name,
                domain,
                priority: entry.priority,
                sources: entry.sources,
            });
        }

        info!(count = sites.len(), path = %path.display(), "loaded site configurations");
        Ok(Self::from_sites(sites))
    }

    pub fn from_sites(sites: Vec<Site>) -> Self {
        let by_domain = sites
            .iter()
            .enumerate()
            .map(|(i, s)| (s.domain.clone(), i))
            .collect();
        Self { sites, by_domain }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site priority by canonical domain, for scoring and ordering.
    pub fn priority_of(&self, domain: &str) -> Option<u32> {
        self.by_domain
            .get(domain)
            .and_then(|&i| self.sites[i].priority)
    }

    /// Resolve a user token: exact match, then `token.`-prefix, then
    /// substring. Ambiguity prefers the smaller priority, then the
    /// lexicographically smaller domain.
    pub fn find(&self, token: &str) -> Option<&Site> {
        let token = token.trim().to_lowercase();
        let token = token.strip_prefix("www.").unwrap_or(&token).to_string();
        if token.is_empty() {
            return None;
        }

        if let Some(&i) = self.by_domain.get(&token) {
            return Some(&self.sites[i]);
        }

        let prefix = format!("{token}.");
        let prefix_hit = self.best_match(|s| s.domain.starts_with(&prefix));
        if prefix_hit.is_some() {
            return prefix_hit;
        }
        self.best_match(|s| s.domain.contains(&token))
    }

    fn best_match(&self, pred: impl Fn(&Site) -> bool) -> Option<&Site> {
        self.sites
            .iter()
            .filter(|s| pred(s))
            .min_by(|a, b| {
                a.priority
                    .unwrap_or(u32::MAX)
                    .cmp(&b.priority.unwrap_or(u32::MAX))
                    .then_with(|| a.domain.cmp(&b.domain))
            })
    }

    /// Prioritized sites (1..=12) ordered for top-news, capped at the
    /// site limit.
    pub fn top_news_sites(&self) -> Vec<&Site> {
        let mut eligible: Vec<&Site> = self
            .sites
            .iter()
            .filter(|s| matches!(s.priority, Some(p) if (1..=12).contains(&p)))
            .collect();
        eligible.sort_by_key(|s| (s.priority.unwrap_or(u32::MAX), s.domain.clone()));
        eligible.truncate(TOP_NEWS_SITE_LIMIT);
        eligible
    }

    /// Next-priority sites for the deep-search pass: everything
    /// prioritized beyond the top-news band, ascending, capped.
    pub fn deep_search_sites(&self) -> Vec<&Site> {
        let mut extra: Vec<&Site> = self
            .sites
            .iter()
            .filter(|s| matches!(s.priority, Some(p) if p > 12))
            .collect();
        extra.sort_by_key(|s| (s.priority.unwrap_or(u32::MAX), s.domain.clone()));
        extra.truncate(DEEP_SEARCH_EXTRA_SITES);
        extra
    }

    pub fn priority_site_count(&self) -> usize {
        self.sites
            .iter()
            .filter(|s| matches!(s.priority, Some(p) if (1..=12).contains(&p)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceKind, Source};

    fn site(domain: &str, priority: Option<u32>) -> Site {
        Site {
            name: domain.to_string(),
            domain: domain.to_string(),
            priority,
            sources: vec![Source {
                kind: SourceKind::OfficialRss,
                url: format!("https://{domain}/rss"),
                priority: 1,
                timeout_ms: None,
            }],
        }
    }

    fn registry() -> SiteRegistry {
        SiteRegistry::from_sites(vec![
            site("techcrunch.com", Some(2)),
            site("theverge.com", Some(1)),
            site("wired.com", None),
            site("economictimes.indiatimes.com", Some(6)),
            site("timesofindia.indiatimes.com", Some(3)),
        ])
    }

    #[test]
    fn exact_and_www_lookup() {
        let r = registry();
        assert_eq!(r.find("techcrunch.com").unwrap().domain, "techcrunch.com");
        assert_eq!(r.find("www.techcrunch.com").unwrap().domain, "techcrunch.com");
    }

    #[test]
    fn prefix_match_beats_substring() {
        let r = registry();
        assert_eq!(r.find("techcrunch").unwrap().domain, "techcrunch.com");
        assert_eq!(r.find("wired").unwrap().domain, "wired.com");
    }

    #[test]
    fn ambiguous_substring_prefers_smaller_priority() {
        let r = registry();
        // "indiatimes" is a substring of two domains; priority 3 wins.
        assert_eq!(
            r.find("indiatimes").unwrap().domain,
            "timesofindia.indiatimes.com"
        );
    }

    #[test]
    fn unknown_token_is_none() {
        assert!(registry().find("nosuchsite").is_none());
    }

    #[test]
    fn top_news_excludes_unprioritized_and_orders_by_priority() {
        let r = registry();
        let domains: Vec<&str> = r.top_news_sites().iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(
            domains,
            vec![
                "theverge.com",
                "techcrunch.com",
                "timesofindia.indiatimes.com",
                "economictimes.indiatimes.com"
            ]
        );
    }

    #[test]
    fn load_skips_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(
            &path,
            r#"[
                {"name": "Good", "domain": "WWW.Good.com", "priority": 1,
                 "sources": [{"type": "official_rss", "url": "https://good.com/rss", "priority": 1}]},
                {"name": "No domain", "priority": 2,
                 "sources": [{"type": "official_rss", "url": "https://x.com/rss", "priority": 1}]},
                {"name": "No sources", "domain": "empty.com", "sources": []}
            ]"#,
        )
        .unwrap();

        let registry = SiteRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sites()[0].domain, "good.com");
    }

    #[test]
    fn load_rejects_missing_or_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SiteRegistry::load(&dir.path().join("absent.json")).is_err());
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(SiteRegistry::load(&bad).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn settings_read_environment_overrides() {
        std::env::set_var("NEWSNEXUS_CACHE_TTL", "42");
        std::env::set_var("NEWSNEXUS_RATE_LIMIT", "3");
        std::env::set_var("NEWSNEXUS_PARALLEL", "false");
        let s = Settings::from_env();
        assert_eq!(s.cache_ttl_secs, 42);
        assert_eq!(s.rate_limit, 3);
        assert!(!s.parallel);
        std::env::remove_var("NEWSNEXUS_CACHE_TTL");
        std::env::remove_var("NEWSNEXUS_RATE_LIMIT");
        std::env::remove_var("NEWSNEXUS_PARALLEL");

        let defaults = Settings::from_env();
        assert_eq!(defaults.cache_ttl_secs, 300);
        assert_eq!(defaults.rate_limit, 10);
        assert!(defaults.parallel);
    }
}

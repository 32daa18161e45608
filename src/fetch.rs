//! HTTP fetching: shared client, retry policy, and the source-fetch
//! seam the ladder is built against.
//!
//! `SourceFetch`/`RedirectResolver` are the only places the engine
//! touches the network, which keeps the ladder and the quality gate
//! testable with stub implementations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::{Settings, DEFAULT_TIMEOUT_MS, SCRAPER_TIMEOUT_MS};
use crate::feed;
use crate::metrics::Metrics;
use crate::scrape::{self, DeepScrapeConfig};
use crate::types::{FetchOutcome, Source, SourceKind, SourceResult};
use crate::validate;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const RETRY_BACKOFF_MS: u64 = 300;
const RETRY_BACKOFF_CAP_MS: u64 = 1000;
const MAX_RETRIES: u32 = 1;
const REDIRECT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared client with a browser UA and feed-friendly Accept headers.
pub fn build_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "application/rss+xml, application/xml, application/atom+xml, text/xml, text/html, */*",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .gzip(true)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Fetch one source to completion.
#[async_trait]
pub trait SourceFetch: Send + Sync {
    async fn fetch(&self, source: &Source, site_domain: &str) -> SourceResult;
}

/// Resolve a redirect URL to its final location (used by the Google
/// News quality gate).
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Option<String>;
}

/// Production fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: Client,
    max_articles: usize,
    deep_scrape: bool,
    deep_cfg: DeepScrapeConfig,
    /// Process-wide scrape pool shared by every request.
    scrape_pool: Arc<Semaphore>,
    metrics: Arc<Metrics>,
}

impl HttpFetcher {
    pub fn new(settings: &Settings, metrics: Arc<Metrics>) -> Self {
        Self {
            client: build_client(),
            max_articles: settings.max_articles,
            deep_scrape: settings.deep_scrape,
            deep_cfg: DeepScrapeConfig {
                max_articles: settings.deep_scrape_max,
                timeout: Duration::from_millis(settings.deep_scrape_timeout_ms),
                summary_length: settings.summary_length,
            },
            scrape_pool: Arc::new(Semaphore::new(settings.deep_workers.max(1))),
            metrics,
        }
    }

    /// GET a URL with one retry on connect errors and 5xx/429, backing
    /// off exponentially (capped at 1s). Other 4xx are terminal.
    async fn fetch_body(&self, url: &str, timeout: Duration) -> Result<String, FetchOutcome> {
        if validate::validate_url(url).is_err() {
            warn!(url, "rejected invalid source URL");
            self.metrics.increment("fetch_rejected");
            return Err(FetchOutcome::HttpError);
        }

        let started = Instant::now();
        let mut outcome = FetchOutcome::HttpError;

        for attempt in 0..=MAX_RETRIES {
            match self.client.get(url).timeout(timeout).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        match resp.text().await {
                            Ok(body) => {
                                let ms = started.elapsed().as_secs_f64() * 1000.0;
                                self.metrics.record_duration_ms("fetch_duration_ms", ms);
                                self.metrics.increment("fetch_success");
                                debug!(url, duration_ms = ms, "fetched");
                                return Ok(body);
                            }
                            Err(_) => {
                                outcome = FetchOutcome::HttpError;
                                break;
                            }
                        }
                    }
                    if status.is_server_error() || status.as_u16() == 429 {
                        outcome = FetchOutcome::HttpError;
                    } else {
                        // Terminal 4xx.
                        self.metrics.increment("fetch_http_error");
                        return Err(FetchOutcome::HttpError);
                    }
                }
                Err(e) if e.is_timeout() => {
                    self.metrics.increment("fetch_timeout");
                    return Err(FetchOutcome::Timeout);
                }
                Err(e) if e.is_connect() => {
                    outcome = FetchOutcome::HttpError;
                    debug!(url, attempt, error = %e, "connect error");
                }
                Err(_) => {
                    self.metrics.increment("fetch_error");
                    return Err(FetchOutcome::HttpError);
                }
            }

            if attempt < MAX_RETRIES {
                let backoff = (RETRY_BACKOFF_MS << attempt).min(RETRY_BACKOFF_CAP_MS);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
        }

        self.metrics.increment("fetch_failed");
        self.metrics
            .record_duration_ms("fetch_failed_duration_ms", started.elapsed().as_secs_f64() * 1000.0);
        Err(outcome)
    }
}

#[async_trait]
impl SourceFetch for HttpFetcher {
    async fn fetch(&self, source: &Source, site_domain: &str) -> SourceResult {
        let default_timeout = match source.kind {
            SourceKind::Scraper => SCRAPER_TIMEOUT_MS,
            _ => DEFAULT_TIMEOUT_MS,
        };
        let timeout = Duration::from_millis(source.timeout_ms.unwrap_or(default_timeout));

        let body = match self.fetch_body(&source.url, timeout).await {
            Ok(body) => body,
            Err(outcome) => return SourceResult::empty(outcome),
        };

        match source.kind {
            SourceKind::OfficialRss | SourceKind::Rsshub | SourceKind::GoogleNews => {
                match feed::parse_feed(
                    &body,
                    site_domain,
                    self.max_articles,
                    self.deep_cfg.summary_length,
                ) {
                    Ok(articles) if articles.is_empty() => {
                        SourceResult::empty(FetchOutcome::Empty)
                    }
                    Ok(articles) => SourceResult {
                        articles,
                        outcome: FetchOutcome::Ok,
                    },
                    Err(e) => {
                        warn!(url = %source.url, error = %e, "feed parse failed");
                        self.metrics.increment("fetch_parse_error");
                        SourceResult::empty(FetchOutcome::ParseError)
                    }
                }
            }
            SourceKind::Scraper => {
                let mut articles =
                    scrape::extract_candidates(&body, site_domain, &source.url, self.max_articles);
                if articles.is_empty() {
                    return SourceResult::empty(FetchOutcome::Empty);
                }
                if self.deep_scrape {
                    articles = scrape::deep_scrape_articles(
                        &self.client,
                        &self.scrape_pool,
                        articles,
                        &self.deep_cfg,
                        &self.metrics,
                    )
                    .await;
                }
                SourceResult {
                    articles,
                    outcome: FetchOutcome::Ok,
                }
            }
        }
    }
}

#[async_trait]
impl RedirectResolver for HttpFetcher {
    async fn resolve(&self, url: &str) -> Option<String> {
        let resp = self
            .client
            .head(url)
            .timeout(REDIRECT_RESOLVE_TIMEOUT)
            .send()
            .await
            .ok()?;
        Some(resp.url().to_string())
    }
}

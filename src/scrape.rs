//! Homepage scraping and deep article-page extraction.
//!
//! The homepage pass collects candidate article anchors from semantic
//! `<article>` containers, falling back to headline links under the
//! publisher's own host. The deep pass fetches individual article pages
//! through the process-wide scrape pool and recovers publication date,
//! author, and a lead-paragraph summary.
//!
//! `scraper::Html` is not `Send`; every parse is confined to a sync
//! helper so no document is ever held across an await point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, info};
use url::Url;

use crate::dates;
use crate::metrics::Metrics;
use crate::types::Article;
use crate::validate::{self, MAX_TITLE_LENGTH};

const MIN_TITLE_LENGTH: usize = 10;
const MAX_CONTAINERS: usize = 30;

#[derive(Debug, Clone)]
pub struct DeepScrapeConfig {
    pub max_articles: usize,
    pub timeout: Duration,
    pub summary_length: usize,
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static ARTICLE_SEL: Lazy<Selector> = Lazy::new(|| sel("article, [itemtype*='Article']"));
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| sel("h1, h2, h3, h4"));
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| sel("a[href]"));
static HEADLINE_ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| sel("h1 a[href], h2 a[href], h3 a[href]"));
static TIME_SEL: Lazy<Selector> = Lazy::new(|| sel("time[datetime]"));
static SUMMARY_SEL: Lazy<Selector> = Lazy::new(|| sel("p"));
static JSON_LD_SEL: Lazy<Selector> = Lazy::new(|| sel("script[type='application/ld+json']"));
static META_DATE_SEL: Lazy<Selector> = Lazy::new(|| {
    sel("meta[property='article:published_time'], meta[property='og:published_time'], meta[name='date'], meta[name='publish-date'], meta[itemprop='datePublished']")
});
static META_AUTHOR_SEL: Lazy<Selector> = Lazy::new(|| sel("meta[name='author']"));
static AUTHOR_SEL: Lazy<Selector> =
    Lazy::new(|| sel("[itemprop='author'], [rel='author'], [class*='byline'], [class*='author-name'], .author"));
static CONTENT_SEL: Lazy<Selector> = Lazy::new(|| {
    sel("article, [itemprop='articleBody'], [class*='article-body'], [class*='article-content'], [class*='post-content'], [class*='entry-content'], [class*='story-body'], main, [role='main']")
});

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// Resolve an anchor href to an absolute, validated URL.
fn resolve_href(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }
    let resolved = base.join(href).ok()?;
    validate::validate_url(resolved.as_str()).ok()?;
    Some(resolved.to_string())
}

fn host_matches(url: &str, domain: &str) -> bool {
    validate::host_of(url)
        .map(|h| h == domain || h.ends_with(&format!(".{domain}")))
        .unwrap_or(false)
}

/// Extract candidate articles from a homepage.
pub fn extract_candidates(
    html: &str,
    domain: &str,
    base_url: &str,
    max_articles: usize,
) -> Vec<Article> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let mut articles: Vec<Article> = Vec::new();
    let mut seen_urls: Vec<String> = Vec::new();

    // Pass 1: semantic article containers.
    for container in doc.select(&ARTICLE_SEL).take(MAX_CONTAINERS) {
        if articles.len() >= max_articles {
            break;
        }
        if let Some(article) = extract_from_container(container, domain, &base) {
            if !seen_urls.contains(&article.url) {
                seen_urls.push(article.url.clone());
                articles.push(article);
            }
        }
    }

    // Pass 2: headline anchors under the publisher's host, when the
    // semantic pass came up short.
    if articles.len() < 5 {
        for anchor in doc.select(&HEADLINE_ANCHOR_SEL) {
            if articles.len() >= max_articles {
                break;
            }
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve_href(href, &base) else {
                continue;
            };
            if !host_matches(&url, domain) || seen_urls.contains(&url) {
                continue;
            }
            let title = validate::sanitize_text(&element_text(anchor), MAX_TITLE_LENGTH);
            if title.len() < MIN_TITLE_LENGTH {
                continue;
            }
            seen_urls.push(url.clone());
            articles.push(Article {
                title,
                url,
                published_at: None,
                summary: String::new(),
                author: None,
                tags: Vec::new(),
                source_domain: domain.to_string(),
                quality_score: None,
            });
        }
    }

    debug!(domain, count = articles.len(), "scraped homepage candidates");
    articles
}

fn extract_from_container(container: ElementRef<'_>, domain: &str, base: &Url) -> Option<Article> {
    let title_el = container
        .select(&TITLE_SEL)
        .next()
        .or_else(|| container.select(&ANCHOR_SEL).next())?;
    let title = validate::sanitize_text(&element_text(title_el), MAX_TITLE_LENGTH);
    if title.len() < MIN_TITLE_LENGTH {
        return None;
    }

    let anchor = title_el
        .select(&ANCHOR_SEL)
        .next()
        .or_else(|| {
            if title_el.value().name() == "a" {
                Some(title_el)
            } else {
                None
            }
        })
        .or_else(|| container.select(&ANCHOR_SEL).next())?;
    let url = resolve_href(anchor.value().attr("href")?, base)?;

    let published_at = container
        .select(&TIME_SEL)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(|v| dates::parse_published(v, Utc::now()));

    let summary = container
        .select(&SUMMARY_SEL)
        .next()
        .map(|p| validate::sanitize_text(&element_text(p), 500))
        .unwrap_or_default();

    Some(Article {
        title,
        url,
        published_at,
        summary,
        author: None,
        tags: Vec::new(),
        source_domain: domain.to_string(),
        quality_score: None,
    })
}

/// What a deep pass over one article page can recover.
#[derive(Debug, Default)]
pub struct PageDetails {
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
}

/// Parse one article page. Sync on purpose (`Html` is `!Send`).
pub fn extract_page_details(html: &str, summary_length: usize) -> PageDetails {
    let doc = Html::parse_document(html);
    let now = Utc::now();
    let mut details = PageDetails::default();

    // Structured data first.
    for script in doc.select(&JSON_LD_SEL) {
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        let obj = match &data {
            serde_json::Value::Array(items) => items.first().cloned().unwrap_or_default(),
            other => other.clone(),
        };
        if details.published_at.is_none() {
            for key in ["datePublished", "dateCreated"] {
                if let Some(v) = obj.get(key).and_then(|v| v.as_str()) {
                    details.published_at = dates::parse_published(v, now);
                    if details.published_at.is_some() {
                        break;
                    }
                }
            }
        }
        if details.author.is_none() {
            let author = match obj.get("author") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Object(o)) => {
                    o.get("name").and_then(|n| n.as_str()).map(String::from)
                }
                _ => None,
            };
            details.author = author
                .map(|a| validate::sanitize_text(&a, 100))
                .filter(|a| !a.is_empty());
        }
    }

    if details.published_at.is_none() {
        details.published_at = doc
            .select(&META_DATE_SEL)
            .filter_map(|m| m.value().attr("content"))
            .find_map(|v| dates::parse_published(v, now));
    }
    if details.published_at.is_none() {
        details.published_at = doc
            .select(&TIME_SEL)
            .filter_map(|t| t.value().attr("datetime"))
            .find_map(|v| dates::parse_published(v, now));
    }

    if details.author.is_none() {
        details.author = doc
            .select(&META_AUTHOR_SEL)
            .filter_map(|m| m.value().attr("content"))
            .map(|a| validate::sanitize_text(a, 100))
            .find(|a| !a.is_empty());
    }
    if details.author.is_none() {
        details.author = doc
            .select(&AUTHOR_SEL)
            .map(|el| validate::sanitize_text(&element_text(el), 100))
            .find(|a| !a.is_empty() && a.len() < 100);
    }

    // Lead paragraphs from the main content container, whole page as a
    // fallback.
    let container = doc.select(&CONTENT_SEL).next();
    let paragraphs: Vec<String> = match container {
        Some(c) => c
            .select(&SUMMARY_SEL)
            .map(|p| element_text(p))
            .filter(|t| t.trim().len() > 30)
            .collect(),
        None => doc
            .select(&SUMMARY_SEL)
            .map(|p| element_text(p))
            .filter(|t| t.trim().len() > 30)
            .collect(),
    };
    let content = paragraphs.join(" ");
    details.summary = generate_summary(&content, summary_length);

    details
}

const SUMMARY_SKIP_PHRASES: &[&str] = &[
    "click here",
    "read more",
    "subscribe",
    "sign up",
    "cookie",
    "privacy policy",
    "terms of service",
];

/// First meaningful sentences of `content`, up to `max_length` chars.
pub fn generate_summary(content: &str, max_length: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut parts: Vec<String> = Vec::new();
    let mut used = 0usize;

    for sentence in split_sentences(&collapsed) {
        let sentence = sentence.trim();
        if sentence.len() < 20 {
            continue;
        }
        let lower = sentence.to_lowercase();
        if SUMMARY_SKIP_PHRASES.iter().any(|skip| lower.contains(skip)) {
            continue;
        }
        if used + sentence.len() + 1 <= max_length {
            used += sentence.len() + 1;
            parts.push(sentence.to_string());
        } else {
            let remaining = max_length.saturating_sub(used);
            if remaining > 50 {
                let cut: String = sentence.chars().take(remaining.saturating_sub(3)).collect();
                let truncated = match cut.rfind(' ') {
                    Some(pos) => format!("{}...", &cut[..pos]),
                    None => format!("{cut}..."),
                };
                parts.push(truncated);
            }
            break;
        }
    }

    validate::sanitize_text(&parts.join(" "), max_length)
}

/// Split on sentence-ending punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            let next = i + 1;
            if next >= bytes.len() || bytes[next] == b' ' {
                out.push(&text[start..next]);
                start = next;
            }
        }
        i += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Deep scrape the first `max_articles` candidates through the shared
/// pool, merging recovered details into each article. Order preserved;
/// failures leave the original candidate untouched.
pub async fn deep_scrape_articles(
    client: &Client,
    pool: &Arc<Semaphore>,
    articles: Vec<Article>,
    cfg: &DeepScrapeConfig,
    metrics: &Arc<Metrics>,
) -> Vec<Article> {
    let take = cfg.max_articles.min(articles.len());
    if take == 0 {
        return articles;
    }
    let started = Instant::now();
    let (head, tail) = {
        let mut articles = articles;
        let tail = articles.split_off(take);
        (articles, tail)
    };

    let tasks = head.into_iter().map(|mut article| {
        let client = client.clone();
        let pool = Arc::clone(pool);
        let cfg = cfg.clone();
        async move {
            let Ok(_permit) = pool.acquire_owned().await else {
                return (article, false);
            };
            let body = match client
                .get(&article.url)
                .timeout(cfg.timeout)
                .send()
                .await
                .and_then(|r| r.error_for_status())
            {
                Ok(resp) => match resp.text().await {
                    Ok(body) => body,
                    Err(_) => return (article, false),
                },
                Err(_) => return (article, false),
            };
            let details = extract_page_details(&body, cfg.summary_length);
            if details.summary.len() > article.summary.len() {
                article.summary = details.summary;
            }
            if article.published_at.is_none() {
                article.published_at = details.published_at;
            }
            if article.author.is_none() {
                article.author = details.author;
            }
            (article, true)
        }
    });

    let mut enhanced: Vec<Article> = Vec::with_capacity(take + tail.len());
    let mut success = 0u64;
    for (article, ok) in join_all(tasks).await {
        if ok {
            success += 1;
        }
        enhanced.push(article);
    }
    enhanced.extend(tail);

    let ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics.record_duration_ms("deep_scrape_batch_duration_ms", ms);
    metrics.increment_by("deep_scrape_success", success);
    metrics.increment_by("deep_scrape_failed", take as u64 - success);
    info!(scraped = take, success, duration_ms = ms, "deep scrape batch finished");

    enhanced
}

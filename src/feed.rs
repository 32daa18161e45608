//! RSS 2.0 and Atom parsing into normalized `Article`s.
//!
//! Feeds are deserialized with `quick_xml` + serde structs; unknown
//! fields are dropped silently. `source_domain` is always the site that
//! owns the source, regardless of what the feed declares.

use anyhow::{anyhow, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::dates;
use crate::types::Article;
use crate::validate::{self, MAX_TITLE_LENGTH};

const MAX_TAGS: usize = 5;
const MAX_TAG_LENGTH: usize = 50;
const MAX_AUTHOR_LENGTH: usize = 100;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));

/// Strip markup and entities from feed-supplied text, then sanitize.
fn clean_text(raw: &str, max_length: usize) -> String {
    let without_tags = RE_TAGS.replace_all(raw, "");
    let decoded = html_escape::decode_html_entities(&without_tags);
    validate::sanitize_text(&decoded, max_length)
}

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "category")]
    categories: Vec<TextNode>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link")]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<TextNode>,
    author: Option<AtomAuthor>,
    #[serde(rename = "category")]
    categories: Vec<AtomCategory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomAuthor {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// Element that may carry attributes (`type="html"`, CDATA, ...); only
/// the text content matters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextNode {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// Parse a feed body. RSS 2.0 is tried first, Atom second; whichever
/// yields entries wins.
pub fn parse_feed(
    xml: &str,
    site_domain: &str,
    max_articles: usize,
    summary_length: usize,
) -> Result<Vec<Article>> {
    let looks_atom = xml.contains("<feed");

    if !looks_atom {
        if let Ok(rss) = quick_xml::de::from_str::<Rss>(xml) {
            return Ok(rss_articles(rss, site_domain, max_articles, summary_length));
        }
    }
    if let Ok(atom) = quick_xml::de::from_str::<AtomFeed>(xml) {
        return Ok(atom_articles(atom, site_domain, max_articles, summary_length));
    }
    // Wrong sniff or malformed prologue: try the other format once.
    if let Ok(rss) = quick_xml::de::from_str::<Rss>(xml) {
        return Ok(rss_articles(rss, site_domain, max_articles, summary_length));
    }
    Err(anyhow!("body is neither RSS 2.0 nor Atom"))
}

fn rss_articles(
    rss: Rss,
    site_domain: &str,
    max_articles: usize,
    summary_length: usize,
) -> Vec<Article> {
    let now = Utc::now();
    rss.channel
        .items
        .into_iter()
        .take(max_articles)
        .filter_map(|item| {
            let title = clean_text(item.title.as_deref()?, MAX_TITLE_LENGTH);
            let link = item.link?.trim().to_string();
            if title.is_empty() || validate::validate_url(&link).is_err() {
                return None;
            }
            let published_at = item
                .pub_date
                .as_deref()
                .and_then(|d| dates::parse_published(d, now));
            let summary = item
                .description
                .as_deref()
                .map(|d| clean_text(d, summary_length))
                .unwrap_or_default();
            let author = item
                .author
                .as_deref()
                .map(|a| clean_text(a, MAX_AUTHOR_LENGTH))
                .filter(|a| !a.is_empty());
            let tags = item
                .categories
                .into_iter()
                .take(MAX_TAGS)
                .filter_map(|c| c.value)
                .map(|t| clean_text(&t, MAX_TAG_LENGTH))
                .filter(|t| !t.is_empty())
                .collect();
            Some(Article {
                title,
                url: link,
                published_at,
                summary,
                author,
                tags,
                source_domain: site_domain.to_string(),
                quality_score: None,
            })
        })
        .collect()
}

fn atom_articles(
    feed: AtomFeed,
    site_domain: &str,
    max_articles: usize,
    summary_length: usize,
) -> Vec<Article> {
    let now = Utc::now();
    feed.entries
        .into_iter()
        .take(max_articles)
        .filter_map(|entry| {
            let title = clean_text(entry.title.and_then(|t| t.value).as_deref()?, MAX_TITLE_LENGTH);
            let link = entry
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| entry.links.first())
                .and_then(|l| l.href.clone())?;
            let link = link.trim().to_string();
            if title.is_empty() || validate::validate_url(&link).is_err() {
                return None;
            }
            let published_at = entry
                .published
                .as_deref()
                .or(entry.updated.as_deref())
                .and_then(|d| dates::parse_published(d, now));
            let summary = entry
                .summary
                .and_then(|s| s.value)
                .map(|s| clean_text(&s, summary_length))
                .unwrap_or_default();
            let author = entry
                .author
                .and_then(|a| a.name)
                .map(|a| clean_text(&a, MAX_AUTHOR_LENGTH))
                .filter(|a| !a.is_empty());
            let tags = entry
                .categories
                .into_iter()
                .take(MAX_TAGS)
                .filter_map(|c| c.term)
                .map(|t| clean_text(&t, MAX_TAG_LENGTH))
                .filter(|t| !t.is_empty())
                .collect();
            Some(Article {
                title,
                url: link,
                published_at,
                summary,
                author,
                tags,
                source_domain: site_domain.to_string(),
                quality_score: None,
            })
        })
        .collect()
}

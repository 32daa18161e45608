//! Input validation, sanitization, and URL canonicalization.
//!
//! Everything user-supplied passes through here before it reaches the
//! fetch path: domains, URLs, count/day clamps, and filter keywords.
//! Display strings are HTML-escaped; filter keywords get the permissive
//! variant (matching needs the raw characters).

use std::net::{Ipv4Addr, Ipv6Addr};

use url::Url;

use crate::error::ToolError;

pub const MAX_URL_LENGTH: usize = 2000;
pub const MAX_TITLE_LENGTH: usize = 500;
pub const MAX_FILTER_LENGTH: usize = 100;

/// Validate and canonicalize a domain: lowercase, strip one leading
/// `www.`, require 3..=253 chars of `[a-z0-9.-]` with at least one dot,
/// no leading/trailing dot, and no IP literal.
pub fn validate_domain(raw: &str) -> Result<String, ToolError> {
    let domain = raw.trim().to_lowercase();
    let domain = domain.strip_prefix("www.").unwrap_or(&domain).to_string();

    if domain.len() < 3 || domain.len() > 253 {
        return Err(ToolError::BadInput(
            "domain must be between 3 and 253 characters".into(),
        ));
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ToolError::BadInput("domain contains invalid characters".into()));
    }
    if !domain.contains('.') {
        return Err(ToolError::BadInput("domain must contain a dot".into()));
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ToolError::BadInput("domain must not start or end with a dot".into()));
    }
    if domain.parse::<Ipv4Addr>().is_ok() || domain.parse::<Ipv6Addr>().is_ok() {
        return Err(ToolError::BadInput("IP literals are not accepted".into()));
    }
    Ok(domain)
}

/// Validate a URL for fetching: http(s) only, syntactic host, no
/// loopback/private/link-local IP literals, bounded length.
pub fn validate_url(raw: &str) -> Result<Url, ToolError> {
    if raw.len() > MAX_URL_LENGTH {
        return Err(ToolError::BadInput("URL too long".into()));
    }
    let url = Url::parse(raw).map_err(|_| ToolError::BadInput("URL does not parse".into()))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ToolError::BadInput("only http(s) URLs are allowed".into())),
    }
    let host = url
        .host_str()
        .ok_or_else(|| ToolError::BadInput("URL has no host".into()))?;
    if host.eq_ignore_ascii_case("localhost") {
        return Err(ToolError::BadInput("loopback host rejected".into()));
    }
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        if ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified() {
            return Err(ToolError::BadInput("private or loopback IP rejected".into()));
        }
    }
    if let Some(stripped) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        if let Ok(ip) = stripped.parse::<Ipv6Addr>() {
            if ip.is_loopback() || ip.is_unspecified() {
                return Err(ToolError::BadInput("private or loopback IP rejected".into()));
            }
        }
    } else if let Ok(ip) = host.parse::<Ipv6Addr>() {
        if ip.is_loopback() || ip.is_unspecified() {
            return Err(ToolError::BadInput("private or loopback IP rejected".into()));
        }
    }
    Ok(url)
}

/// Clamp the article count: `[1, 100]`, defaulting when absent.
pub fn clamp_count(count: Option<i64>, default: usize) -> Result<usize, ToolError> {
    match count {
        None => Ok(default),
        Some(n) if (1..=100).contains(&n) => Ok(n as usize),
        Some(n) => Err(ToolError::BadInput(format!(
            "count must be between 1 and 100, got {n}"
        ))),
    }
}

/// Clamp the lookback window: `[1, 365]` when the caller sets it, the
/// recent-news default otherwise. Returns `(days, caller_specified)`.
pub fn clamp_last_n_days(
    last_n_days: Option<i64>,
    default: i64,
) -> Result<(i64, bool), ToolError> {
    match last_n_days {
        None => Ok((default, false)),
        Some(n) if (1..=365).contains(&n) => Ok((n, true)),
        Some(n) => Err(ToolError::BadInput(format!(
            "lastNDays must be between 1 and 365, got {n}"
        ))),
    }
}

/// Strip control characters.
fn strip_control(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

/// Sanitize a display string: drop control chars, escape HTML, collapse
/// whitespace, bound length (in chars).
pub fn sanitize_text(raw: &str, max_length: usize) -> String {
    let cleaned = strip_control(raw);
    let escaped = cleaned
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;");
    let collapsed = escaped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_length).collect::<String>().trim().to_string()
}

/// Sanitize a filter keyword: permissive (no escaping), lowercased,
/// bounded. Empty output means "no filter".
pub fn sanitize_filter(raw: &str) -> String {
    let cleaned = strip_control(raw);
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .take(MAX_FILTER_LENGTH)
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Canonical URL form: lowercase scheme+host (the parser does both),
/// drop `utm_*` params and the fragment, strip a single trailing slash.
/// Path case is preserved. Idempotent. Unparseable input falls back to a
/// trimmed copy so dedup still has a stable key.
pub fn canonical_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().trim_end_matches('/').to_string();
    };
    url.set_fragment(None);
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut qs = url.query_pairs_mut();
        qs.clear();
        for (k, v) in &kept {
            qs.append_pair(k, v);
        }
        drop(qs);
    }
    let mut s = url.to_string();
    if s.ends_with('/') {
        s.pop();
    }
    s
}

/// Host of a URL, if it parses.
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw).ok().and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

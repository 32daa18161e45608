//! Lenient publication-date parsing.
//!
//! Feeds carry dates in RFC 2822, RFC 3339, and a long tail of ad-hoc
//! formats; scraped pages add ISO dates without zones. Everything is
//! normalized to UTC. Unparseable input yields `None` rather than an
//! error so a bad date never sinks an otherwise good article.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Zoned formats tried after the RFC parsers.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%d %b %Y %H:%M:%S %z",
];

/// Naive formats, assumed UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only formats, assumed midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

/// Parse a date string from a feed entry or article page.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // Common timezone abbreviations chrono's %z cannot digest.
    let s = s.replace("GMT", "+0000").replace("UTC", "+0000");
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s.replace(' ', "T")) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Parse and clamp: dates from the future become `now` (some feeds ship
/// scheduled-publication timestamps).
pub fn parse_published(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    parse_date(raw).map(|dt| if dt > now { now } else { dt })
}

//! Deduplication across collected articles.
//!
//! Two passes over a deterministically ordered list: canonical-URL
//! equality, then normalized-title equality with a fuzzy token-Jaccard
//! pass on top. Parallel fetches deliver articles in nondeterministic
//! order, so the list is stable-sorted first to make "first seen"
//! reproducible.

use std::collections::HashSet;

use crate::types::Article;
use crate::validate::canonical_url;

/// Lowercase, collapse whitespace, strip trailing sentence punctuation.
pub fn normalize_title(title: &str) -> String {
    let mut out = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }
    out
}

fn title_tokens(normalized: &str) -> HashSet<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Token Jaccard similarity of two normalized titles.
pub fn title_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

struct AcceptedTitle {
    tokens: HashSet<String>,
    /// Index into the output list, for score-based replacement.
    pos: usize,
}

/// Deduplicate, preserving first-seen order after the deterministic
/// pre-sort. `priority_of` supplies the secondary sort key (source tier
/// within a ladder run, site priority when merging across sites).
pub fn dedup_articles(
    mut articles: Vec<Article>,
    fuzzy_threshold: f64,
    priority_of: impl Fn(&Article) -> u32,
) -> Vec<Article> {
    articles.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| priority_of(a).cmp(&priority_of(b)))
            .then_with(|| a.url.cmp(&b.url))
    });

    let mut out: Vec<Article> = Vec::with_capacity(articles.len());
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut accepted: Vec<AcceptedTitle> = Vec::new();

    'next_article: for article in articles {
        if !seen_urls.insert(canonical_url(&article.url)) {
            continue;
        }

        let normalized = normalize_title(&article.title);
        if !seen_titles.insert(normalized.clone()) {
            continue;
        }

        let tokens = title_tokens(&normalized);
        for prior in &accepted {
            if title_similarity(&tokens, &prior.tokens) >= fuzzy_threshold {
                // Near-duplicate: the earlier article wins unless the
                // newcomer carries a strictly higher quality score.
                let earlier = &out[prior.pos];
                if let (Some(old), Some(new)) = (earlier.quality_score, article.quality_score) {
                    if new > old {
                        out[prior.pos] = article;
                    }
                }
                continue 'next_article;
            }
        }

        accepted.push(AcceptedTitle {
            tokens,
            pos: out.len(),
        });
        out.push(article);
    }

    out
}

//! Round-robin diversity selection across source domains.
//!
//! Buckets articles by domain, ranks each bucket by quality then
//! freshness, and takes one from each non-empty bucket in turn so a
//! single prolific site cannot crowd out the rest.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use crate::types::Article;

/// Select up to `count` articles, one per domain per round. Domains are
/// visited in `domain_order`; domains present in the articles but not in
/// the order list are appended alphabetically.
pub fn round_robin(articles: Vec<Article>, count: usize, domain_order: &[String]) -> Vec<Article> {
    let mut buckets: BTreeMap<String, Vec<Article>> = BTreeMap::new();
    for article in articles {
        buckets
            .entry(article.source_domain.clone())
            .or_default()
            .push(article);
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| {
            let qa = a.quality_score.unwrap_or(0.0);
            let qb = b.quality_score.unwrap_or(0.0);
            qb.partial_cmp(&qa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.published_at.cmp(&a.published_at))
                .then_with(|| a.url.cmp(&b.url))
        });
    }

    let mut order: Vec<String> = domain_order
        .iter()
        .filter(|d| buckets.contains_key(*d))
        .cloned()
        .collect();
    for domain in buckets.keys() {
        if !order.contains(domain) {
            order.push(domain.clone());
        }
    }

    let mut queues: BTreeMap<String, VecDeque<Article>> = buckets
        .into_iter()
        .map(|(domain, bucket)| (domain, VecDeque::from(bucket)))
        .collect();

    let mut selected = Vec::with_capacity(count.min(16));
    while selected.len() < count {
        let mut progressed = false;
        for domain in &order {
            if selected.len() >= count {
                break;
            }
            if let Some(queue) = queues.get_mut(domain) {
                if let Some(article) = queue.pop_front() {
                    selected.push(article);
                    progressed = true;
                }
            }
        }
        if !progressed {
            break;
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn art(domain: &str, n: usize, score: f64) -> Article {
        Article {
            title: format!("{domain} story {n}"),
            url: format!("https://{domain}/{n}"),
            published_at: Some(Utc::now() - Duration::hours(n as i64)),
            summary: String::new(),
            author: None,
            tags: vec![],
            source_domain: domain.into(),
            quality_score: Some(score),
        }
    }

    fn corpus(domains: &[&str], per_domain: usize) -> Vec<Article> {
        domains
            .iter()
            .flat_map(|d| (0..per_domain).map(move |n| art(d, n, 50.0 + n as f64)))
            .collect()
    }

    #[test]
    fn five_domains_with_eight_each_yield_two_apiece() {
        let domains = ["a.com", "b.com", "c.com", "d.com", "e.com"];
        let order: Vec<String> = domains.iter().map(|s| s.to_string()).collect();
        let selected = round_robin(corpus(&domains, 8), 10, &order);
        assert_eq!(selected.len(), 10);
        for d in domains {
            let n = selected.iter().filter(|a| a.source_domain == d).count();
            assert_eq!(n, 2, "domain {d} should contribute exactly 2");
        }
    }

    #[test]
    fn per_domain_counts_differ_by_at_most_one() {
        let domains = ["a.com", "b.com", "c.com"];
        let order: Vec<String> = domains.iter().map(|s| s.to_string()).collect();
        let selected = round_robin(corpus(&domains, 5), 10, &order);
        let counts: Vec<usize> = domains
            .iter()
            .map(|d| selected.iter().filter(|a| a.source_domain == *d).count())
            .collect();
        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        assert!(max - min <= 1, "counts {counts:?}");
    }

    #[test]
    fn exhausted_buckets_are_skipped() {
        let mut articles = corpus(&["a.com"], 1);
        articles.extend(corpus(&["b.com"], 5));
        let order = vec!["a.com".to_string(), "b.com".to_string()];
        let selected = round_robin(articles, 4, &order);
        assert_eq!(selected.len(), 4);
        assert_eq!(selected.iter().filter(|a| a.source_domain == "a.com").count(), 1);
        assert_eq!(selected.iter().filter(|a| a.source_domain == "b.com").count(), 3);
    }

    #[test]
    fn best_article_per_domain_comes_first() {
        let articles = vec![art("a.com", 1, 40.0), art("a.com", 2, 90.0)];
        let selected = round_robin(articles, 1, &["a.com".to_string()]);
        assert_eq!(selected[0].quality_score, Some(90.0));
    }
}

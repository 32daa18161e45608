//! Bounded TTL cache with LRU eviction for request-keyed results.
//!
//! Keys are SHA-256 digests of `(operation, domain-or-TOP, normalized
//! filters)`. Entries expire after a uniform TTL; a hit moves the key to
//! the most-recently-used end; inserting past capacity evicts the LRU
//! entry. All operations are O(1) amortized behind a single mutex.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Build the cache key for a request.
pub fn request_key(
    operation: &str,
    domain: &str,
    topic: Option<&str>,
    location: Option<&str>,
    last_n_days: i64,
    count: usize,
) -> String {
    let mut hasher = Sha256::new();
    for part in [
        operation,
        domain,
        topic.unwrap_or(""),
        location.unwrap_or(""),
        &last_n_days.to_string(),
        &count.to_string(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[derive(Debug)]
struct Entry {
    value: Value,
    inserted_at: Instant,
    /// Recency sequence; stale queue slots are skipped on eviction.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    map: HashMap<String, Entry>,
    order: VecDeque<(u64, String)>,
    next_seq: u64,
}

#[derive(Debug)]
pub struct Cache {
    inner: Mutex<Inner>,
    ttl: Duration,
    capacity: usize,
}

impl Cache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh hit returns a clone and refreshes recency; an expired entry
    /// is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        let fresh = match inner.map.get(key) {
            Some(entry) => now.duration_since(entry.inserted_at) < self.ttl,
            None => return None,
        };
        if !fresh {
            inner.map.remove(key);
            return None;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let entry = inner.map.get_mut(key).expect("entry checked above");
        entry.seq = seq;
        let value = entry.value.clone();
        inner.order.push_back((seq, key.to_string()));
        Some(value)
    }

    pub fn put(&self, key: &str, value: Value) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.map.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: Instant::now(),
                seq,
            },
        );
        inner.order.push_back((seq, key.to_string()));

        while inner.map.len() > self.capacity {
            let Some((seq, candidate)) = inner.order.pop_front() else {
                break;
            };
            let is_current = inner
                .map
                .get(&candidate)
                .map(|e| e.seq == seq)
                .unwrap_or(false);
            if is_current {
                inner.map.remove(&candidate);
            }
            // Stale slot: the key was touched since, skip it.
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.map.clear();
        inner.order.clear();
    }
}

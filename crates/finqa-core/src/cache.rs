//! Time-windowed answer cache
//!
//! Keys are SHA-256 digests of the lower-cased question. Whitespace and
//! punctuation are left alone, so "Top fund?" and "Top fund" are different keys.
//! Expired entries stay in the map until the next store for the same key
//! overwrites them; nothing is ever evicted.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at < ttl
    }
}

pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key_for(question: &str) -> String {
        format!("{:x}", Sha256::digest(question.to_lowercase().as_bytes()))
    }

    pub fn lookup(&self, question: &str) -> Option<CacheEntry> {
        self.lookup_at(question, Utc::now())
    }

    /// Fresh entry for `question` as of `now`; expired entries count as a miss
    pub fn lookup_at(&self, question: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        self.entries
            .get(&Self::key_for(question))
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.value().clone())
    }

    pub fn store(&self, question: &str, answer: &str) -> CacheEntry {
        self.store_at(question, answer, Utc::now())
    }

    /// Insert or overwrite the entry for `question`
    pub fn store_at(&self, question: &str, answer: &str, now: DateTime<Utc>) -> CacheEntry {
        let entry = CacheEntry {
            key: Self::key_for(question),
            answer: answer.to_string(),
            created_at: now,
        };
        self.entries.insert(entry.key.clone(), entry.clone());
        entry
    }

    /// Stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_case_insensitive_only() {
        let key = ResponseCache::key_for("Top Fund?");
        assert_eq!(key, ResponseCache::key_for("top fund?"));
        assert_ne!(key, ResponseCache::key_for("top fund"));
        assert_ne!(key, ResponseCache::key_for("top  fund?"));
        assert_eq!(key.len(), 64);
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResponseCache::new();
        let t0 = Utc::now();
        cache.store_at("What is the AUM of Fund ABC?", "The answer is 1.00", t0);

        let hit = cache
            .lookup_at("what is the aum of fund abc?", t0 + Duration::minutes(59))
            .unwrap();
        assert_eq!(hit.answer, "The answer is 1.00");
        assert_eq!(hit.created_at, t0);
    }

    #[test]
    fn test_expired_entry_is_miss_but_kept() {
        let cache = ResponseCache::new();
        let t0 = Utc::now();
        cache.store_at("q", "old", t0);

        assert!(cache.lookup_at("q", t0 + Duration::hours(1)).is_none());
        assert_eq!(cache.len(), 1);

        let t1 = t0 + Duration::hours(2);
        cache.store_at("q", "new", t1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup_at("q", t1).unwrap().answer, "new");
    }

    #[test]
    fn test_custom_ttl() {
        let cache = ResponseCache::with_ttl(Duration::seconds(10));
        let t0 = Utc::now();
        cache.store_at("q", "a", t0);
        assert!(cache.lookup_at("q", t0 + Duration::seconds(9)).is_some());
        assert!(cache.lookup_at("q", t0 + Duration::seconds(10)).is_none());
        assert_eq!(cache.ttl(), Duration::seconds(10));
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let cache = ResponseCache::default();
        assert!(cache.is_empty());
        assert!(cache.lookup("anything").is_none());
    }
}

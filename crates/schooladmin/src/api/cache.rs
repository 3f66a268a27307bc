//! TTL caching for directory lookups and a circuit breaker for the remote API.

use super::types::ClassInfo;
use crate::timetable::Teacher;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A key derived from a bearer credential, used for cache lookups and sessions.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a key from a bearer token.
    ///
    /// The token is hashed so it is never kept in memory as a map key.
    pub fn from_token(token: &str) -> Self {
        Self::hash_parts(&[token])
    }

    /// Creates a key for data that is scoped to both a credential and a school.
    pub fn for_school(token: &str, school_id: &str) -> Self {
        Self::hash_parts(&[token, school_id])
    }

    fn hash_parts(parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

#[derive(Clone)]
struct CachedEntry<V> {
    value: V,
    cached_at: Instant,
    ttl: Duration,
}

impl<V> CachedEntry<V> {
    fn is_fresh(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// Thread-safe cache whose entries expire after a fixed time.
pub struct TtlCache<V> {
    entries: DashMap<SessionKey, CachedEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Gets a cached value if it exists and hasn't expired.
    pub fn get(&self, key: &SessionKey) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh() {
            return Some(entry.value.clone());
        }
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: SessionKey, value: V) {
        self.entries.insert(
            key,
            CachedEntry {
                value,
                cached_at: Instant::now(),
                ttl: self.default_ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &SessionKey) {
        self.entries.remove(key);
    }

    /// Removes expired entries that were never read again.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| entry.is_fresh());
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let expired = self.entries.iter().filter(|e| !e.is_fresh()).count();
        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total.saturating_sub(expired),
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

impl std::ops::Add for CacheStats {
    type Output = CacheStats;

    fn add(self, rhs: Self) -> Self::Output {
        CacheStats {
            total_entries: self.total_entries + rhs.total_entries,
            expired_entries: self.expired_entries + rhs.expired_entries,
            active_entries: self.active_entries + rhs.active_entries,
        }
    }
}

/// Teacher and class directories, cached per credential and school.
pub struct DirectoryCache {
    pub teachers: TtlCache<Vec<Teacher>>,
    pub classes: TtlCache<Vec<ClassInfo>>,
}

impl DirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            teachers: TtlCache::new(ttl),
            classes: TtlCache::new(ttl),
        }
    }

    pub fn invalidate(&self, key: &SessionKey) {
        self.teachers.invalidate(key);
        self.classes.invalidate(key);
    }

    pub fn cleanup_expired(&self) {
        self.teachers.cleanup_expired();
        self.classes.cleanup_expired();
    }

    pub fn stats(&self) -> CacheStats {
        self.teachers.stats() + self.classes.stats()
    }
}

/// Circuit breaker for protecting against repeated failures.
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    last_failure: Mutex<Option<Instant>>,
    threshold: u32,
    recovery_time: Duration,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker.
    ///
    /// # Parameters
    /// - `threshold`: number of consecutive failures before the breaker opens;
    ///   zero disables the breaker
    /// - `recovery_time`: how long to reject requests once open
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            last_failure: Mutex::new(None),
            threshold,
            recovery_time,
        }
    }

    /// Returns true if the circuit breaker is open (blocking requests).
    pub fn is_open(&self) -> bool {
        if self.threshold == 0 || self.failure_count() < self.threshold {
            return false;
        }

        let recovered = match self.last_failure.lock() {
            Ok(guard) => guard.map_or(true, |last| last.elapsed() > self.recovery_time),
            Err(_) => true,
        };
        if recovered {
            self.reset();
            return false;
        }

        true
    }

    /// Records a successful request, resetting the failure count.
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }

    /// Records a failed request. Opens the breaker once the threshold is reached.
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_failure.lock() {
            *guard = Some(Instant::now());
        }
    }

    /// Resets the circuit breaker to its closed state.
    pub fn reset(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_failure.lock() {
            *guard = None;
        }
    }

    /// Returns the current consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }
}

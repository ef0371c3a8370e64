// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Memoized chain validation results.
//!
//! Entries expire lazily: an expired entry is treated as absent on `get` and
//! swept on `put` once the map grows past its capacity. The capacity is a
//! soft cap; live entries are never evicted.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use appstore_jws_validation::PublicKey;
use parking_lot::Mutex;

/// How long a validated chain is trusted without re-validation.
pub const CACHE_TIME_LIMIT: Duration = Duration::from_secs(15 * 60);

/// Size above which `put` sweeps expired entries.
pub const MAXIMUM_CACHE_SIZE: usize = 32;

/// Exact leaf and intermediate DER of a validated chain.
///
/// The two certificates are kept apart so that no two pairs can collide by
/// shifting bytes from one certificate to the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainCacheKey {
    leaf_der: Vec<u8>,
    intermediate_der: Vec<u8>,
}

impl ChainCacheKey {
    pub fn new(leaf_der: &[u8], intermediate_der: &[u8]) -> Self {
        Self {
            leaf_der: leaf_der.to_vec(),
            intermediate_der: intermediate_der.to_vec(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    public_key: PublicKey,
    expires_at: SystemTime,
}

#[derive(Debug)]
pub struct TrustCache {
    entries: Mutex<HashMap<ChainCacheKey, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for TrustCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustCache {
    pub fn new() -> Self {
        Self::with_limits(CACHE_TIME_LIMIT, MAXIMUM_CACHE_SIZE)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    pub fn get(&self, key: &ChainCacheKey, now: SystemTime) -> Option<PublicKey> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.public_key.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: ChainCacheKey, public_key: PublicKey, now: SystemTime) {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                public_key,
                expires_at: now + self.ttl,
            },
        );
        if entries.len() > self.capacity {
            entries.retain(|_, entry| now < entry.expires_at);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appstore_jws_test_utils::TestPki;
    use appstore_jws_x509::ParsedCertificate;
    use std::time::UNIX_EPOCH;

    fn key_of(der: &[u8]) -> PublicKey {
        ParsedCertificate::from_der(der).unwrap().public_key().unwrap()
    }

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn entry_expires_after_ttl() {
        let pki = TestPki::generate();
        let cache = TrustCache::new();
        let key = ChainCacheKey::new(&pki.leaf.der, &pki.intermediate.der);

        cache.put(key.clone(), key_of(&pki.leaf.der), t(0));
        assert!(cache.get(&key, t(14 * 60 + 59)).is_some());
        assert!(cache.get(&key, t(15 * 60)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_do_not_collide_across_boundaries() {
        let a = ChainCacheKey::new(b"ab", b"c");
        let b = ChainCacheKey::new(b"a", b"bc");
        assert_ne!(a, b);

        let pki = TestPki::generate();
        let cache = TrustCache::new();
        cache.put(a.clone(), key_of(&pki.leaf.der), t(0));
        assert!(cache.get(&b, t(1)).is_none());
        assert!(cache.get(&a, t(1)).is_some());
    }

    #[test]
    fn sweep_only_removes_expired_entries() {
        let pki = TestPki::generate();
        let public_key = key_of(&pki.leaf.der);
        let cache = TrustCache::with_limits(Duration::from_secs(60), 2);

        cache.put(ChainCacheKey::new(b"1", b"x"), public_key.clone(), t(0));
        cache.put(ChainCacheKey::new(b"2", b"x"), public_key.clone(), t(100));
        assert_eq!(cache.len(), 2);

        // Third entry exceeds capacity: the expired first entry is swept.
        cache.put(ChainCacheKey::new(b"3", b"x"), public_key.clone(), t(101));
        assert_eq!(cache.len(), 2);

        // Nothing expired: the cap is exceeded rather than evicting live entries.
        cache.put(ChainCacheKey::new(b"4", b"x"), public_key, t(102));
        assert_eq!(cache.len(), 3);
    }
}

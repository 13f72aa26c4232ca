//! Host-side route cache.
//!
//! The request dispatch layer memoizes resolutions per path. The alias router
//! flushes the cache after publishing every new table.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::router::Resolver;
use super::table::Resolution;

/// A cache of routing decisions that must be discarded when routes change.
pub trait RouteCache: Send + Sync {
    fn flush(&self);
}

/// Bounded path -> resolution memo, misses included.
///
/// Every entry is tagged with the flush epoch it was resolved under. An entry
/// from an earlier epoch is a miss, so a lookup that raced a flush can land in
/// the map but is never served.
pub struct ResolutionCache {
    entries: DashMap<String, (u64, Option<Resolution>)>,
    capacity: usize,
    epoch: AtomicU64,
}

impl ResolutionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            epoch: AtomicU64::new(0),
        }
    }

    /// Resolve through the cache, falling back to the resolver on a miss.
    pub fn resolve_with(&self, resolver: &dyn Resolver, path: &str) -> Option<Resolution> {
        // Loaded before the table is read: a flush after this point retires the result
        let epoch = self.epoch.load(Ordering::Acquire);
        if let Some(hit) = self.entries.get(path) {
            let (tagged, resolution) = hit.value();
            if *tagged == epoch {
                return resolution.clone();
            }
        }

        let resolution = resolver.resolve(path);
        self.insert(epoch, path, resolution.clone());
        resolution
    }

    fn insert(&self, epoch: u64, path: &str, resolution: Option<Resolution>) {
        if self.epoch.load(Ordering::Acquire) != epoch {
            return;
        }
        if self.entries.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "Route cache full, clearing");
            self.entries.clear();
        }
        match self.entries.entry(path.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().0 < epoch {
                    slot.insert((epoch, resolution));
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((epoch, resolution));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RouteCache for ResolutionCache {
    fn flush(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let dropped = self.entries.len();
        self.entries.clear();
        tracing::debug!(dropped, "Flushed route cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::table::Captures;
    use crate::storage::models::ResourceId;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    struct CountingResolver {
        calls: AtomicUsize,
    }

    impl Resolver for CountingResolver {
        fn resolve(&self, path: &str) -> Option<Resolution> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (path == "hit").then(|| Resolution {
                resource_id: ResourceId(7),
                alias_path: "hit".to_string(),
                captures: Captures::default(),
            })
        }
    }

    fn resolver() -> CountingResolver {
        CountingResolver {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_memoizes_hits_and_misses() {
        let cache = ResolutionCache::new(16);
        let resolver = resolver();

        assert!(cache.resolve_with(&resolver, "hit").is_some());
        assert!(cache.resolve_with(&resolver, "hit").is_some());
        assert!(cache.resolve_with(&resolver, "miss").is_none());
        assert!(cache.resolve_with(&resolver, "miss").is_none());

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_flush_forces_fresh_lookup() {
        let cache = ResolutionCache::new(16);
        let resolver = resolver();

        cache.resolve_with(&resolver, "hit");
        cache.flush();
        assert!(cache.is_empty());

        cache.resolve_with(&resolver, "hit");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_result_from_before_flush_is_not_stored() {
        let cache = ResolutionCache::new(16);
        let epoch = cache.epoch.load(Ordering::Acquire);
        cache.flush();

        cache.insert(epoch, "hit", None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_landing_after_flush_is_not_served() {
        let cache = ResolutionCache::new(16);
        let resolver = resolver();
        let epoch = cache.epoch.load(Ordering::Acquire);

        // A lookup passed the epoch check, then a flush ran before its write landed
        cache.flush();
        cache.entries.insert("hit".to_string(), (epoch, None));

        assert!(cache.resolve_with(&resolver, "hit").is_some());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        // The fresh result replaced the stale one
        assert!(cache.resolve_with(&resolver, "hit").is_some());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    /// Resolver whose table changes, and whose cache is flushed, in the middle
    /// of a lookup.
    struct SwappingResolver<'a> {
        cache: &'a ResolutionCache,
        swapped: AtomicBool,
    }

    impl Resolver for SwappingResolver<'_> {
        fn resolve(&self, _path: &str) -> Option<Resolution> {
            let stale = !self.swapped.swap(true, Ordering::SeqCst);
            if stale {
                self.cache.flush();
                return None;
            }
            Some(Resolution {
                resource_id: ResourceId(9),
                alias_path: "promo".to_string(),
                captures: Captures::default(),
            })
        }
    }

    #[test]
    fn test_lookup_racing_a_flush_is_retried() {
        let cache = ResolutionCache::new(16);
        let resolver = SwappingResolver {
            cache: &cache,
            swapped: AtomicBool::new(false),
        };

        assert!(cache.resolve_with(&resolver, "promo").is_none());
        let resolution = cache.resolve_with(&resolver, "promo").expect("fresh table");
        assert_eq!(resolution.resource_id, ResourceId(9));
    }

    #[test]
    fn test_capacity_bound() {
        let cache = ResolutionCache::new(2);
        let resolver = resolver();

        cache.resolve_with(&resolver, "a");
        cache.resolve_with(&resolver, "b");
        cache.resolve_with(&resolver, "c");
        assert!(cache.len() <= 2);
    }
}

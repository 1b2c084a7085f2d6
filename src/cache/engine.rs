//! In-process cache engine.
//!
//! Namespaces live in a sharded concurrent map. Looking up an existing
//! namespace only touches the shard holding its name; a missing namespace is
//! created under that shard's entry lock, which re-checks for a concurrent
//! winner before installing. A namespace, once installed, is never replaced
//! until [`MemoryCache::shutdown`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::{debug, info};

use super::{CacheBackend, StoredValue};
use crate::types::{CacheConfig, CachedValue};
use crate::{MimirError, Result, telemetry};

/// moka refuses time-to-live values over 1000 years.
const MAX_TTL_SECS: i64 = 999 * 365 * 24 * 60 * 60;

/// One operation's slots.
struct Namespace {
    max_size: u64,
    time_to_live: Option<Duration>,
    entries: Cache<Option<String>, StoredValue>,
}

impl Namespace {
    fn new(config: &CacheConfig) -> Result<Self> {
        let time_to_live = time_to_live(config)?;
        let mut builder = Cache::builder()
            .max_capacity(config.max_size())
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = time_to_live {
            builder = builder.time_to_live(ttl);
        }
        Ok(Self {
            max_size: config.max_size(),
            time_to_live,
            entries: builder.build(),
        })
    }
}

/// Effective entry lifetime for `config`, `None` when entries never expire.
///
/// Positive amounts that truncate to zero seconds round up to one second.
fn time_to_live(config: &CacheConfig) -> Result<Option<Duration>> {
    if !config.expires() {
        return Ok(None);
    }
    let seconds = config
        .unit()
        .to_seconds(config.expiration())?
        .clamp(1, MAX_TTL_SECS);
    Ok(Some(Duration::from_secs(seconds.unsigned_abs())))
}

/// Snapshot of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub name: String,
    pub max_size: u64,
    /// `None` when entries never expire.
    pub time_to_live: Option<Duration>,
    /// Approximate; pending evictions may not be reflected yet.
    pub entry_count: u64,
}

/// Engine-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Namespaces currently installed.
    pub namespaces: usize,
    /// Namespaces created since construction, including ones dropped by
    /// [`MemoryCache::shutdown`].
    pub namespaces_created: u64,
}

/// In-memory [`CacheBackend`] with per-namespace LRU eviction and TTL.
///
/// ```rust
/// use mimir::{CacheBackend, CacheBackendExt, CacheConfig, MemoryCache};
///
/// # fn main() -> mimir::Result<()> {
/// let cache = MemoryCache::new();
/// cache.ensure_namespace("Repo.find(u32)", &CacheConfig::without_expiration(100)?)?;
/// cache.store("Repo.find(u32)", Some("7"), &"seven".to_string())?;
///
/// let hit = cache.retrieve::<String>("Repo.find(u32)", Some("7"))?;
/// assert_eq!(hit.value().as_deref(), Some("seven"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryCache {
    namespaces: DashMap<String, Arc<Namespace>>,
    created: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Configuration and size of namespace `name`, if it exists.
    pub fn namespace_info(&self, name: &str) -> Option<NamespaceInfo> {
        let namespace = self.namespace(name)?;
        namespace.entries.run_pending_tasks();
        Some(NamespaceInfo {
            name: name.to_string(),
            max_size: namespace.max_size,
            time_to_live: namespace.time_to_live,
            entry_count: namespace.entries.entry_count(),
        })
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            namespaces: self.namespaces.len(),
            namespaces_created: self.created.load(Ordering::Relaxed),
        }
    }

    /// Drop every namespace and its entries.
    ///
    /// The engine stays usable: later calls re-create namespaces on demand.
    pub fn shutdown(&self) {
        let names: Vec<String> = self
            .namespaces
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let mut dropped = 0usize;
        for name in names {
            if let Some((_, namespace)) = self.namespaces.remove(&name) {
                namespace.entries.invalidate_all();
                dropped += 1;
            }
        }
        info!(namespaces = dropped, "cache engine shut down");
    }
}

impl CacheBackend for MemoryCache {
    fn ensure_namespace(&self, name: &str, config: &CacheConfig) -> Result<()> {
        if self.namespaces.contains_key(name) {
            return Ok(());
        }

        // Entry holds the shard lock; a racing creator may have won already.
        let slot = match self.namespaces.entry(name.to_string()) {
            Entry::Occupied(_) => return Ok(()),
            Entry::Vacant(slot) => slot,
        };

        let namespace = Namespace::new(config)?;
        info!(
            namespace = name,
            max_size = namespace.max_size,
            ttl_secs = namespace.time_to_live.map(|ttl| ttl.as_secs()),
            "created cache namespace"
        );
        slot.insert(Arc::new(namespace));
        self.created.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(telemetry::NAMESPACES_CREATED_TOTAL, "namespace" => name.to_string())
            .increment(1);
        Ok(())
    }

    fn put(&self, namespace: &str, key: Option<&str>, value: StoredValue) -> Result<()> {
        let ns = self
            .namespace(namespace)
            .ok_or_else(|| MimirError::UnknownNamespace(namespace.to_string()))?;
        ns.entries.insert(key.map(str::to_owned), value);
        // Apply eviction now so capacity holds by the time put returns.
        ns.entries.run_pending_tasks();
        debug!(namespace, key, "stored cache entry");
        Ok(())
    }

    fn get(&self, namespace: &str, key: Option<&str>) -> CachedValue<StoredValue> {
        let Some(ns) = self.namespace(namespace) else {
            return CachedValue::NotFound;
        };
        ns.entries.get(&key.map(str::to_owned)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackendExt;
    use crate::time::TimeUnit;

    fn config(max_size: u64, expiration: i64, unit: TimeUnit) -> CacheConfig {
        CacheConfig::new(max_size, expiration, unit).unwrap()
    }

    #[test]
    fn ttl_rounds_sub_second_amounts_up() {
        let ttl = time_to_live(&config(1, 10, TimeUnit::Milliseconds)).unwrap();
        assert_eq!(ttl, Some(Duration::from_secs(1)));
    }

    #[test]
    fn ttl_is_none_without_expiration() {
        assert_eq!(time_to_live(&config(1, 0, TimeUnit::Days)).unwrap(), None);
        assert_eq!(time_to_live(&config(1, -1, TimeUnit::Unset)).unwrap(), None);
    }

    #[test]
    fn ttl_with_unset_unit_is_a_configuration_error() {
        let err = time_to_live(&config(1, 5, TimeUnit::Unset)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn ttl_is_clamped_for_huge_amounts() {
        let ttl = time_to_live(&config(1, i64::MAX, TimeUnit::Weeks))
            .unwrap()
            .unwrap();
        assert_eq!(ttl.as_secs(), MAX_TTL_SECS as u64);
    }

    #[test]
    fn existing_namespace_keeps_first_config() {
        let cache = MemoryCache::new();
        cache.ensure_namespace("ns", &config(5, 0, TimeUnit::Days)).unwrap();
        cache.ensure_namespace("ns", &config(9, 1, TimeUnit::Hours)).unwrap();

        let info = cache.namespace_info("ns").unwrap();
        assert_eq!(info.max_size, 5);
        assert_eq!(info.time_to_live, None);
        assert_eq!(cache.stats().namespaces_created, 1);
    }

    #[test]
    fn failed_creation_installs_nothing() {
        let cache = MemoryCache::new();
        assert!(cache.ensure_namespace("ns", &config(1, 5, TimeUnit::Unset)).is_err());
        assert!(cache.namespace_info("ns").is_none());
        assert_eq!(cache.stats().namespaces_created, 0);
    }

    #[test]
    fn put_into_unknown_namespace_fails() {
        let cache = MemoryCache::new();
        let err = cache.put("missing", None, StoredValue::new(1)).unwrap_err();
        assert!(matches!(err, MimirError::UnknownNamespace(name) if name == "missing"));
    }

    #[test]
    fn null_key_is_distinct_from_string_null() {
        let cache = MemoryCache::new();
        cache.ensure_namespace("ns", &config(10, 0, TimeUnit::Days)).unwrap();
        cache.store("ns", None, &"absent").unwrap();
        cache.store("ns", Some("null"), &"text").unwrap();

        assert_eq!(cache.retrieve::<&str>("ns", None).unwrap(), CachedValue::Found("absent"));
        assert_eq!(
            cache.retrieve::<&str>("ns", Some("null")).unwrap(),
            CachedValue::Found("text")
        );
    }
}

//! The caching interceptor.
//!
//! Whatever wraps an operation (a hand-written decorator, a proxy type, a
//! macro) describes each call as an [`OperationCall`] and hands the
//! interceptor a continuation for the real operation. Per call:
//!
//! 1. resolve the namespace configuration
//! 2. derive the operation and argument keys
//! 3. make sure the namespace exists
//! 4. look the argument key up; on a hit, return the cached copy
//! 5. on a miss, run the operation once, store its result, return it
//!
//! A failing operation stores nothing and its error reaches the caller
//! unchanged. A result the backend refuses to store is still returned, just
//! not cached.

mod builder;

pub use builder::{Mimir, MimirBuilder};

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheBackendExt};
use crate::keys::KeyGenerator;
use crate::types::{CacheConfig, CacheDefaults, CacheSettings, CachedValue, OperationCall};
use crate::{MimirError, Result, telemetry};

/// Namespace and key of one call.
struct Slot {
    namespace: String,
    key: Option<String>,
}

/// Transparent result cache for operations.
///
/// Cheap to share behind an `Arc`; all state lives in the backend.
///
/// ```rust
/// use mimir::{CacheSettings, Mimir, OperationCall};
///
/// struct Prices;
///
/// impl Prices {
///     fn quote(&self, symbol: &str) -> u64 {
///         symbol.len() as u64 * 100
///     }
/// }
///
/// # fn main() -> mimir::Result<()> {
/// let cache = Mimir::builder().build()?;
/// let prices = Prices;
///
/// let symbol = "ACME";
/// let call = OperationCall::on(&prices, "quote").arg(&symbol).build();
/// let quote: u64 = cache.call(&call, &CacheSettings::new(), || prices.quote(symbol))?;
/// assert_eq!(quote, 400);
/// # Ok(())
/// # }
/// ```
pub struct CacheInterceptor {
    backend: Arc<dyn CacheBackend>,
    key_generator: Arc<dyn KeyGenerator>,
    defaults: CacheDefaults,
    owner_settings: HashMap<String, CacheSettings>,
}

impl CacheInterceptor {
    pub(crate) fn new(
        backend: Arc<dyn CacheBackend>,
        key_generator: Arc<dyn KeyGenerator>,
        defaults: CacheDefaults,
        owner_settings: HashMap<String, CacheSettings>,
    ) -> Self {
        Self {
            backend,
            key_generator,
            defaults,
            owner_settings,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn defaults(&self) -> &CacheDefaults {
        &self.defaults
    }

    /// Resolve the namespace configuration for `call`.
    ///
    /// Each of max size, expiration amount and unit is taken from the first
    /// layer that sets it: `settings`, settings registered for the owner
    /// type, then the interceptor defaults. Operations without parameters
    /// always get a max size of 1.
    pub fn resolve_config(
        &self,
        call: &OperationCall<'_>,
        settings: &CacheSettings,
    ) -> Result<CacheConfig> {
        let settings = match self.owner_settings.get(call.owner_type()) {
            Some(owner) => settings.or(*owner),
            None => *settings,
        };
        let max_size = if call.parameter_types().is_empty() {
            1
        } else {
            settings.max_size.unwrap_or(self.defaults.max_size)
        };
        let expiration = settings.expiration.unwrap_or(self.defaults.expiration);
        let unit = settings.explicit_unit().unwrap_or(self.defaults.unit);
        CacheConfig::new(max_size, expiration, unit)
    }

    fn prepare(&self, call: &OperationCall<'_>, settings: &CacheSettings) -> Result<Slot> {
        let config = self.resolve_config(call, settings)?;
        let namespace = self.key_generator.operation_key(call);
        let key = self.key_generator.argument_key(call.arguments())?;
        self.backend.ensure_namespace(&namespace, &config)?;
        Ok(Slot { namespace, key })
    }

    fn lookup<T: Any + Clone>(&self, slot: &Slot) -> CachedValue<T> {
        let cached = self
            .backend
            .retrieve::<T>(&slot.namespace, slot.key.as_deref())
            .unwrap_or_else(|e| {
                // A value of another type is replaced on the next store.
                warn!(namespace = %slot.namespace, error = %e, "discarding mismatched cache entry");
                CachedValue::NotFound
            });
        let counter = if cached.was_found() {
            debug!(namespace = %slot.namespace, "cache hit");
            telemetry::CACHE_HITS_TOTAL
        } else {
            debug!(namespace = %slot.namespace, "cache miss");
            telemetry::CACHE_MISSES_TOTAL
        };
        metrics::counter!(counter, "namespace" => slot.namespace.clone()).increment(1);
        cached
    }

    /// Store a fresh result. A refused store leaves the result uncached
    /// but never fails the call.
    fn record<T: Any + Clone + Send + Sync>(&self, slot: &Slot, value: &T) {
        match self.backend.store(&slot.namespace, slot.key.as_deref(), value) {
            Ok(()) => {
                metrics::counter!(telemetry::CACHE_STORES_TOTAL, "namespace" => slot.namespace.clone())
                    .increment(1);
            }
            Err(e) => {
                warn!(namespace = %slot.namespace, error = %e, "result not cached");
            }
        }
    }

    fn note_failure(&self, slot: &Slot) {
        debug!(namespace = %slot.namespace, "operation failed, result not cached");
        metrics::counter!(telemetry::OPERATION_FAILURES_TOTAL, "namespace" => slot.namespace.clone())
            .increment(1);
    }

    /// Serve `call` from cache, or run `proceed` and cache its result.
    ///
    /// `proceed` runs at most once, and only on a miss. Its error is returned
    /// as is and nothing is cached. Failures before `proceed` runs (bad
    /// configuration, unencodable arguments) are converted into `E`.
    pub fn intercept<T, E, F>(
        &self,
        call: &OperationCall<'_>,
        settings: &CacheSettings,
        proceed: F,
    ) -> std::result::Result<T, E>
    where
        T: Any + Clone + Send + Sync,
        E: From<MimirError>,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let slot = self.prepare(call, settings)?;
        if let CachedValue::Found(value) = self.lookup(&slot) {
            return Ok(value);
        }
        let value = proceed().inspect_err(|_| self.note_failure(&slot))?;
        self.record(&slot, &value);
        Ok(value)
    }

    /// [`intercept`](Self::intercept) for an operation returning a future.
    ///
    /// Keys are derived before the returned future is first polled, so it
    /// holds no borrow of `call`'s arguments. Cache work itself never
    /// awaits.
    pub fn intercept_async<T, E, F, Fut>(
        &self,
        call: &OperationCall<'_>,
        settings: &CacheSettings,
        proceed: F,
    ) -> impl Future<Output = std::result::Result<T, E>>
    where
        T: Any + Clone + Send + Sync,
        E: From<MimirError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let prepared = self.prepare(call, settings);
        async move {
            let slot = prepared?;
            if let CachedValue::Found(value) = self.lookup(&slot) {
                return Ok(value);
            }
            let value = proceed().await.inspect_err(|_| self.note_failure(&slot))?;
            self.record(&slot, &value);
            Ok(value)
        }
    }

    /// [`intercept`](Self::intercept) for an operation that cannot fail.
    pub fn call<T, F>(&self, call: &OperationCall<'_>, settings: &CacheSettings, proceed: F) -> Result<T>
    where
        T: Any + Clone + Send + Sync,
        F: FnOnce() -> T,
    {
        self.intercept(call, settings, || Ok(proceed()))
    }
}

impl std::fmt::Debug for CacheInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInterceptor")
            .field("defaults", &self.defaults)
            .field("owner_settings", &self.owner_settings.len())
            .finish_non_exhaustive()
    }
}

//! Storage for cached results.
//!
//! [`CacheBackend`] is the whole contract between the interceptor and a
//! store: create a namespace, put a value, get a value. Values cross it as
//! [`StoredValue`]s, type-erased owned clones: storing clones the caller's
//! value, and every read clones the stored one, so neither side can reach
//! the other's copy.
//!
//! [`MemoryCache`] is the in-process implementation, one bounded LRU + TTL
//! moka cache per namespace.

mod engine;

pub use engine::{EngineStats, MemoryCache, NamespaceInfo};

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::types::{CacheConfig, CachedValue};
use crate::{MimirError, Result};

/// An owned cached value of any `Clone` type.
///
/// Cloning a `StoredValue` shares the stored copy; [`StoredValue::get`]
/// hands out a fresh clone of it. Values round-trip exactly, including
/// nested `Option`s and non-finite floats.
///
/// Isolation is as deep as the value's `Clone`: a value holding an
/// `Arc<Mutex<_>>` shares that interior with the cache.
#[derive(Clone)]
pub struct StoredValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl StoredValue {
    /// Take ownership of `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// A fresh clone of the value, if it is a `T`.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Type name of the stored value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for StoredValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Storage backend for cached results.
///
/// Keys are nullable: `None` is a valid key of its own (the slot shared by
/// zero-argument operations), distinct from every `Some`.
pub trait CacheBackend: Send + Sync {
    /// Create namespace `name` with `config` unless it already exists.
    ///
    /// Idempotent and safe to race; an existing namespace keeps its original
    /// configuration.
    fn ensure_namespace(&self, name: &str, config: &CacheConfig) -> Result<()>;

    /// Store `value` under `key`, evicting the least recently used entry if
    /// the namespace is full.
    ///
    /// # Errors
    ///
    /// Returns [`MimirError::UnknownNamespace`] if the namespace was never
    /// ensured.
    fn put(&self, namespace: &str, key: Option<&str>, value: StoredValue) -> Result<()>;

    /// Look up `key`. Unknown namespaces, absent keys and expired entries
    /// are all [`CachedValue::NotFound`].
    fn get(&self, namespace: &str, key: Option<&str>) -> CachedValue<StoredValue>;
}

/// Typed access on top of any [`CacheBackend`].
pub trait CacheBackendExt: CacheBackend {
    /// Store a clone of `value`.
    fn store<T: Any + Clone + Send + Sync>(
        &self,
        namespace: &str,
        key: Option<&str>,
        value: &T,
    ) -> Result<()> {
        self.put(namespace, key, StoredValue::new(value.clone()))
    }

    /// Look up `key` and return a fresh clone of the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`MimirError::TypeMismatch`] if the slot holds another type.
    fn retrieve<T: Any + Clone>(
        &self,
        namespace: &str,
        key: Option<&str>,
    ) -> Result<CachedValue<T>> {
        match self.get(namespace, key) {
            CachedValue::Found(stored) => match stored.get::<T>() {
                Some(value) => Ok(CachedValue::Found(value)),
                None => Err(MimirError::TypeMismatch {
                    expected: type_name::<T>(),
                    found: stored.type_name(),
                }),
            },
            CachedValue::NotFound => Ok(CachedValue::NotFound),
        }
    }
}

impl<B: CacheBackend + ?Sized> CacheBackendExt for B {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_clones_out_the_value() {
        let stored = StoredValue::new(vec![1, 2, 3]);
        let mut first: Vec<i32> = stored.get().unwrap();
        first.push(4);
        assert_eq!(stored.get::<Vec<i32>>(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn get_with_wrong_type_is_none() {
        let stored = StoredValue::new(1u8);
        assert!(stored.is::<u8>());
        assert_eq!(stored.get::<u16>(), None);
        assert_eq!(stored.type_name(), "u8");
    }

    #[test]
    fn nested_options_and_nan_survive() {
        let nested: Option<Option<u32>> = Some(None);
        assert_eq!(StoredValue::new(nested).get::<Option<Option<u32>>>(), Some(Some(None)));

        let nan = StoredValue::new(Some(f64::NAN)).get::<Option<f64>>().unwrap();
        assert!(nan.is_some_and(f64::is_nan));
    }
}

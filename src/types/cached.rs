//! Lookup results.

/// Outcome of a cache lookup.
///
/// Keeps "absent" apart from "present but empty": a cached `None` comes back
/// as `CachedValue::Found(None)`, never as [`CachedValue::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue<T> {
    /// The key was present and unexpired.
    Found(T),
    /// Unknown namespace, never stored, evicted, or expired.
    NotFound,
}

impl<T> CachedValue<T> {
    /// Was the value found in the cache?
    pub fn was_found(&self) -> bool {
        matches!(self, CachedValue::Found(_))
    }

    /// The cached value, if found.
    pub fn value(self) -> Option<T> {
        match self {
            CachedValue::Found(value) => Some(value),
            CachedValue::NotFound => None,
        }
    }

    pub fn as_ref(&self) -> CachedValue<&T> {
        match self {
            CachedValue::Found(value) => CachedValue::Found(value),
            CachedValue::NotFound => CachedValue::NotFound,
        }
    }

    /// Transform a found value, leaving misses alone.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CachedValue<U> {
        match self {
            CachedValue::Found(value) => CachedValue::Found(f(value)),
            CachedValue::NotFound => CachedValue::NotFound,
        }
    }
}

impl<T> From<Option<T>> for CachedValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => CachedValue::Found(value),
            None => CachedValue::NotFound,
        }
    }
}

//! Cache configuration types.
//!
//! Three layers feed the configuration of a namespace:
//!
//! - [`CacheSettings`]: per-operation (and optionally per-type) overrides,
//!   every field optional.
//! - [`CacheDefaults`]: instance-level defaults of an interceptor, loaded
//!   from configuration or set on the builder.
//! - [`CacheConfig`]: the fully resolved result handed to the storage
//!   backend when a namespace is created.

use serde::{Deserialize, Serialize};

use crate::time::TimeUnit;
use crate::{MimirError, Result};

/// Expiration amount meaning "entries never expire".
///
/// Any amount `<= 0` is treated the same way.
pub const NO_EXPIRATION: i64 = 0;

/// Hardcoded default namespace capacity.
pub const DEFAULT_MAX_SIZE: u64 = 1024;

/// Resolved configuration for a single namespace.
///
/// Immutable once built. `max_size` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    max_size: u64,
    expiration: i64,
    unit: TimeUnit,
}

impl CacheConfig {
    /// Build a validated configuration.
    ///
    /// `unit` may be [`TimeUnit::Unset`] only when `expiration` does not
    /// expire; otherwise conversion fails later, when the namespace is
    /// created.
    ///
    /// # Errors
    ///
    /// Returns [`MimirError::InvalidConfiguration`] if `max_size` is zero.
    pub fn new(max_size: u64, expiration: i64, unit: TimeUnit) -> Result<Self> {
        if max_size == 0 {
            return Err(MimirError::InvalidConfiguration(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_size,
            expiration,
            unit,
        })
    }

    /// Configuration whose entries never expire.
    pub fn without_expiration(max_size: u64) -> Result<Self> {
        Self::new(max_size, NO_EXPIRATION, TimeUnit::Unset)
    }

    /// Maximum number of entries before LRU eviction kicks in.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Expiration amount, in [`Self::unit`].
    pub fn expiration(&self) -> i64 {
        self.expiration
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Whether entries expire at all.
    pub fn expires(&self) -> bool {
        self.expiration > NO_EXPIRATION
    }
}

/// Optional per-operation overrides.
///
/// `None` (and, for the unit, `Some(TimeUnit::Unset)`) means "not set";
/// unset fields fall through to the interceptor defaults.
///
/// ```rust
/// # use mimir::{CacheSettings, TimeUnit};
/// let settings = CacheSettings::new()
///     .max_size(50)
///     .expiration(10)
///     .unit(TimeUnit::Minutes);
/// assert_eq!(settings.max_size, Some(50));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of cached results for the operation.
    #[serde(default)]
    pub max_size: Option<u64>,
    /// Expiration amount; `<= 0` disables expiration.
    #[serde(default)]
    pub expiration: Option<i64>,
    /// Unit for `expiration`.
    #[serde(default)]
    pub unit: Option<TimeUnit>,
}

impl CacheSettings {
    /// Settings with nothing overridden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum number of cached results.
    pub fn max_size(mut self, n: u64) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Override the expiration amount.
    pub fn expiration(mut self, amount: i64) -> Self {
        self.expiration = Some(amount);
        self
    }

    /// Override the expiration unit.
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Disable expiration regardless of defaults.
    pub fn no_expiration(self) -> Self {
        self.expiration(NO_EXPIRATION)
    }

    /// The unit, if one was explicitly chosen.
    pub fn explicit_unit(&self) -> Option<TimeUnit> {
        self.unit.filter(|unit| unit.is_set())
    }

    /// Field-wise merge: values set on `self` win, the rest come from
    /// `fallback`.
    ///
    /// Used to layer operation-level settings over settings attached to the
    /// receiver type.
    pub fn or(self, fallback: CacheSettings) -> Self {
        Self {
            max_size: self.max_size.or(fallback.max_size),
            expiration: self.expiration.or(fallback.expiration),
            unit: self.explicit_unit().or(fallback.explicit_unit()),
        }
    }
}

/// Instance-level defaults of a [`CacheInterceptor`](crate::CacheInterceptor).
///
/// Deserializable from the `[defaults]` table of the configuration file.
/// Missing fields keep their hardcoded values: 1024 entries, no expiration,
/// days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDefaults {
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    #[serde(default = "default_expiration")]
    pub expiration: i64,
    #[serde(default = "default_unit")]
    pub unit: TimeUnit,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            expiration: default_expiration(),
            unit: default_unit(),
        }
    }
}

impl CacheDefaults {
    /// Check the defaults can produce a valid [`CacheConfig`].
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(MimirError::InvalidConfiguration(
                "default max_size must be at least 1".to_string(),
            ));
        }
        if self.expiration > NO_EXPIRATION && !self.unit.is_set() {
            return Err(MimirError::InvalidConfiguration(
                "default expiration is set but default unit is unset".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

fn default_expiration() -> i64 {
    NO_EXPIRATION
}

fn default_unit() -> TimeUnit {
    TimeUnit::Days
}

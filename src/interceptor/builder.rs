//! Builder for configuring interceptors

use std::collections::HashMap;
use std::sync::Arc;

use super::CacheInterceptor;
use crate::Result;
use crate::cache::{CacheBackend, MemoryCache};
use crate::config::Config;
use crate::keys::{DefaultKeyGenerator, KeyGenerator};
use crate::time::TimeUnit;
use crate::types::{CacheDefaults, CacheSettings};

/// Main entry point for creating interceptors.
pub struct Mimir;

impl Mimir {
    /// Create a new builder for configuring an interceptor.
    pub fn builder() -> MimirBuilder {
        MimirBuilder::new()
    }
}

/// Builder for configuring interceptors.
///
/// Without further configuration it produces an interceptor over a fresh
/// [`MemoryCache`] with [`DefaultKeyGenerator`] and the hardcoded defaults.
pub struct MimirBuilder {
    backend: Option<Arc<dyn CacheBackend>>,
    key_generator: Option<Arc<dyn KeyGenerator>>,
    defaults: CacheDefaults,
    owner_settings: HashMap<String, CacheSettings>,
}

impl MimirBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            key_generator: None,
            defaults: CacheDefaults::default(),
            owner_settings: HashMap::new(),
        }
    }

    /// Store results in `backend` instead of a private [`MemoryCache`].
    ///
    /// Pass a clone of a shared `Arc` to keep access to the engine, for
    /// introspection or shutdown.
    pub fn backend<B: CacheBackend + 'static>(mut self, backend: Arc<B>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a custom key derivation strategy.
    pub fn key_generator<K: KeyGenerator + 'static>(mut self, key_generator: Arc<K>) -> Self {
        self.key_generator = Some(key_generator);
        self
    }

    /// Replace all instance defaults.
    pub fn defaults(mut self, defaults: CacheDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Take instance defaults and owner settings from a loaded
    /// configuration file.
    pub fn config(mut self, config: &Config) -> Self {
        self.owner_settings.extend(
            config
                .owners
                .iter()
                .map(|(owner, settings)| (owner.clone(), *settings)),
        );
        self.defaults(config.defaults)
    }

    pub fn default_max_size(mut self, max_size: u64) -> Self {
        self.defaults.max_size = max_size;
        self
    }

    pub fn default_expiration(mut self, expiration: i64) -> Self {
        self.defaults.expiration = expiration;
        self
    }

    pub fn default_unit(mut self, unit: TimeUnit) -> Self {
        self.defaults.unit = unit;
        self
    }

    /// Settings shared by every cached operation of owner type `O`.
    ///
    /// Per-call settings take precedence field by field.
    pub fn owner_settings<O: ?Sized>(self, settings: CacheSettings) -> Self {
        self.owner_settings_named(std::any::type_name::<O>(), settings)
    }

    /// Like [`owner_settings`](Self::owner_settings), for an owner type
    /// known only by name.
    pub fn owner_settings_named(
        mut self,
        owner_type: impl Into<String>,
        settings: CacheSettings,
    ) -> Self {
        self.owner_settings.insert(owner_type.into(), settings);
        self
    }

    /// Build the interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`MimirError::InvalidConfiguration`](crate::MimirError::InvalidConfiguration)
    /// if the defaults are unusable (zero max size, or an expiration without
    /// a unit).
    pub fn build(self) -> Result<CacheInterceptor> {
        self.defaults.validate()?;
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));
        let key_generator = self
            .key_generator
            .unwrap_or_else(|| Arc::new(DefaultKeyGenerator));
        Ok(CacheInterceptor::new(
            backend,
            key_generator,
            self.defaults,
            self.owner_settings,
        ))
    }
}

impl Default for MimirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

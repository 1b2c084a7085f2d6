//! Mimir - transparent per-operation result cache
//!
//! Wrap an expensive, side-effect-free operation with a [`CacheInterceptor`]
//! and repeated calls with equal arguments are answered from memory. Each
//! operation gets its own namespace, bounded in size (LRU eviction) and
//! optionally expiring, created lazily on first call.
//!
//! # Example
//!
//! ```rust
//! use mimir::{CacheSettings, Mimir, OperationCall, TimeUnit};
//!
//! struct Catalog;
//!
//! impl Catalog {
//!     fn price(&self, sku: &str, quantity: u32) -> Result<u64, mimir::MimirError> {
//!         // pretend this hits a database
//!         Ok(u64::from(quantity) * sku.len() as u64)
//!     }
//! }
//!
//! fn main() -> mimir::Result<()> {
//!     let cache = Mimir::builder()
//!         .default_expiration(10)
//!         .default_unit(TimeUnit::Minutes)
//!         .build()?;
//!
//!     let catalog = Catalog;
//!     let (sku, quantity) = ("A-100", 3u32);
//!     let call = OperationCall::on(&catalog, "price")
//!         .arg(&sku)
//!         .arg(&quantity)
//!         .build();
//!
//!     let settings = CacheSettings::new().max_size(256);
//!     let price = cache.intercept(&call, &settings, || catalog.price(sku, quantity))?;
//!     // served from cache
//!     let again = cache.intercept(&call, &settings, || catalog.price(sku, quantity))?;
//!     assert_eq!(price, again);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod keys;
pub mod telemetry;
pub mod time;
pub mod types;

// Re-export main types at crate root
pub use cache::{
    CacheBackend, CacheBackendExt, EngineStats, MemoryCache, NamespaceInfo, StoredValue,
};
pub use config::Config;
pub use error::{MimirError, Result};
pub use interceptor::{CacheInterceptor, Mimir, MimirBuilder};
pub use keys::{DefaultKeyGenerator, HashedKeyGenerator, KeyGenerator};
pub use time::TimeUnit;
pub use types::{
    CacheArgument, CacheConfig, CacheDefaults, CacheOwner, CacheSettings, CachedValue,
    DEFAULT_MAX_SIZE, NO_EXPIRATION, OperationCall, OperationCallBuilder,
};

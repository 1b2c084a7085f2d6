//! Public types for the Mimir API.

mod cached;
mod call;
mod config;

pub use cached::CachedValue;
pub use call::{CacheArgument, CacheOwner, OperationCall, OperationCallBuilder};
pub use config::{
    CacheConfig, CacheDefaults, CacheSettings, DEFAULT_MAX_SIZE, NO_EXPIRATION,
};

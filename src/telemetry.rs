//! Telemetry metric name constants.
//!
//! Centralised metric names for mimir operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `namespace`: operation signature the namespace was created for

/// Total lookups answered from the cache.
///
/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "mimir_cache_hits_total";

/// Total lookups that had to invoke the real operation.
///
/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "mimir_cache_misses_total";

/// Total values written into a namespace.
///
/// Labels: `namespace`.
pub const CACHE_STORES_TOTAL: &str = "mimir_cache_stores_total";

/// Total namespaces created (at most one per operation signature).
///
/// Labels: `namespace`.
pub const NAMESPACES_CREATED_TOTAL: &str = "mimir_namespaces_created_total";

/// Total real-operation failures propagated without caching.
///
/// Labels: `namespace`.
pub const OPERATION_FAILURES_TOTAL: &str = "mimir_operation_failures_total";

//! Names of the metrics emitted by the cache and the search route.

pub const RESPONSE_HIT: &str = "postcache_response_cache_hit_total";
pub const RESPONSE_MISS: &str = "postcache_response_cache_miss_total";
/// Labelled `outcome = success | failure`.
pub const POPULATION_RUNS: &str = "postcache_snapshot_population_total";
pub const POPULATION_MS: &str = "postcache_snapshot_population_ms";
pub const SEARCH_FALLBACK: &str = "postcache_search_fallback_total";

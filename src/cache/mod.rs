//! Postcache cache subsystem.
//!
//! Two structures sit in front of the upstream content API:
//!
//! - **Response cache**: payloads memoized per request identity (path plus
//!   sorted query), cleared wholesale on refresh.
//! - **Snapshot**: every post known as of the last successful population,
//!   searched locally so that search requests rarely reach upstream.
//!
//! [`CacheCoordinator`] owns both, plus the background population task.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! max_retries = 5
//! retry_base_delay_ms = 250
//! retry_max_delay_ms = 5000
//! ```

mod config;
mod coordinator;
mod keys;
mod lock;
pub mod metric_names;
mod search;
mod snapshot;
mod store;

pub use config::CacheConfig;
pub use coordinator::CacheCoordinator;
pub use keys::RequestKey;
pub use search::search_posts;
pub use snapshot::{PopulationState, PopulationStatus, SnapshotStore};
pub use store::{Epoch, ResponseStore};

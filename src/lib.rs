//! Offline-first cache and sync engine for paginated remote profile records.
//!
//! Remote pages are merged into a durable SQLite cache without clobbering
//! user decisions, decisions made while offline are queued durably and
//! flushed when connectivity returns, and a per-profile update lock drops
//! duplicate concurrent decisions.

pub mod api;
pub mod config;
pub mod models;
pub mod net;
pub mod store;
pub mod sync;

pub use api::{ApiClient, ApiError, ProfileSource};
pub use models::{MatchStatus, ProfileCard, ProfileRecord};
pub use net::ConnectivityMonitor;
pub use store::{ProfileStore, StoreError};
pub use sync::{FeedEvent, SyncEngine};

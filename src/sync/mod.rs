//! Sync engine: pagination, the per-profile update lock, and the
//! orchestrator tying remote fetches, the store, and connectivity
//! together.

pub mod engine;
pub mod lock;
pub mod pagination;

pub use engine::{FeedEvent, SyncEngine};
pub use lock::UpdateLock;
pub use pagination::{FetchError, FetchOutcome, Paginator};

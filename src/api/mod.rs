//! Remote profile feed client.
//!
//! The feed is a stateless paginated endpoint; the client here issues one
//! page request at a time and decodes the response. Everything above it
//! consumes the `ProfileSource` trait so tests can substitute a scripted
//! source.

pub mod client;
pub mod error;

pub use client::{ApiClient, ProfileSource};
pub use error::ApiError;

//! Remote data sources
//!
//! - TMDB: movie metadata, trailers (videos) and reviews
//!
//! The fetch core only depends on `CollectionSource`; the transport behind
//! it is interchangeable.

pub mod tmdb;

use anyhow::Result;
use async_trait::async_trait;

pub use tmdb::{TmdbClient, TmdbError};

/// Retrieves one related collection for a movie
///
/// One call per fetch. Implementations must not retry internally.
#[async_trait]
pub trait CollectionSource<T>: Send + Sync + 'static {
    async fn fetch_collection(&self, movie_id: u64) -> Result<Vec<T>>;
}

pub mod cache;
pub mod config;
pub mod fetch;
pub mod routes;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::{CacheError, CachingFetcher, Fetched};
pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use store::{KeyValueStore, RedisStore, StoreError};

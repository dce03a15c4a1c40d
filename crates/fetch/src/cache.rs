use crate::fetch::{FetchError, PageFetcher};
use crate::store::{KeyValueStore, StoreError};

/// Prefix of the per-URL access counter key. Shared with existing store contents.
pub const COUNT_KEY_PREFIX: &str = "count:";

/// Store key holding the access count for `url`.
pub fn count_key(url: &str) -> String {
    format!("{}{}", COUNT_KEY_PREFIX, url)
}

/// A page served by [`CachingFetcher::fetch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched {
    pub content: String,
    /// Whether the content came from the cache rather than the network.
    pub cached: bool,
}

/// Wraps a page fetcher with a per-URL access counter and a TTL cache,
/// both held in an external key-value store.
///
/// The cache key for a URL is the URL itself; the counter key is
/// `count:<url>`. Expiry is left entirely to the store.
pub struct CachingFetcher<S, F> {
    store: S,
    fetcher: F,
    ttl_seconds: u64,
}

impl<S: KeyValueStore, F: PageFetcher> CachingFetcher<S, F> {
    pub fn new(store: S, fetcher: F, ttl_seconds: u64) -> Self {
        Self {
            store,
            fetcher,
            ttl_seconds,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Return the text content of `url`, from cache if present.
    pub async fn get(&self, url: &str) -> Result<String, CacheError> {
        self.fetch(url).await.map(|fetched| fetched.content)
    }

    /// Like [`get`](Self::get), also reporting whether the content was cached.
    ///
    /// The access counter is incremented before the cache is consulted, so
    /// hits are counted too, and a later fetch failure does not undo it.
    pub async fn fetch(&self, url: &str) -> Result<Fetched, CacheError> {
        let count = self.store.incr(&count_key(url)).await?;

        if let Some(raw) = self.store.get(url).await? {
            let content = String::from_utf8(raw).map_err(|_| StoreError::CorruptEntry {
                key: url.to_string(),
            })?;
            metrics::counter!("fetch.cache.hit").increment(1);
            tracing::debug!(url = %url, count = count, "Cache hit");
            return Ok(Fetched {
                content,
                cached: true,
            });
        }

        metrics::counter!("fetch.cache.miss").increment(1);
        tracing::debug!(url = %url, count = count, "Cache miss, fetching");

        let content = match self.fetcher.fetch_text(url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Fetch failed");
                return Err(e.into());
            }
        };

        // Concurrent misses for the same URL may both land here; last write wins.
        self.store
            .set_with_expiry(url, content.as_bytes(), self.ttl_seconds)
            .await?;

        Ok(Fetched {
            content,
            cached: false,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

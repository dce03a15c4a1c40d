use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

/// The key-value operations the page cache needs from its backing store.
///
/// Expiry is owned by the store: an entry written with `set_with_expiry`
/// must read back as absent once its TTL has elapsed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically increment `key`, creating it at 1 if absent. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Raw bytes stored under `key`, or `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditionally store `value` under `key` with a TTL.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        expire_seconds: u64,
    ) -> Result<(), StoreError>;
}

/// Redis-backed store. Cloning shares the underlying multiplexed connection,
/// which is released when the last clone is dropped.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to Redis");

        let client =
            redis::Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { conn };
        store.health_check().await?;
        tracing::info!("Redis connection established");

        Ok(store)
    }

    /// Verify the connection is alive (PING).
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;

        if pong != "PONG" {
            return Err(StoreError::Command(format!(
                "Unexpected PING response: {}",
                pong
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        expire_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expire_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store command error: {0}")]
    Command(String),

    #[error("Cached value for {key} is not valid UTF-8")]
    CorruptEntry { key: String },
}

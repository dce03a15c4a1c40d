use serde::{Deserialize, Serialize};

/// Top-level fetch service configuration, deserialized from a TOML file.
/// Every section is optional in the file and falls back to its defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchServiceConfig {
    pub redis: RedisConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
}

/// Connection settings for the key-value store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".into(),
        }
    }
}

/// Cache TTL configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Page cache TTL in seconds.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

/// Default lifetime of a cached page.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 10;

/// Outbound HTTP client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Per-request timeout. `None` leaves the client default in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "webcache-fetch/0.1".into(),
            timeout_ms: Some(30_000),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8081 }
    }
}

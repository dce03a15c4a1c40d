use std::path::{Path, PathBuf};

use webcache_common::config::FetchServiceConfig;

/// Load the service configuration.
///
/// Starts from defaults, layers the TOML file at `path` (if given) on top,
/// then applies environment overrides read through `env`. Fails loudly on a
/// missing file, a parse error or an out-of-range value.
pub fn load_config<E>(path: Option<&Path>, env: E) -> Result<FetchServiceConfig, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            load_file(path)?
        }
        None => FetchServiceConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate(&config)?;

    tracing::info!(
        ttl_seconds = config.cache.ttl_seconds,
        port = config.server.port,
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn load_file(path: &Path) -> Result<FetchServiceConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn apply_env_overrides<E>(config: &mut FetchServiceConfig, env: E) -> Result<(), ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("REDIS_URL") {
        config.redis.url = url;
    }
    if let Some(ttl) = env("FETCH_CACHE_TTL") {
        config.cache.ttl_seconds = parse_env("FETCH_CACHE_TTL", &ttl)?;
    }
    if let Some(port) = env("FETCH_PORT") {
        config.server.port = parse_env("FETCH_PORT", &port)?;
    }
    if let Some(user_agent) = env("FETCH_USER_AGENT") {
        config.http.user_agent = user_agent;
    }
    if let Some(timeout) = env("FETCH_TIMEOUT_MS") {
        config.http.timeout_ms = Some(parse_env("FETCH_TIMEOUT_MS", &timeout)?);
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Env {
        name: name.to_string(),
        detail: e.to_string(),
    })
}

/// Check sane ranges. All problems are reported together.
fn validate(config: &FetchServiceConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if config.redis.url.trim().is_empty() {
        errors.push("redis.url must not be empty".into());
    }
    if config.cache.ttl_seconds == 0 {
        errors.push("cache.ttl_seconds must be > 0".into());
    }
    if config.server.port == 0 {
        errors.push("server.port must be > 0".into());
    }
    if config.http.timeout_ms == Some(0) {
        errors.push("http.timeout_ms must be > 0".into());
    }
    if config.http.user_agent.trim().is_empty() {
        errors.push("http.user_agent must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Invalid value for {name}: {detail}")]
    Env { name: String, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use webcache_fetch::config;
use webcache_fetch::routes::{self, AppState};
use webcache_fetch::{CachingFetcher, HttpFetcher, RedisStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("webcache fetch starting");

    // Configuration: optional TOML file, then env overrides. Fail loudly.
    let config_path = std::env::var("WEBCACHE_CONFIG").ok().map(PathBuf::from);
    let config = match config::load_config(config_path.as_deref(), |name| std::env::var(name).ok())
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration, refusing to start");
            std::process::exit(1);
        }
    };

    // Install Prometheus metrics recorder.
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let store = match RedisStore::connect(&config.redis.url).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis");
            std::process::exit(1);
        }
    };

    let fetcher = match HttpFetcher::with_user_agent(
        &config.http.user_agent,
        config.http.timeout_ms.map(Duration::from_millis),
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        cache: CachingFetcher::new(store, fetcher, config.cache.ttl_seconds),
        metrics_handle,
    });

    let app = routes::router(state);

    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(
        port = port,
        ttl_seconds = config.cache.ttl_seconds,
        "webcache fetch listening"
    );

    axum::serve(listener, app).await.expect("HTTP server error");
}

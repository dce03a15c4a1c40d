use std::time::Duration;

use async_trait::async_trait;

/// Raw "fetch URL over HTTP" capability wrapped by the caching layer.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body as text. Client and server error
    /// statuses are failures.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// `PageFetcher` backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(http: reqwest::Client, timeout: Option<Duration>) -> Self {
        Self { http, timeout }
    }

    /// Build a client with the given user agent.
    pub fn with_user_agent(user_agent: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self::new(http, timeout))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let start = std::time::Instant::now();
        let domain = extract_domain(url);

        let mut request = self.http.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Err(record_error(&domain, FetchError::Http(e.to_string()))),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(record_error(
                &domain,
                FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                },
            ));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Err(record_error(&domain, FetchError::Http(e.to_string()))),
        };

        let latency = start.elapsed().as_secs_f64();
        metrics::histogram!("fetch.request.latency", "domain" => domain).record(latency);

        Ok(body)
    }
}

fn record_error(domain: &str, error: FetchError) -> FetchError {
    metrics::counter!("fetch.request.errors", "domain" => domain.to_string()).increment(1);
    error
}

fn extract_domain(url: &str) -> String {
    url.split("//")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure: DNS, connect, timeout, body decode.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Upstream status code, if the origin answered with a failure status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(_) => None,
        }
    }
}

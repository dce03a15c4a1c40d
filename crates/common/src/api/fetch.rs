use serde::{Deserialize, Serialize};

/// POST /fetch request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

/// POST /fetch response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    pub content: String,
    pub metadata: FetchMetadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub url: String,
    /// Whether the response was served from cache.
    #[serde(default)]
    pub cached: bool,
}

/// Error body returned by the fetch service on failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchErrorBody {
    pub error: String,
    /// Upstream HTTP status, when the origin answered with a failure status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AviationWeatherError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse JSON from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Unexpected payload from {url}: {message}")]
    UnexpectedPayload { url: String, message: String },

    #[error("Request was cancelled")]
    Cancelled,
}

impl AviationWeatherError {
    /// A superseded request, which callers discard rather than report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AviationWeatherError::Cancelled)
    }
}

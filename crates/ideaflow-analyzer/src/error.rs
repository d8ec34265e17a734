use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analysis API returned status {status}")]
    UnexpectedStatus { status: StatusCode },

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("failed to parse analysis for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token exchange failed: {0}")]
    Auth(String),

    #[error("Reddit API returned status {status} for {context}")]
    UnexpectedStatus {
        status: StatusCode,
        context: String,
    },

    #[error("failed to parse Reddit response for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

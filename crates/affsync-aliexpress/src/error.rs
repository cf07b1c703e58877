use thiserror::Error;

#[derive(Debug, Error)]
pub enum AliexpressError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with an error envelope (bad signature, quota, ...).
    #[error("AliExpress API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid server URL \"{url}\": {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("request signing failed: {0}")]
    Signing(String),
}

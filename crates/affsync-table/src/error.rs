use thiserror::Error;

/// Errors returned by the hosted-table client.
#[derive(Debug, Error)]
pub enum TableError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid table URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("table API key is empty")]
    MissingKey,

    #[error("table name is empty")]
    MissingTable,

    /// The REST layer rejected the request (constraint violation, bad column, auth).
    #[error("table API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

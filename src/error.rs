use thiserror::Error;

/// Errors produced while talking to the NS API or loading configuration.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Request never produced a response (DNS, connect, timeout).
    #[error("HTTP error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("API error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    #[error("invalid timestamp: {0:?}")]
    Timestamp(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BoardError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => BoardError::Status {
                url: url.to_string(),
                status,
            },
            other => BoardError::Network {
                url: url.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn json(err: serde_json::Error, body: Option<&str>) -> Self {
        BoardError::Json {
            message: err.to_string(),
            body: body.map(|b| b.chars().take(500).collect()),
        }
    }
}

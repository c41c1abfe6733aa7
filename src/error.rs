use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("At least one API key is required")]
    NoKeys,

    #[error("Every API key in the pool was rejected or is over quota")]
    PoolExhausted,

    #[error("API error {code} ({reason}): {message}")]
    Api {
        code: u64,
        reason: String,
        message: String,
    },

    #[error("Invalid YouTube URL or video ID: {0}")]
    InvalidUrl(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the API rejected the request because of the key itself
    /// (quota spent or key invalid) rather than the request contents.
    /// These are the only errors worth retrying with another key.
    pub(crate) fn reason_is_credential(reason: &str) -> bool {
        matches!(
            reason,
            "quotaExceeded"
                | "dailyLimitExceeded"
                | "rateLimitExceeded"
                | "userRateLimitExceeded"
                | "keyInvalid"
                | "keyExpired"
        )
    }
}

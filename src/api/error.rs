use thiserror::Error;

/// Transport-level failures from the remote feed. All of them halt the
/// fetch loop until the caller retries the same page; there is no
/// automatic retry.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Feed request failed with status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("Feed request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Invalid feed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }
}

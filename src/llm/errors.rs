use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Network(String),

    #[error("completion request timed out")]
    Timeout,

    #[error("completion api returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("unexpected completion response: {0}")]
    Parse(String),

    #[error("completion response had no content")]
    EmptyResponse,
}

impl LlmError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

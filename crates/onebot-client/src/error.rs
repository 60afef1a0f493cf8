//! OneBot client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OneBotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Action {action} failed: status={status}, retcode={retcode}")]
    ActionFailed {
        action: String,
        status: String,
        retcode: i64,
    },

    #[error("Listener error: {0}")]
    Listener(#[from] std::io::Error),
}

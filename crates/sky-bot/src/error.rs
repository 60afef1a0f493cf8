//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("OneBot error: {0}")]
    OneBot(#[from] onebot_client::OneBotError),

    #[error("Sky API error: {0}")]
    SkyApi(#[from] sky_api::SkyApiError),

    /// Command metadata or routing could not be set up.
    #[error("Command registry error: {0}")]
    Registry(String),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

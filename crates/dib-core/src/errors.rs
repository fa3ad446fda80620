/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the service
/// can tell user mistakes (reply and keep prompting) from failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// User-supplied input that failed parsing or validation.
    #[error("{0}")]
    InvalidInput(String),

    #[error("insufficient market data: {0}")]
    InsufficientData(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use protego::ProtegoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Protego(#[from] ProtegoError),

    #[error("invalid {name}: {reason}")]
    Config { name: &'static str, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Whether running the same command again may succeed without changing
    /// the configuration.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CliError::Protego(e) => e.is_recoverable(),
            CliError::Config { .. } => false,
            CliError::Io(_) | CliError::Json(_) => true,
        }
    }
}

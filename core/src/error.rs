use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChoreoError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Nothing to remove: the registry is empty")]
    EmptyRegistry,

    #[error("Failed to publish '{name}': {reason}")]
    Publish { name: String, reason: String },

    #[error("Startup registration of '{name}' failed: {reason}")]
    Startup { name: String, reason: String },

    #[error("No published state named '{name}'")]
    UnknownState { name: String },

    #[error("No method named '{name}'")]
    UnknownMethod { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ChoreoResult<T> = Result<T, ChoreoError>;

impl ChoreoError {
    /// Errors that are reported and absorbed once the controller is running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyRegistry | Self::Publish { .. } | Self::UnknownState { .. }
        )
    }
}

use thiserror::Error;

/// A remote collaborator (metadata, query execution, export) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The remote call was rejected, optionally with a message for the user
    #[error("remote call rejected: {}", describe(.message))]
    Rejected { message: Option<String> },
    /// The call never reached the remote side
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn rejected(message: &str) -> Self {
        ServiceError::Rejected { message: Some(message.to_string()) }
    }

    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Rejected { message: Some(message) } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn describe(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("no message")
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("nothing to run: pick an object and at least one field")]
    NothingToRun,
    #[error("no query results to export")]
    NoResults,
    #[error("export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

use crate::store::StoreError;

/// Rejected user input. Raised before any remote call is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("task text must not be empty")]
    EmptyTaskText,

    #[error("comment text must not be empty")]
    EmptyCommentText,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("sign-in required")]
    Unauthenticated,

    #[error("remote write failed: {0}")]
    RemoteWrite(#[source] StoreError),

    #[error("remote read failed: {0}")]
    RemoteRead(#[source] StoreError),
}

impl ServiceError {
    /// Validation and sign-in failures are meant for the user; remote
    /// failures are for the logs.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Unauthenticated)
    }
}

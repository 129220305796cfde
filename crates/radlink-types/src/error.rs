use thiserror::Error;

/// Domain error taxonomy. Every variant maps to a user-visible rejection
/// at the HTTP boundary; none is fatal to the process.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The principal's role category disqualifies the action outright.
    #[error("role does not permit this action")]
    ForbiddenRole,

    /// The principal is not a party to this specific task or chat.
    #[error("no access to this task")]
    ForbiddenAccess,

    #[error("message content is empty")]
    EmptyContent,

    #[error("{0}")]
    Validation(String),

    /// Deleting the sole remaining admin, or an admin deleting themselves.
    #[error("cannot remove the last administrator")]
    LastAdminGuard,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }
}

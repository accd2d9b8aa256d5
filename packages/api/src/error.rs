//! Error taxonomy shared by the session authority and the lead synchronizer.

use store::TableError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Bad credentials or the auth provider refused the request.
    #[error("{0}")]
    Authentication(String),
    /// An operation that needs a session was attempted without one.
    #[error("User not authenticated")]
    NotAuthenticated,
    /// The ownership-scoped read or write matched no row. A lead that exists
    /// but belongs to someone else looks exactly like a missing one.
    #[error("Lead not found")]
    NotFoundOrForbidden,
    /// Network or provider failure.
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<TableError> for Error {
    fn from(err: TableError) -> Self {
        match err {
            TableError::NoRows => Error::NotFoundOrForbidden,
            other => Error::Transport(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

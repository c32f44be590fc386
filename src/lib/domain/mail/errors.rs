//! Error types for mail dispatch

use thiserror::Error;
use tracing::debug;

/// Errors that can occur when fetching a template
#[derive(Debug, Error)]
pub enum GetTemplateError {
    /// No template is stored under the slug
    #[error("mail template `{0}` not found")]
    NotFound(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors that can occur when expanding a group
#[derive(Debug, Error)]
pub enum GroupError {
    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors that can occur when looking up sender credentials
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors that can occur when rendering a template string
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template source could not be parsed or rendered
    #[error("template error: {0}")]
    Template(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors that can occur when building or sending a message
#[derive(Debug, Error)]
pub enum TransportError {
    /// An address could not be parsed
    #[error("invalid email address `{0}`")]
    InvalidAddress(String),

    /// An attachment could not be read
    #[error("could not attach `{path}`: {source}")]
    Attachment {
        /// Path of the attachment
        path: String,

        /// Underlying IO error
        source: std::io::Error,
    },

    /// The message could not be assembled
    #[error("could not build message: {0}")]
    Build(String),

    /// The transport rejected the message or the connection failed
    #[error("could not send message: {0}")]
    SendError(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors that can occur when storing a dispatch attempt
#[derive(Debug, Error)]
pub enum LogError {
    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors returned to callers of the dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The template slug is unknown
    #[error("mail template `{0}` not found")]
    TemplateNotFound(String),

    /// A subject or body failed to render
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The message could not be built or sent
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

impl From<GetTemplateError> for DispatchError {
    fn from(err: GetTemplateError) -> Self {
        debug!("GetTemplateError -> DispatchError");

        match err {
            GetTemplateError::NotFound(slug) => DispatchError::TemplateNotFound(slug),
            GetTemplateError::UnknownError(e) => DispatchError::UnknownError(e),
        }
    }
}

impl From<GroupError> for DispatchError {
    fn from(err: GroupError) -> Self {
        debug!("GroupError -> DispatchError");

        match err {
            GroupError::UnknownError(e) => DispatchError::UnknownError(e),
        }
    }
}

impl From<CredentialError> for DispatchError {
    fn from(err: CredentialError) -> Self {
        debug!("CredentialError -> DispatchError");

        match err {
            CredentialError::UnknownError(e) => DispatchError::UnknownError(e),
        }
    }
}

impl From<sqlx::Error> for GetTemplateError {
    fn from(err: sqlx::Error) -> Self {
        debug!("sqlxError: {:?}", err);

        GetTemplateError::UnknownError(err.into())
    }
}

impl From<sqlx::Error> for GroupError {
    fn from(err: sqlx::Error) -> Self {
        GroupError::UnknownError(err.into())
    }
}

impl From<sqlx::Error> for CredentialError {
    fn from(err: sqlx::Error) -> Self {
        CredentialError::UnknownError(err.into())
    }
}

impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        LogError::UnknownError(err.into())
    }
}

use thiserror::Error as ThisError;

/// Result type that uses [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by newsdesk operations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A lookup matched no row.
    #[error("{0} not found")]
    NotFound(String),
    /// Form input failed validation.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending input.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
    #[error("You have already liked this article")]
    AlreadyLiked,
    #[error("Comments are disabled")]
    CommentsDisabled,
    #[error("You are already subscribed!")]
    AlreadySubscribed,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Session expired")]
    SessionExpired,
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Administrator access required")]
    Forbidden,
    /// Only trashed posts may be destroyed.
    #[error("Post {0} must be moved to the trash before it can be deleted")]
    NotInTrash(i64),
    #[error("Unsupported image type {0:?}")]
    UnsupportedImageType(String),
    #[error("Upload is empty")]
    EmptyUpload,
    #[error("Upload of {size} bytes exceeds the limit of {max} bytes")]
    UploadTooLarge {
        /// Size of the rejected upload.
        size: u64,
        /// Configured limit.
        max: u64,
    },
    #[error("Unknown setting {0:?}")]
    UnknownSetting(String),
    #[error("Unknown format {0:?}")]
    UnknownFormat(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Data(#[from] newsdesk_core::Error),
    #[error("IO error {0}")]
    IO(#[from] std::io::Error),
    #[error("(De)serialization error {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Error::NotFound(what.to_string())
    }

    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller rather than by the
    /// system, such as invalid input or a refused action.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::Data(_) | Error::IO(_) | Error::SerdeJson(_) | Error::Config(_)
        )
    }
}

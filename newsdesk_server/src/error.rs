use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use newsdesk::Error;
use serde_json::json;
use tokio::task::JoinError;

/// An error answered to the client as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::AlreadyLiked | Error::AlreadySubscribed | Error::EmailTaken | Error::NotInTrash(_) => {
            StatusCode::CONFLICT
        }
        Error::CommentsDisabled | Error::Forbidden => StatusCode::FORBIDDEN,
        Error::InvalidCredentials | Error::SessionExpired | Error::Unauthenticated => {
            StatusCode::UNAUTHORIZED
        }
        Error::UnsupportedImageType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Error::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        Error::EmptyUpload | Error::UnknownSetting(_) | Error::UnknownFormat(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::Config(_) | Error::Data(_) | Error::IO(_) | Error::SerdeJson(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = status_for(&e);
        if status.is_server_error() {
            error!("Request failed: {e}");
            ApiError::new(status, "Internal server error")
        } else {
            ApiError::new(status, e.to_string())
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        error!("Request worker failed: {e}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let e = ApiError::from(Error::AlreadyLiked);
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.message(), "You have already liked this article");
        let e = ApiError::from(Error::UploadTooLarge { size: 10, max: 5 });
        assert_eq!(e.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn server_errors_are_hidden() {
        let e = ApiError::from(Error::Config("secret path".to_string()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message(), "Internal server error");
    }
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use ember_rooms::RoomError;
use ember_types::api::ErrorBody;

/// Wire-facing error. Every failure renders as a stable machine code in
/// `error` plus a terse human line in `message`; internals never leak
/// their details onto the wire.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "unauthorized",
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "room_not_found",
            message: "room not found".to_string(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: "internal error".to_string(),
        }
    }

    /// A blocking task that panicked or was cancelled.
    pub fn task(err: tokio::task::JoinError) -> Self {
        error!(error = %err, "blocking task failed");
        Self::internal()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        let (status, code) = match &err {
            RoomError::InvalidDuration => (StatusCode::BAD_REQUEST, "invalid_duration"),
            RoomError::InvalidKind => (StatusCode::BAD_REQUEST, "invalid_kind"),
            RoomError::PayloadTooLarge => (StatusCode::BAD_REQUEST, "payload_too_large"),
            RoomError::Expired => (StatusCode::BAD_REQUEST, "room_expired"),
            RoomError::RoomFull => (StatusCode::BAD_REQUEST, "room_full"),
            RoomError::RoomClosed => (StatusCode::BAD_REQUEST, "room_closed"),
            RoomError::NotFound => (StatusCode::NOT_FOUND, "room_not_found"),
            RoomError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
            RoomError::CodesExhausted | RoomError::Store(_) => {
                error!(error = %err, "room operation failed");
                return Self::internal();
            }
        };
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_errors_map_to_expected_statuses() {
        let cases = [
            (RoomError::InvalidDuration, StatusCode::BAD_REQUEST),
            (RoomError::InvalidKind, StatusCode::BAD_REQUEST),
            (RoomError::PayloadTooLarge, StatusCode::BAD_REQUEST),
            (RoomError::Expired, StatusCode::BAD_REQUEST),
            (RoomError::RoomFull, StatusCode::BAD_REQUEST),
            (RoomError::RoomClosed, StatusCode::BAD_REQUEST),
            (RoomError::NotFound, StatusCode::NOT_FOUND),
            (RoomError::Unauthorized, StatusCode::FORBIDDEN),
            (RoomError::CodesExhausted, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = ApiError::from(RoomError::CodesExhausted);
        assert_eq!(err.message, "internal error");
        assert_eq!(err.code, "internal_error");
    }
}

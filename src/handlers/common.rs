use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Body of responses that only carry a confirmation
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

pub fn message_response(message: impl Into<String>) -> Response {
    success_response(MessageResponse {
        message: message.into(),
    })
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Path ids that are not UUIDs cannot name a record, so they are reported as missing.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} {} not found", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_map_to_not_found() {
        let err = parse_id("not-a-uuid", "Session").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Session").unwrap(), id);
    }
}

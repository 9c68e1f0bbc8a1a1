use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Informational response body, e.g. `{"message": "order deleted"}`.
#[derive(Debug, Serialize, Deserialize)]
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

/// 200 response carrying only a message
pub fn message_response(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

/// 201 response carrying only a message
pub fn created_message_response(message: impl Into<String>) -> Response {
    (
        StatusCode::CREATED,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

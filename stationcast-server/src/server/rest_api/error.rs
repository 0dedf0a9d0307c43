use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Type-erased error response
///
/// NOTE: This type is inspired by RFC7807 (Problem Details for HTTP APIs) but spares on a lot of
/// the details to avoid complexity.
///
/// See: <https://www.rfc-editor.org/rfc/rfc7807.html>
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ApiErrorResponse {
	pub r#type: String,
	pub status: u16,
	pub message: String,
}

impl ApiErrorResponse {
	pub fn not_found(message: impl Into<String>) -> Self {
		Self {
			r#type: "not_found".to_string(),
			status: StatusCode::NOT_FOUND.as_u16(),
			message: message.into(),
		}
	}
}

impl IntoResponse for ApiErrorResponse {
	fn into_response(self) -> Response {
		let status_code = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status_code, Json(self)).into_response()
	}
}

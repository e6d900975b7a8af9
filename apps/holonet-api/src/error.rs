use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::middleware::CorrelationId;

#[derive(Debug, Serialize)]
struct ErrorDetail {
	message: String,
	status: u16,
	details: Value,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: ErrorDetail,
	correlation_id: String,
}

/// An error envelope tagged with the request's correlation id.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
	details: Value,
	correlation_id: String,
}
impl ApiError {
	pub fn new(
		status: StatusCode,
		message: impl Into<String>,
		details: Value,
		correlation_id: &CorrelationId,
	) -> Self {
		Self {
			status,
			message: message.into(),
			details,
			correlation_id: correlation_id.to_string(),
		}
	}

	/// Malformed or out-of-range query and path parameters.
	pub fn validation(message: impl Into<String>, correlation_id: &CorrelationId) -> Self {
		Self::new(
			StatusCode::UNPROCESSABLE_ENTITY,
			"Validation error",
			json!({ "error": message.into() }),
			correlation_id,
		)
	}

	pub fn unauthorized(correlation_id: &CorrelationId) -> Self {
		Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", json!({}), correlation_id)
	}

	pub fn not_found(message: impl Into<String>, correlation_id: &CorrelationId) -> Self {
		Self::new(StatusCode::NOT_FOUND, message, json!({}), correlation_id)
	}

	pub fn service(err: holonet_service::Error, correlation_id: &CorrelationId) -> Self {
		use holonet_service::Error;

		let (status, message, details) = match err {
			Error::InvalidRequest { message } => (StatusCode::BAD_REQUEST, message, json!({})),
			Error::PageSizeExceeded { max_page_size } => (
				StatusCode::BAD_REQUEST,
				"page_size exceeds maximum".to_string(),
				json!({ "max_page_size": max_page_size }),
			),
			Error::InvalidSort { sort, allowed } => (
				StatusCode::BAD_REQUEST,
				"Invalid sort field".to_string(),
				json!({ "sort": sort, "allowed": allowed }),
			),
			Error::OutOfRange { page } =>
				(StatusCode::NOT_FOUND, "Page out of range".to_string(), json!({ "page": page })),
			Error::NotFound { message } => (
				StatusCode::NOT_FOUND,
				"Resource not found".to_string(),
				json!({ "error": message }),
			),
			Error::Upstream { status, message } => {
				tracing::warn!(
					status,
					error = %message,
					%correlation_id,
					"Upstream returned an error."
				);

				(StatusCode::BAD_GATEWAY, "Upstream error".to_string(), json!({ "status": status }))
			},
			Error::UpstreamUnavailable { message } => {
				tracing::warn!(error = %message, %correlation_id, "Upstream is unavailable.");

				(
					StatusCode::BAD_GATEWAY,
					"Upstream unavailable".to_string(),
					json!({ "error": message }),
				)
			},
			Error::InvalidResponse { message } => {
				tracing::warn!(
					error = %message,
					%correlation_id,
					"Upstream response was invalid."
				);

				(
					StatusCode::BAD_GATEWAY,
					"Invalid upstream response".to_string(),
					json!({ "error": message }),
				)
			},
		};

		Self::new(status, message, details, correlation_id)
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error: ErrorDetail {
				message: self.message,
				status: self.status.as_u16(),
				details: self.details,
			},
			correlation_id: self.correlation_id,
		};

		(self.status, Json(body)).into_response()
	}
}

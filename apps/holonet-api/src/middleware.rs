use std::{convert::Infallible, fmt, time::Instant};

use axum::{
	extract::{FromRequestParts, Query, Request, State},
	http::{HeaderMap, HeaderValue, request::Parts},
	middleware::Next,
	response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub const CORRELATION_HEADER: &str = "x-correlation-id";
pub const API_KEY_HEADER: &str = "x-api-key";

const MAX_CORRELATION_ID_CHARS: usize = 128;

/// Request-scoped identifier carried in logs, upstream calls and every response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);
impl CorrelationId {
	/// Reuses a caller-supplied `x-correlation-id` when it is printable and short, otherwise
	/// generates a UUID v4.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let supplied = headers
			.get(CORRELATION_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty() && value.len() <= MAX_CORRELATION_ID_CHARS);

		match supplied {
			Some(value) => Self(value.to_string()),
			None => Self(Uuid::new_v4().to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CorrelationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl<S> FromRequestParts<S> for CorrelationId
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(parts
			.extensions
			.get::<Self>()
			.cloned()
			.unwrap_or_else(|| Self::from_headers(&parts.headers)))
	}
}

#[derive(Debug, Deserialize)]
struct ApiKeyParam {
	api_key: Option<String>,
}

/// Assigns the correlation id, echoes it back and logs the completed request.
pub async fn correlate(mut req: Request, next: Next) -> Response {
	let started = Instant::now();
	let correlation_id = CorrelationId::from_headers(req.headers());
	let method = req.method().clone();
	let path = req.uri().path().to_string();

	req.extensions_mut().insert(correlation_id.clone());

	let mut response = next.run(req).await;

	if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
		response.headers_mut().insert(CORRELATION_HEADER, value);
	}

	tracing::info!(
		%method,
		path = %path,
		status = response.status().as_u16(),
		elapsed_ms = started.elapsed().as_millis() as u64,
		%correlation_id,
		"Request completed."
	);

	response
}

/// Rejects the request with 401 unless it carries the configured key, either in the
/// `x-api-key` header or the `api_key` query parameter. A no-op when keys are not required.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
	let security = &state.config().security;

	if !security.require_api_key {
		return next.run(req).await;
	}

	let header_key = req
		.headers()
		.get(API_KEY_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::to_string)
		.filter(|key| !key.is_empty());
	let provided = header_key.or_else(|| {
		Query::<ApiKeyParam>::try_from_uri(req.uri()).ok().and_then(|Query(param)| param.api_key)
	});

	if provided.is_some() && provided.as_deref() == security.api_key.as_deref() {
		return next.run(req).await;
	}

	let correlation_id = req
		.extensions()
		.get::<CorrelationId>()
		.cloned()
		.unwrap_or_else(|| CorrelationId::from_headers(req.headers()));

	tracing::warn!(
		path = req.uri().path(),
		%correlation_id,
		"Rejected request without a valid API key."
	);

	ApiError::unauthorized(&correlation_id).into_response()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn supplied_correlation_ids_are_reused() {
		let mut headers = HeaderMap::new();

		headers.insert(CORRELATION_HEADER, HeaderValue::from_static(" req-42 "));

		assert_eq!(CorrelationId::from_headers(&headers).as_str(), "req-42");
	}

	#[test]
	fn blank_or_oversized_ids_are_replaced() {
		let mut headers = HeaderMap::new();

		headers.insert(CORRELATION_HEADER, HeaderValue::from_static("   "));

		let generated = CorrelationId::from_headers(&headers);

		assert!(Uuid::parse_str(generated.as_str()).is_ok());

		let oversized = "x".repeat(MAX_CORRELATION_ID_CHARS + 1);

		headers.insert(
			CORRELATION_HEADER,
			HeaderValue::from_str(&oversized).expect("Header value should be valid."),
		);

		assert_ne!(CorrelationId::from_headers(&headers).as_str(), oversized);
		assert!(Uuid::parse_str(CorrelationId::from_headers(&HeaderMap::new()).as_str()).is_ok());
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("page_size exceeds maximum of {max_page_size}.")]
	PageSizeExceeded { max_page_size: u32 },
	#[error("Invalid sort field {sort:?}.")]
	InvalidSort { sort: String, allowed: Vec<String> },
	#[error("Page {page} is out of range.")]
	OutOfRange { page: u32 },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Upstream error: {message}")]
	Upstream { status: u16, message: String },
	#[error("Upstream unavailable: {message}")]
	UpstreamUnavailable { message: String },
	#[error("Invalid upstream response: {message}")]
	InvalidResponse { message: String },
}
impl From<holonet_upstream::Error> for Error {
	fn from(err: holonet_upstream::Error) -> Self {
		let message = err.to_string();

		match err {
			holonet_upstream::Error::NotFound { .. } => Self::NotFound { message },
			holonet_upstream::Error::Status { status, .. } => Self::Upstream { status, message },
			holonet_upstream::Error::InvalidResponse { .. } => Self::InvalidResponse { message },
			holonet_upstream::Error::Unavailable { .. }
			| holonet_upstream::Error::Cache { .. }
			| holonet_upstream::Error::Reqwest(_) => Self::UpstreamUnavailable { message },
		}
	}
}

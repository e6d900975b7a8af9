pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Upstream resource not found at {url}.")]
	NotFound { url: String },
	#[error("Upstream returned status {status} for {url}.")]
	Status { url: String, status: u16 },
	#[error("Upstream unavailable at {url}: {message}")]
	Unavailable { url: String, message: String },
	#[error("Invalid upstream response from {url}: {message}")]
	InvalidResponse { url: String, message: String },
	#[error("Cache error: {message}")]
	Cache { message: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
}
impl From<redis::RedisError> for Error {
	fn from(err: redis::RedisError) -> Self {
		Self::Cache { message: err.to_string() }
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown resource {name:?}.")]
	UnknownResource { name: String },
	#[error("Sort order must be asc or desc, got {value:?}.")]
	InvalidSortOrder { value: String },
}

pub mod pagination;
pub mod reference;
pub mod resource;
pub mod sorting;

mod error;

pub use error::{Error, Result};
pub use pagination::Pagination;
pub use reference::{EntityReference, extract_id};
pub use resource::ResourceKind;
pub use sorting::{SortOrder, parse_fields, project_fields, sort_documents};

/// A JSON object returned by the upstream catalog. Field sets vary by resource kind.
pub type Document = serde_json::Map<String, serde_json::Value>;

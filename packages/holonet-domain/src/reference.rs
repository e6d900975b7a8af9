use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ResourceKind;

/// A typed pointer to one upstream entity, derived from its hyperlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
	pub kind: ResourceKind,
	pub id: u64,
}
impl EntityReference {
	pub fn new(kind: ResourceKind, id: u64) -> Self {
		Self { kind, id }
	}

	/// Derives a reference from the last two non-empty path segments of `url`.
	///
	/// Returns `None` when the kind is unknown or the id is not a positive integer.
	pub fn from_url(url: &str) -> Option<Self> {
		let mut segments = url.split('/').filter(|segment| !segment.is_empty()).rev();
		let id = segments.next()?.parse::<u64>().ok().filter(|id| *id > 0)?;
		let kind = segments.next()?.parse::<ResourceKind>().ok()?;

		Some(Self { kind, id })
	}

	/// Graph node key, `"<resource>:<id>"`.
	pub fn node_key(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for EntityReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.kind, self.id)
	}
}

/// Parses the trailing numeric segment of an upstream URL.
pub fn extract_id(url: Option<&str>) -> Option<u64> {
	url?.split('/').filter(|segment| !segment.is_empty()).next_back()?.parse().ok()
}

pub mod expand;
pub mod graph;
pub mod planets_map;
pub mod resources;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use graph::{GraphEdge, GraphNode, GraphQuery, RelationGraph};
pub use planets_map::{PlanetCategory, PlanetMapItem, PlanetMeta, PlanetsMap};
pub use resources::{RelatedItems, ResourceItem};
pub use search::{SearchOutcome, SearchQuery};

use std::sync::Arc;

use serde_json::Value;

use holonet_config::Config;
use holonet_domain::{Document, extract_id};
use holonet_upstream::Upstream;

/// Entry point for every read the gateway serves.
///
/// Holds no per-request state; accumulators live inside each call.
#[derive(Clone)]
pub struct HolonetService {
	pub cfg: Arc<Config>,
	pub upstream: Arc<dyn Upstream>,
}
impl HolonetService {
	pub fn new(cfg: Arc<Config>, upstream: Arc<dyn Upstream>) -> Self {
		Self { cfg, upstream }
	}

	/// A copy whose upstream calls are logged under `correlation_id`.
	pub fn with_correlation_id(&self, correlation_id: &str) -> Self {
		Self {
			cfg: Arc::clone(&self.cfg),
			upstream: self.upstream.with_correlation_id(correlation_id),
		}
	}
}

/// Sets `id` from the document's own `url`, or null when the URL has no numeric tail.
pub(crate) fn with_derived_id(mut document: Document) -> Document {
	let id = extract_id(document.get("url").and_then(Value::as_str));

	document.insert("id".to_string(), id.map(Value::from).unwrap_or(Value::Null));

	document
}

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use serde_json::Value;

use holonet_config::MAX_GRAPH_DEPTH;
use holonet_domain::{Document, EntityReference, ResourceKind};

use crate::{Error, HolonetService, Result};

const THIN_FIELDS: [&str; 5] = ["name", "title", "url", "created", "edited"];

/// Start entity and requested traversal depth.
#[derive(Debug, Clone, Copy)]
pub struct GraphQuery {
	pub start: EntityReference,
	pub depth: u32,
}
impl GraphQuery {
	pub fn new(start: EntityReference, depth: u32) -> Result<Self> {
		if !(1..=MAX_GRAPH_DEPTH).contains(&depth) {
			return Err(Error::InvalidRequest {
				message: format!("depth must be between 1 and {MAX_GRAPH_DEPTH}."),
			});
		}

		Ok(Self { start, depth })
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
	/// Node key, `"<resource>:<id>"`.
	pub id: String,
	pub resource: ResourceKind,
	pub label: String,
	/// The thinned document.
	pub raw: Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
	pub from: String,
	pub to: String,
	#[serde(rename = "type")]
	pub relation: String,
}

/// Nodes in discovery order and edges in the order they were found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelationGraph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}
impl RelationGraph {
	pub fn node(&self, key: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|node| node.id == key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.node(key).is_some()
	}
}

impl HolonetService {
	/// Breadth-first crawl from `query.start`.
	///
	/// Bounded by `graph.max_nodes` and by the smaller of `query.depth` and `graph.max_depth`.
	/// Nodes at the depth limit are kept but their relations are not followed. Edges are
	/// recorded for every valid reference, so a node may have several incoming edges while
	/// being fetched once.
	pub async fn build_graph(&self, query: GraphQuery) -> Result<RelationGraph> {
		let max_nodes = self.cfg.graph.max_nodes;
		let effective_depth = query.depth.min(self.cfg.graph.max_depth);
		let mut graph = RelationGraph::default();
		let mut visited = HashSet::new();
		let mut queue = VecDeque::from([(query.start, 0_u32)]);

		while graph.nodes.len() < max_nodes
			&& let Some((reference, depth)) = queue.pop_front()
		{
			let key = reference.node_key();

			if !visited.insert(key.clone()) {
				continue;
			}

			let fetched = self.upstream.fetch_by_id(reference.kind, reference.id).await?;
			let document = fetched.document;

			graph.nodes.push(GraphNode {
				label: label(&document, &key),
				id: key.clone(),
				resource: reference.kind,
				raw: thin(&document),
			});

			if depth >= effective_depth {
				continue;
			}

			for relation in reference.kind.relations() {
				for target in related_references(document.get(*relation)) {
					graph.edges.push(GraphEdge {
						from: key.clone(),
						to: target.node_key(),
						relation: relation.to_string(),
					});
					queue.push_back((target, depth + 1));
				}
			}
		}

		Ok(graph)
	}
}

fn thin(document: &Document) -> Document {
	THIN_FIELDS
		.iter()
		.filter_map(|field| document.get(*field).map(|value| (field.to_string(), value.clone())))
		.collect()
}

fn label(document: &Document, key: &str) -> String {
	["name", "title"]
		.iter()
		.filter_map(|field| document.get(*field).and_then(Value::as_str))
		.find(|text| !text.is_empty())
		.unwrap_or(key)
		.to_string()
}

/// A relation field holds nothing, one URL or a list of URLs. Unparseable entries are dropped.
fn related_references(value: Option<&Value>) -> Vec<EntityReference> {
	let urls: Vec<&str> = match value {
		Some(Value::String(url)) => vec![url.as_str()],
		Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
		_ => Vec::new(),
	};

	urls.into_iter().filter_map(EntityReference::from_url).collect()
}

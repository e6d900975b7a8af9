use serde::Serialize;
use serde_json::Value;

use holonet_domain::{Document, ResourceKind};
use holonet_upstream::CacheMeta;

use crate::{HolonetService, Result};

#[derive(Debug, Clone, Serialize)]
pub struct ResourceItem {
	pub item: Document,
	pub cache: CacheMeta,
}

/// Expanded references of one parent entity.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedItems {
	pub items: Vec<Document>,
	/// `id` plus the parent's display field (`title` for films, `name` for people).
	pub parent: Document,
	/// Cache annotation of the parent fetch.
	pub cache: CacheMeta,
}

impl HolonetService {
	pub async fn get_resource(&self, kind: ResourceKind, id: u64) -> Result<ResourceItem> {
		let fetched = self.upstream.fetch_by_id(kind, id).await?;
		let mut item = fetched.document;

		item.insert("id".to_string(), Value::from(id));

		Ok(ResourceItem { item, cache: fetched.cache })
	}

	pub async fn film_characters(&self, id: u64) -> Result<RelatedItems> {
		self.related(ResourceKind::Films, id, "characters", "title").await
	}

	pub async fn person_films(&self, id: u64) -> Result<RelatedItems> {
		self.related(ResourceKind::People, id, "films", "name").await
	}

	async fn related(
		&self,
		kind: ResourceKind,
		id: u64,
		relation: &str,
		display_field: &str,
	) -> Result<RelatedItems> {
		let fetched = self.upstream.fetch_by_id(kind, id).await?;
		let urls = string_list(fetched.document.get(relation));
		let items = self.expand_urls(&urls).await;
		let mut parent = Document::new();

		parent.insert("id".to_string(), Value::from(id));
		parent.insert(
			display_field.to_string(),
			fetched.document.get(display_field).cloned().unwrap_or(Value::Null),
		);

		Ok(RelatedItems { items, parent, cache: fetched.cache })
	}
}

fn string_list(value: Option<&Value>) -> Vec<String> {
	match value {
		Some(Value::Array(items)) =>
			items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
		_ => Vec::new(),
	}
}

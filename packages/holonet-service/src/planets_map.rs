use serde::Serialize;
use serde_json::Value;

use holonet_domain::{Document, ResourceKind};
use holonet_upstream::CacheMeta;

use crate::{Error, HolonetService, Result, with_derived_id};

const CORE_POPULATION: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanetCategory {
	Core,
	Ice,
	Arid,
	Frontier,
	Unknown,
}
impl PlanetCategory {
	/// Classifies a planet from its raw population, climate and terrain strings.
	pub fn classify(population: Option<&Value>, climate: &str, terrain: &str) -> Self {
		let Some(population) = parse_population(population) else {
			return Self::Unknown;
		};

		if population > CORE_POPULATION && climate.contains("temperate") {
			Self::Core
		} else if climate.contains("frozen") || terrain.contains("ice") {
			Self::Ice
		} else if climate.contains("arid") || terrain.contains("desert") {
			Self::Arid
		} else {
			Self::Frontier
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanetMeta {
	pub diameter: Value,
	pub gravity: Value,
	pub orbital_period: Value,
	pub rotation_period: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanetMapItem {
	pub id: Option<u64>,
	pub name: Value,
	pub terrain: String,
	pub climate: String,
	pub population: Value,
	pub category: PlanetCategory,
	pub meta: PlanetMeta,
}
impl PlanetMapItem {
	fn from_document(document: &Document) -> Self {
		let field = |name: &str| document.get(name).cloned().unwrap_or(Value::Null);
		let text_or_unknown = |name: &str| {
			document
				.get(name)
				.and_then(Value::as_str)
				.filter(|text| !text.is_empty())
				.unwrap_or("unknown")
				.to_string()
		};
		let terrain = text_or_unknown("terrain");
		let climate = text_or_unknown("climate");

		Self {
			id: document.get("id").and_then(Value::as_u64),
			name: field("name"),
			category: PlanetCategory::classify(document.get("population"), &climate, &terrain),
			population: field("population"),
			terrain,
			climate,
			meta: PlanetMeta {
				diameter: field("diameter"),
				gravity: field("gravity"),
				orbital_period: field("orbital_period"),
				rotation_period: field("rotation_period"),
			},
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanetsMap {
	pub items: Vec<PlanetMapItem>,
	/// Cache annotation of the last upstream page fetched.
	pub cache: CacheMeta,
}

impl HolonetService {
	/// Categorized planet summaries, at most `page_size` of them, read from at most
	/// `planets_map.max_pages` upstream pages.
	pub async fn planets_map(&self, page_size: u32) -> Result<PlanetsMap> {
		let max_page_size = self.cfg.search.max_page_size;

		if page_size == 0 {
			return Err(Error::InvalidRequest {
				message: "page_size must be 1 or greater.".to_string(),
			});
		}
		if page_size > max_page_size {
			return Err(Error::PageSizeExceeded { max_page_size });
		}

		let wanted = page_size as usize;
		let mut items = Vec::new();
		let mut cache = CacheMeta::miss(self.cfg.cache.ttl_seconds);

		for page in 1..=self.cfg.planets_map.max_pages {
			let fetched = self.upstream.search_page(ResourceKind::Planets, None, page).await?;

			cache = fetched.cache;
			items.extend(
				fetched
					.results
					.into_iter()
					.map(with_derived_id)
					.map(|document| PlanetMapItem::from_document(&document)),
			);

			if fetched.next.is_none() || items.len() >= wanted {
				break;
			}
		}

		items.truncate(wanted);

		Ok(PlanetsMap { items, cache })
	}
}

fn parse_population(value: Option<&Value>) -> Option<u64> {
	match value? {
		Value::Number(number) => number.as_u64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

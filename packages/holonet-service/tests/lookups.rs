use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};

use holonet_config::Config;
use holonet_domain::ResourceKind;
use holonet_service::{Error, HolonetService, PlanetCategory};
use holonet_testkit::{Failure, FakeUpstream, sample_config, search_page};

fn url(kind: ResourceKind, id: u64) -> String {
	FakeUpstream::entity_url(kind, id)
}

fn service(upstream: &FakeUpstream) -> HolonetService {
	service_with(upstream, sample_config())
}

fn service_with(upstream: &FakeUpstream, cfg: Config) -> HolonetService {
	HolonetService::new(Arc::new(cfg), Arc::new(upstream.clone()))
}

fn people(count: u64) -> FakeUpstream {
	(1..=count).fold(FakeUpstream::new(), |upstream, id| {
		upstream.with_entity(ResourceKind::People, id, json!({ "name": format!("p{id}") }))
	})
}

#[tokio::test]
async fn expanding_nothing_makes_no_calls() {
	let upstream = FakeUpstream::new().refusing_calls();
	let items = service(&upstream).expand_urls(&[]).await;

	assert!(items.is_empty());
	assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn failed_lookups_are_dropped_from_expansions() {
	let missing = url(ResourceKind::People, 2);
	let upstream = people(1).with_failure(&missing, Failure::Status(500));
	let items = service(&upstream).expand_urls(&[url(ResourceKind::People, 1), missing]).await;

	assert_eq!(items.len(), 1);
	assert_eq!(items[0]["name"], "p1");
	assert_eq!(items[0]["id"], 1);
	assert_eq!(upstream.calls().len(), 2);
}

#[tokio::test]
async fn expansion_respects_the_concurrency_ceiling() {
	let upstream = people(12).with_latency(Duration::from_millis(20));
	let urls: Vec<String> = (1..=12).map(|id| url(ResourceKind::People, id)).collect();
	let mut cfg = sample_config();

	cfg.expand.max_concurrency = 3;

	let mut items = service_with(&upstream, cfg).expand_urls(&urls).await;

	items.sort_by_key(|item| item["id"].as_u64());

	assert_eq!(items.len(), 12);
	assert_eq!(items[11]["name"], "p12");
	assert_eq!(upstream.max_in_flight(), 3);
}

#[tokio::test]
async fn single_resources_gain_their_id() {
	let upstream = people(1);
	let found = service(&upstream)
		.get_resource(ResourceKind::People, 1)
		.await
		.expect("Lookup failed.");

	assert_eq!(found.item["id"], 1);
	assert_eq!(found.item["name"], "p1");
	assert!(!found.cache.hit);
}

#[tokio::test]
async fn resources_keep_the_requested_id_without_a_url() {
	let upstream = FakeUpstream::new()
		.with_entity(ResourceKind::Species, 3, json!({ "name": "Wookie", "url": null }));
	let found = service(&upstream)
		.get_resource(ResourceKind::Species, 3)
		.await
		.expect("Lookup failed.");

	assert_eq!(found.item["id"], 3);
	assert_eq!(found.item["url"], Value::Null);
}

#[tokio::test]
async fn missing_resources_are_not_found() {
	let upstream = FakeUpstream::new();
	let err = service(&upstream)
		.get_resource(ResourceKind::Vehicles, 4)
		.await
		.expect_err("Expected not found.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn upstream_outages_surface_as_unavailable() {
	let upstream = FakeUpstream::new().refusing_calls();
	let err = service(&upstream)
		.get_resource(ResourceKind::Films, 1)
		.await
		.expect_err("Expected outage.");

	assert!(matches!(err, Error::UpstreamUnavailable { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn film_characters_expand_the_cast() {
	let upstream = people(2).with_entity(
		ResourceKind::Films,
		1,
		json!({
			"title": "A New Hope",
			"characters": [url(ResourceKind::People, 1), url(ResourceKind::People, 2)],
		}),
	);
	let related = service(&upstream).film_characters(1).await.expect("Lookup failed.");

	assert_eq!(related.items.len(), 2);
	assert_eq!(Value::Object(related.parent), json!({ "id": 1, "title": "A New Hope" }));
}

#[tokio::test]
async fn person_films_tolerate_missing_films() {
	let upstream = FakeUpstream::new()
		.with_entity(
			ResourceKind::People,
			1,
			json!({
				"name": "Luke Skywalker",
				"films": [url(ResourceKind::Films, 1), url(ResourceKind::Films, 7)],
			}),
		)
		.with_entity(ResourceKind::Films, 1, json!({ "title": "A New Hope" }));
	let related = service(&upstream).person_films(1).await.expect("Lookup failed.");

	assert_eq!(related.items.len(), 1);
	assert_eq!(related.items[0]["title"], "A New Hope");
	assert_eq!(related.parent["name"], "Luke Skywalker");
}

fn planet(id: u64, name: &str, population: &str, climate: &str, terrain: &str) -> Value {
	json!({
		"name": name,
		"population": population,
		"climate": climate,
		"terrain": terrain,
		"url": url(ResourceKind::Planets, id),
	})
}

#[tokio::test]
async fn planets_map_categorizes_every_planet() {
	let rows = vec![
		planet(1, "Tatooine", "200000", "arid", "desert"),
		planet(4, "Hoth", "unknown", "frozen", "ice"),
		planet(9, "Coruscant", "1000000000000", "temperate", "cityscape"),
		planet(5, "Dagobah", "1000", "murky", "swamp"),
	];
	let upstream = FakeUpstream::new()
		.with_search_pages(ResourceKind::Planets, vec![search_page(4, rows, None)]);
	let map = service(&upstream).planets_map(10).await.expect("Planets map failed.");
	let categories: Vec<(String, PlanetCategory)> = map
		.items
		.iter()
		.map(|item| (item.name.as_str().unwrap_or_default().to_string(), item.category))
		.collect();

	assert_eq!(
		categories,
		[
			("Tatooine".to_string(), PlanetCategory::Arid),
			("Hoth".to_string(), PlanetCategory::Unknown),
			("Coruscant".to_string(), PlanetCategory::Core),
			("Dagobah".to_string(), PlanetCategory::Frontier),
		]
	);
	assert_eq!(map.items[2].id, Some(9));
}

#[tokio::test]
async fn planets_map_stops_once_enough_planets_are_collected() {
	let upstream = FakeUpstream::new().with_search_pages(
		ResourceKind::Planets,
		vec![
			search_page(
				2,
				vec![planet(2, "Ice", "100", "frozen", "ice")],
				Some("https://swapi.dev/api/planets/?page=2"),
			),
			search_page(2, vec![planet(3, "Weird", "unknown-value", "temperate", "rocks")], None),
		],
	);
	let map = service(&upstream).planets_map(1).await.expect("Planets map failed.");

	assert_eq!(map.items.len(), 1);
	assert_eq!(map.items[0].category, PlanetCategory::Ice);
	assert_eq!(upstream.search_calls(), vec![1]);
}

#[tokio::test]
async fn planets_map_reads_at_most_the_configured_pages() {
	let pages = (1..=6)
		.map(|id| {
			let next = format!("https://swapi.dev/api/planets/?page={}", id + 1);

			search_page(6, vec![planet(id, "Rock", "10", "dry", "rock")], Some(next.as_str()))
		})
		.collect();
	let upstream = FakeUpstream::new().with_search_pages(ResourceKind::Planets, pages);
	let map = service(&upstream).planets_map(50).await.expect("Planets map failed.");

	assert_eq!(map.items.len(), 4);
	assert_eq!(upstream.search_calls(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn planets_map_rejects_bad_page_sizes_without_calls() {
	let upstream = FakeUpstream::new().refusing_calls();
	let service = service(&upstream);

	assert!(matches!(service.planets_map(0).await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(
		service.planets_map(51).await,
		Err(Error::PageSizeExceeded { max_page_size: 50 })
	));
	assert!(upstream.calls().is_empty());
}

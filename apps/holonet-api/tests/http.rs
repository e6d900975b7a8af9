use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use holonet_api::{routes, state::AppState};
use holonet_config::Config;
use holonet_domain::ResourceKind;
use holonet_testkit::{Failure, FakeUpstream, row, sample_config, search_page};

fn app(upstream: &FakeUpstream) -> Router {
	app_with(upstream, sample_config())
}

fn app_with(upstream: &FakeUpstream, cfg: Config) -> Router {
	routes::router(AppState::with_upstream(cfg, Arc::new(upstream.clone())))
}

fn locked_config() -> Config {
	let mut cfg = sample_config();

	cfg.security.require_api_key = true;
	cfg.security.api_key = Some("secret".to_string());

	cfg
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&body).expect("Failed to parse response.");

	(status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
	call(app, Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."))
		.await
}

fn two_people() -> FakeUpstream {
	FakeUpstream::new().with_search_pages(
		ResourceKind::People,
		vec![search_page(
			2,
			vec![row(ResourceKind::People, 1, "A"), row(ResourceKind::People, 2, "B")],
			None,
		)],
	)
}

#[tokio::test]
async fn health_echoes_the_supplied_correlation_id() {
	let request = Request::builder()
		.uri("/health")
		.header("x-correlation-id", "req-7")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response =
		app(&FakeUpstream::new()).oneshot(request).await.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()["x-correlation-id"], "req-7");

	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json: Value = serde_json::from_slice(&body).expect("Failed to parse response.");

	assert_eq!(json["status"], "ok");
	assert_eq!(json["correlation_id"], "req-7");
	assert_eq!(json["source"]["name"], "holonet");
}

#[tokio::test]
async fn meta_names_the_service() {
	let (status, json) = get(app(&FakeUpstream::new()), "/v1/meta").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["name"], "Holonet Galactic Console");
	assert!(json["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn search_returns_the_items_envelope() {
	let upstream = FakeUpstream::new().with_search_pages(
		ResourceKind::Planets,
		vec![search_page(1, vec![row(ResourceKind::Planets, 1, "Tatooine")], None)],
	);
	let (status, json) =
		get(app(&upstream), "/v1/search?resource=planets&q=tat&page=1&page_size=10").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"][0]["name"], "Tatooine");
	assert_eq!(json["items"][0]["id"], 1);
	assert_eq!(json["pagination"]["total_pages"], 1);
	assert_eq!(json["truncated"], false);
	assert_eq!(json["source"], json!({ "name": "swapi", "url": "https://swapi.dev/api" }));
	assert_eq!(json["cache"], json!({ "hit": false, "ttl": 180 }));
	assert_eq!(upstream.calls(), ["search:planets:1:tat"]);
	assert_eq!(upstream.correlation_ids().len(), 1);
}

#[tokio::test]
async fn search_aliases_and_reverse_order() {
	let uri = "/v1/search?resource=people&search=luke&order_by=name&reverse=true";
	let (status, json) = get(app(&two_people()), uri).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"][0]["name"], "B");
	assert_eq!(json["items"][1]["name"], "A");
}

#[tokio::test]
async fn public_aliases_search_everything_by_default() {
	let (status, json) =
		get(app(&two_people()), "/characters?sort=name&order=desc&fields=name").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"], json!([{ "name": "B", "id": 2 }, { "name": "A", "id": 1 }]));
	assert_eq!(json["pagination"]["total_items"], 2);
}

#[tokio::test]
async fn oversized_pages_are_rejected_with_the_maximum() {
	let upstream = FakeUpstream::new().refusing_calls();
	let (status, json) = get(app(&upstream), "/v1/search?resource=people&page_size=51").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error"]["message"], "page_size exceeds maximum");
	assert_eq!(json["error"]["details"]["max_page_size"], 50);
	assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn malformed_parameters_are_validation_errors() {
	let upstream = FakeUpstream::new().refusing_calls();

	for uri in [
		"/v1/search?resource=people&page=0",
		"/v1/search?resource=people&page=abc",
		"/v1/search?resource=droids",
		"/v1/search?resource=people&order=sideways",
		"/v1/search",
		"/v1/graph?start_resource=people",
		"/v1/graph?start_resource=people&start_id=1&depth=4",
		"/v1/people/abc",
	] {
		let (status, json) = get(app(&upstream), uri).await;

		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
		assert_eq!(json["error"]["status"], 422, "{uri}");
		assert!(json["correlation_id"].is_string(), "{uri}");
	}

	assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn invalid_sort_lists_the_allowed_fields() {
	let (status, json) = get(app(&two_people()), "/v1/search?resource=people&sort=title").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error"]["details"]["sort"], "title");
	assert!(json["error"]["details"]["allowed"].as_array().is_some_and(|allowed| {
		allowed.iter().any(|field| field == "name")
	}));
}

#[tokio::test]
async fn pages_past_the_end_are_not_found() {
	let (status, json) = get(app(&two_people()), "/v1/search?resource=people&page=3").await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error"]["details"]["page"], 3);
}

#[tokio::test]
async fn resources_are_returned_with_their_id() {
	let upstream = FakeUpstream::new()
		.with_entity(ResourceKind::Films, 1, json!({ "title": "A New Hope" }));
	let (status, json) = get(app(&upstream), "/v1/films/1").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["item"]["title"], "A New Hope");
	assert_eq!(json["item"]["id"], 1);
}

#[tokio::test]
async fn upstream_failures_map_to_gateway_errors() {
	let upstream = FakeUpstream::new()
		.with_failure(&FakeUpstream::entity_url(ResourceKind::Planets, 2), Failure::Status(503))
		.with_failure(&FakeUpstream::entity_url(ResourceKind::Planets, 3), Failure::Unavailable);
	let (missing, _) = get(app(&upstream), "/v1/planets/1").await;
	let (failing, failing_json) = get(app(&upstream), "/v1/planets/2").await;
	let (down, _) = get(app(&upstream), "/v1/planets/3").await;
	let (unknown, _) = get(app(&upstream), "/v1/droids/1").await;

	assert_eq!(missing, StatusCode::NOT_FOUND);
	assert_eq!(failing, StatusCode::BAD_GATEWAY);
	assert_eq!(failing_json["error"]["details"]["status"], 503);
	assert_eq!(down, StatusCode::BAD_GATEWAY);
	assert_eq!(unknown, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn film_characters_name_the_film() {
	let upstream = FakeUpstream::new()
		.with_entity(
			ResourceKind::Films,
			1,
			json!({
				"title": "A New Hope",
				"characters": [FakeUpstream::entity_url(ResourceKind::People, 1)],
			}),
		)
		.with_entity(ResourceKind::People, 1, json!({ "name": "Luke Skywalker" }));
	let (status, json) = get(app(&upstream), "/v1/films/1/characters").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["film"], json!({ "id": 1, "title": "A New Hope" }));
	assert_eq!(json["items"][0]["name"], "Luke Skywalker");
}

#[tokio::test]
async fn graph_returns_nodes_and_edges() {
	let upstream = FakeUpstream::new()
		.with_entity(
			ResourceKind::People,
			1,
			json!({
				"name": "Luke Skywalker",
				"films": [FakeUpstream::entity_url(ResourceKind::Films, 1)],
			}),
		)
		.with_entity(ResourceKind::Films, 1, json!({ "title": "A New Hope" }));
	let (status, json) =
		get(app(&upstream), "/v1/graph?start_resource=people&start_id=1&depth=1").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["graph"]["nodes"][0]["id"], "people:1");
	assert_eq!(json["graph"]["nodes"][1]["label"], "A New Hope");
	assert_eq!(
		json["graph"]["edges"],
		json!([{ "from": "people:1", "to": "films:1", "type": "films" }])
	);
}

#[tokio::test]
async fn planets_map_lists_categories() {
	let upstream = FakeUpstream::new().with_search_pages(
		ResourceKind::Planets,
		vec![search_page(
			1,
			vec![json!({
				"name": "Hoth",
				"population": "unknown",
				"climate": "frozen",
				"terrain": "tundra, ice caves",
				"url": FakeUpstream::entity_url(ResourceKind::Planets, 4),
			})],
			None,
		)],
	);
	let (status, json) = get(app(&upstream), "/v1/planets/map?page_size=5").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"][0]["id"], 4);
	assert_eq!(json["items"][0]["category"], "unknown");
	assert_eq!(json["items"][0]["meta"]["diameter"], Value::Null);
}

#[tokio::test]
async fn api_keys_guard_versioned_routes() {
	let locked = || app_with(&two_people(), locked_config());
	let (unauthorized, json) = get(locked(), "/v1/search?resource=people").await;

	assert_eq!(unauthorized, StatusCode::UNAUTHORIZED);
	assert_eq!(json["error"]["status"], 401);

	let request = Request::builder()
		.uri("/v1/search?resource=people")
		.header("x-api-key", "secret")
		.body(Body::empty())
		.expect("Failed to build request.");
	let (with_header, _) = call(locked(), request).await;
	let (with_query, _) = get(locked(), "/v1/search?resource=people&api_key=secret").await;
	let (wrong_key, _) = get(locked(), "/v1/search?resource=people&api_key=nope").await;
	let (health, _) = get(locked(), "/v1/health").await;
	let (public, _) = get(locked(), "/characters").await;

	assert_eq!(with_header, StatusCode::OK);
	assert_eq!(with_query, StatusCode::OK);
	assert_eq!(wrong_key, StatusCode::UNAUTHORIZED);
	assert_eq!(health, StatusCode::OK);
	assert_eq!(public, StatusCode::OK);
}

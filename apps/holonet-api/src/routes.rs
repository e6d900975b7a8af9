use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{PathRejection, QueryRejection},
	},
	middleware,
	routing::get,
};
use serde::{Deserialize, Serialize};

use holonet_config::MAX_GRAPH_DEPTH;
use holonet_domain::{Document, EntityReference, Pagination, ResourceKind, SortOrder, parse_fields};
use holonet_service::{
	GraphQuery, HolonetService, PlanetMapItem, RelationGraph, SearchOutcome, SearchQuery,
};
use holonet_upstream::CacheMeta;

use crate::{
	error::ApiError,
	middleware::{CorrelationId, correlate, require_api_key},
	state::AppState,
};

const PUBLIC_ALIASES: [(&str, ResourceKind); 6] = [
	("/films", ResourceKind::Films),
	("/characters", ResourceKind::People),
	("/planets", ResourceKind::Planets),
	("/starships", ResourceKind::Starships),
	("/vehicles", ResourceKind::Vehicles),
	("/species", ResourceKind::Species),
];

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub fn router(state: AppState) -> Router {
	let protected = Router::new()
		.route("/v1/search", get(search))
		.route("/v1/graph", get(graph))
		.route("/v1/planets/map", get(planets_map))
		.route("/v1/films/{resource_id}/characters", get(film_characters))
		.route("/v1/people/{resource_id}/films", get(person_films))
		.route("/v1/{resource}/{resource_id}", get(resource))
		.route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));
	let mut public = Router::new()
		.route("/health", get(health))
		.route("/v1/health", get(health))
		.route("/v1/meta", get(meta));

	for (path, kind) in PUBLIC_ALIASES {
		let handler = move |state: State<AppState>,
		                    correlation_id: CorrelationId,
		                    params: Result<Query<SearchParams>, QueryRejection>| {
			public_search(kind, state, correlation_id, params)
		};

		public = public.route(path, get(handler));
	}

	public.merge(protected).layer(middleware::from_fn(correlate)).with_state(state)
}

#[derive(Debug, Serialize)]
struct Source {
	name: &'static str,
	url: String,
}
impl Source {
	fn upstream(state: &AppState) -> Self {
		Self { name: "swapi", url: state.config().upstream.base_url.clone() }
	}

	fn internal() -> Self {
		Self { name: "holonet", url: "internal".to_string() }
	}
}

/// Every successful response: the payload fields plus source, cache and correlation id.
#[derive(Debug, Serialize)]
struct Envelope<T> {
	#[serde(flatten)]
	body: T,
	source: Source,
	cache: CacheMeta,
	correlation_id: String,
}
impl<T> Envelope<T> {
	fn new(body: T, source: Source, cache: CacheMeta, correlation_id: &CorrelationId) -> Self {
		Self { body, source, cache, correlation_id: correlation_id.to_string() }
	}
}

#[derive(Debug, Serialize)]
struct StatusBody {
	status: &'static str,
}

#[derive(Debug, Serialize)]
struct MetaBody {
	name: &'static str,
	version: &'static str,
	status: &'static str,
}

#[derive(Debug, Serialize)]
struct ItemsBody {
	items: Vec<Document>,
	pagination: Pagination,
	truncated: bool,
}

#[derive(Debug, Serialize)]
struct ItemBody {
	item: Document,
}

#[derive(Debug, Serialize)]
struct FilmCharactersBody {
	items: Vec<Document>,
	film: Document,
}

#[derive(Debug, Serialize)]
struct PersonFilmsBody {
	items: Vec<Document>,
	person: Document,
}

#[derive(Debug, Serialize)]
struct GraphBody {
	graph: RelationGraph,
}

#[derive(Debug, Serialize)]
struct PlanetsBody {
	items: Vec<PlanetMapItem>,
}

/// Search parameters shared by `/v1/search` and the public aliases.
///
/// `search` is an alias of `q` and `order_by` of `sort`; `reverse=true` forces descending.
#[derive(Debug, Default, Deserialize)]
struct SearchParams {
	resource: Option<String>,
	q: Option<String>,
	search: Option<String>,
	page: Option<u32>,
	page_size: Option<u32>,
	all: Option<bool>,
	sort: Option<String>,
	order_by: Option<String>,
	order: Option<String>,
	reverse: Option<bool>,
	fields: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphParams {
	start_resource: String,
	start_id: u64,
	depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PlanetsMapParams {
	page_size: Option<u32>,
}

async fn health(correlation_id: CorrelationId) -> Json<Envelope<StatusBody>> {
	Json(Envelope::new(
		StatusBody { status: "ok" },
		Source::internal(),
		CacheMeta::miss(0),
		&correlation_id,
	))
}

async fn meta(correlation_id: CorrelationId) -> Json<Envelope<MetaBody>> {
	Json(Envelope::new(
		MetaBody { name: "Holonet Galactic Console", version: "v1", status: "ok" },
		Source::internal(),
		CacheMeta::miss(0),
		&correlation_id,
	))
}

async fn public_search(
	kind: ResourceKind,
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<ItemsBody> {
	let Query(params) =
		params.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;
	let all = params.all.unwrap_or(true);

	run_search(&state, kind, params, all, &correlation_id).await
}

async fn search(
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<ItemsBody> {
	let Query(params) =
		params.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;
	let kind = parse_kind(params.resource.as_deref(), "resource", &correlation_id)?;

	run_search(&state, kind, params, false, &correlation_id).await
}

async fn run_search(
	state: &AppState,
	kind: ResourceKind,
	params: SearchParams,
	all: bool,
	correlation_id: &CorrelationId,
) -> ApiResult<ItemsBody> {
	let query = search_query(state, kind, params, correlation_id)?;
	let service = scoped(state, correlation_id);
	let outcome = if all { service.search_all(query).await } else { service.search(query).await };
	let outcome: SearchOutcome = outcome.map_err(|err| ApiError::service(err, correlation_id))?;

	Ok(Json(Envelope::new(
		ItemsBody {
			items: outcome.items,
			pagination: outcome.pagination,
			truncated: outcome.truncated,
		},
		Source::upstream(state),
		outcome.cache,
		correlation_id,
	)))
}

fn search_query(
	state: &AppState,
	kind: ResourceKind,
	params: SearchParams,
	correlation_id: &CorrelationId,
) -> Result<SearchQuery, ApiError> {
	let page = params.page.unwrap_or(1);
	let page_size = params.page_size.unwrap_or(state.config().search.default_page_size);

	if page == 0 || page_size == 0 {
		return Err(ApiError::validation(
			"page and page_size must be 1 or greater.",
			correlation_id,
		));
	}

	let order = if params.reverse.unwrap_or(false) {
		SortOrder::Desc
	} else {
		params
			.order
			.as_deref()
			.map(str::parse::<SortOrder>)
			.transpose()
			.map_err(|err| ApiError::validation(err.to_string(), correlation_id))?
			.unwrap_or_default()
	};
	let mut query = SearchQuery::new(kind, page, page_size);

	query.text = params.q.or(params.search);
	query.sort = params.sort.or(params.order_by);
	query.order = order;
	query.fields = parse_fields(params.fields.as_deref());

	Ok(query)
}

async fn resource(
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	path: Result<Path<(String, u64)>, PathRejection>,
) -> ApiResult<ItemBody> {
	let Path((resource, resource_id)) =
		path.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;
	let kind = resource
		.parse::<ResourceKind>()
		.map_err(|err| ApiError::not_found(err.to_string(), &correlation_id))?;

	check_id(resource_id, &correlation_id)?;

	let found = scoped(&state, &correlation_id)
		.get_resource(kind, resource_id)
		.await
		.map_err(|err| ApiError::service(err, &correlation_id))?;

	Ok(Json(Envelope::new(
		ItemBody { item: found.item },
		Source::upstream(&state),
		found.cache,
		&correlation_id,
	)))
}

async fn film_characters(
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	path: Result<Path<u64>, PathRejection>,
) -> ApiResult<FilmCharactersBody> {
	let Path(resource_id) =
		path.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;

	check_id(resource_id, &correlation_id)?;

	let related = scoped(&state, &correlation_id)
		.film_characters(resource_id)
		.await
		.map_err(|err| ApiError::service(err, &correlation_id))?;

	Ok(Json(Envelope::new(
		FilmCharactersBody { items: related.items, film: related.parent },
		Source::upstream(&state),
		related.cache,
		&correlation_id,
	)))
}

async fn person_films(
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	path: Result<Path<u64>, PathRejection>,
) -> ApiResult<PersonFilmsBody> {
	let Path(resource_id) =
		path.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;

	check_id(resource_id, &correlation_id)?;

	let related = scoped(&state, &correlation_id)
		.person_films(resource_id)
		.await
		.map_err(|err| ApiError::service(err, &correlation_id))?;

	Ok(Json(Envelope::new(
		PersonFilmsBody { items: related.items, person: related.parent },
		Source::upstream(&state),
		related.cache,
		&correlation_id,
	)))
}

async fn graph(
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	params: Result<Query<GraphParams>, QueryRejection>,
) -> ApiResult<GraphBody> {
	let Query(params) =
		params.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;
	let kind = parse_kind(Some(&params.start_resource), "start_resource", &correlation_id)?;
	let depth = params.depth.unwrap_or(1);

	check_id(params.start_id, &correlation_id)?;

	if !(1..=MAX_GRAPH_DEPTH).contains(&depth) {
		return Err(ApiError::validation(
			format!("depth must be between 1 and {MAX_GRAPH_DEPTH}."),
			&correlation_id,
		));
	}

	let query = GraphQuery::new(EntityReference::new(kind, params.start_id), depth)
		.map_err(|err| ApiError::service(err, &correlation_id))?;
	let graph = scoped(&state, &correlation_id)
		.build_graph(query)
		.await
		.map_err(|err| ApiError::service(err, &correlation_id))?;
	let ttl = state.config().cache.ttl_seconds;

	Ok(Json(Envelope::new(
		GraphBody { graph },
		Source::upstream(&state),
		CacheMeta::miss(ttl),
		&correlation_id,
	)))
}

async fn planets_map(
	State(state): State<AppState>,
	correlation_id: CorrelationId,
	params: Result<Query<PlanetsMapParams>, QueryRejection>,
) -> ApiResult<PlanetsBody> {
	let Query(params) =
		params.map_err(|err| ApiError::validation(err.body_text(), &correlation_id))?;
	let page_size = params.page_size.unwrap_or(state.config().search.default_page_size);

	if page_size == 0 {
		return Err(ApiError::validation("page_size must be 1 or greater.", &correlation_id));
	}

	let map = scoped(&state, &correlation_id)
		.planets_map(page_size)
		.await
		.map_err(|err| ApiError::service(err, &correlation_id))?;

	Ok(Json(Envelope::new(
		PlanetsBody { items: map.items },
		Source::upstream(&state),
		map.cache,
		&correlation_id,
	)))
}

fn scoped(state: &AppState, correlation_id: &CorrelationId) -> HolonetService {
	state.service.with_correlation_id(correlation_id.as_str())
}

fn parse_kind(
	raw: Option<&str>,
	param: &str,
	correlation_id: &CorrelationId,
) -> Result<ResourceKind, ApiError> {
	let raw = raw.ok_or_else(|| {
		ApiError::validation(format!("{param} is required."), correlation_id)
	})?;

	raw.parse().map_err(|err: holonet_domain::Error| {
		ApiError::validation(format!("{param}: {err}"), correlation_id)
	})
}

fn check_id(id: u64, correlation_id: &CorrelationId) -> Result<(), ApiError> {
	if id == 0 {
		return Err(ApiError::validation("Resource ids start at 1.", correlation_id));
	}

	Ok(())
}

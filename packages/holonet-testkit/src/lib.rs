use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use parking_lot::Mutex;
use serde_json::Value;

use holonet_config::{
	Cache, Config, Expand, Graph, PlanetsMap, Search, Security, Service, Upstream as UpstreamConfig,
};
use holonet_domain::{Document, ResourceKind};
use holonet_upstream::{BoxFuture, CacheMeta, Error, Fetched, Result, SearchPage, Upstream};

pub const BASE_URL: &str = "https://swapi.dev/api";
pub const CACHE_TTL: u64 = 180;

/// How a scripted URL fails.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
	NotFound,
	Status(u16),
	Unavailable,
}

/// In-memory stand-in for the upstream catalog.
///
/// Entities are keyed by URL and search pages by `(kind, page)`; the search text is recorded
/// but does not change the scripted page. Every call is logged so tests can assert on the
/// exact upstream traffic.
#[derive(Clone, Default)]
pub struct FakeUpstream {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	documents: Mutex<HashMap<String, Document>>,
	pages: Mutex<HashMap<(ResourceKind, u32), Document>>,
	failures: Mutex<HashMap<String, Failure>>,
	calls: Mutex<Vec<String>>,
	correlation_ids: Mutex<Vec<String>>,
	refuse_all: Mutex<bool>,
	latency: Mutex<Option<Duration>>,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}

impl FakeUpstream {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entity_url(kind: ResourceKind, id: u64) -> String {
		format!("{BASE_URL}/{kind}/{id}/")
	}

	/// Registers an entity; `fields` must be an object and gains a canonical `url` unless it
	/// carries one.
	pub fn with_entity(self, kind: ResourceKind, id: u64, fields: Value) -> Self {
		let url = Self::entity_url(kind, id);
		let mut document = into_document(fields);

		document.entry("url").or_insert_with(|| Value::String(url.clone()));
		self.inner.documents.lock().insert(url, document);

		self
	}

	/// Registers consecutive search pages for `kind`, starting at page 1.
	pub fn with_search_pages(self, kind: ResourceKind, pages: Vec<Value>) -> Self {
		{
			let mut stored = self.inner.pages.lock();

			for (index, page) in pages.into_iter().enumerate() {
				stored.insert((kind, index as u32 + 1), into_document(page));
			}
		}

		self
	}

	pub fn with_failure(self, url: &str, failure: Failure) -> Self {
		self.inner.failures.lock().insert(url.to_string(), failure);

		self
	}

	/// Fails every call with `Unavailable` while still recording it.
	pub fn refusing_calls(self) -> Self {
		*self.inner.refuse_all.lock() = true;

		self
	}

	pub fn with_latency(self, latency: Duration) -> Self {
		*self.inner.latency.lock() = Some(latency);

		self
	}

	pub fn calls(&self) -> Vec<String> {
		self.inner.calls.lock().clone()
	}

	pub fn search_calls(&self) -> Vec<u32> {
		self.calls()
			.iter()
			.filter_map(|call| call.strip_prefix("search:"))
			.filter_map(|rest| rest.split(':').nth(1))
			.filter_map(|page| page.parse().ok())
			.collect()
	}

	pub fn correlation_ids(&self) -> Vec<String> {
		self.inner.correlation_ids.lock().clone()
	}

	pub fn max_in_flight(&self) -> usize {
		self.inner.max_in_flight.load(Ordering::SeqCst)
	}

	async fn serve(&self, call: String, url: &str) -> Result<Fetched> {
		self.inner.calls.lock().push(call);

		let in_flight = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

		self.inner.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

		let latency = *self.inner.latency.lock();

		if let Some(latency) = latency {
			tokio::time::sleep(latency).await;
		}

		let result = self.lookup(url);

		self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

		result
	}

	fn lookup(&self, url: &str) -> Result<Fetched> {
		if *self.inner.refuse_all.lock() {
			return Err(Error::Unavailable {
				url: url.to_string(),
				message: "Upstream calls are refused in this test.".to_string(),
			});
		}

		let failure = self.inner.failures.lock().get(url).copied();

		match failure {
			Some(Failure::NotFound) => return Err(Error::NotFound { url: url.to_string() }),
			Some(Failure::Status(status)) =>
				return Err(Error::Status { url: url.to_string(), status }),
			Some(Failure::Unavailable) =>
				return Err(Error::Unavailable {
					url: url.to_string(),
					message: "connection refused".to_string(),
				}),
			None => {},
		}

		let document = self
			.inner
			.documents
			.lock()
			.get(url)
			.cloned()
			.ok_or_else(|| Error::NotFound { url: url.to_string() })?;

		Ok(Fetched { document, cache: CacheMeta::miss(CACHE_TTL) })
	}
}

impl Upstream for FakeUpstream {
	fn fetch_by_id<'a>(&'a self, kind: ResourceKind, id: u64) -> BoxFuture<'a, Result<Fetched>> {
		Box::pin(async move {
			let url = Self::entity_url(kind, id);

			self.serve(format!("id:{kind}:{id}"), &url).await
		})
	}

	fn fetch_by_url<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Fetched>> {
		Box::pin(self.serve(format!("url:{url}"), url))
	}

	fn search_page<'a>(
		&'a self,
		kind: ResourceKind,
		text: Option<&'a str>,
		page: u32,
	) -> BoxFuture<'a, Result<SearchPage>> {
		Box::pin(async move {
			let url = format!("{BASE_URL}/{kind}/?page={page}");
			let call = format!("search:{kind}:{page}:{}", text.unwrap_or_default());

			self.inner.calls.lock().push(call);

			if *self.inner.refuse_all.lock() {
				return Err(Error::Unavailable {
					url,
					message: "Upstream calls are refused in this test.".to_string(),
				});
			}

			let document = self
				.inner
				.pages
				.lock()
				.get(&(kind, page))
				.cloned()
				.ok_or(Error::NotFound { url })?;

			Ok(SearchPage::from_fetched(Fetched { document, cache: CacheMeta::miss(CACHE_TTL) }))
		})
	}

	fn with_correlation_id(&self, correlation_id: &str) -> Arc<dyn Upstream> {
		self.inner.correlation_ids.lock().push(correlation_id.to_string());

		Arc::new(self.clone())
	}
}

/// Builds a search page document the way the upstream shapes it.
pub fn search_page(count: u64, results: Vec<Value>, next: Option<&str>) -> Value {
	serde_json::json!({ "count": count, "results": results, "next": next })
}

/// A search result row named `name` pointing at `kind/id`.
pub fn row(kind: ResourceKind, id: u64, name: &str) -> Value {
	serde_json::json!({ "name": name, "url": FakeUpstream::entity_url(kind, id) })
}

/// Example defaults, except no retries and the full graph depth of 3.
pub fn sample_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		upstream: UpstreamConfig {
			base_url: BASE_URL.to_string(),
			timeout_ms: 1_000,
			retries: 0,
			backoff_factor: 0.0,
		},
		cache: Cache {
			backend: "inmemory".to_string(),
			ttl_seconds: CACHE_TTL,
			max_entries: 2_048,
			redis_url: None,
		},
		search: Search {
			default_page_size: 10,
			max_page_size: 50,
			max_upstream_pages: 6,
			max_query_chars: 120,
		},
		expand: Expand { max_concurrency: 8 },
		graph: Graph { max_nodes: 250, max_depth: 3 },
		planets_map: PlanetsMap { max_pages: 4 },
		security: Security::default(),
	}
}

fn into_document(value: Value) -> Document {
	match value {
		Value::Object(map) => map,
		other => panic!("Scripted documents must be JSON objects, got {other}."),
	}
}

pub mod cache;
pub mod client;

mod error;

pub use cache::{CacheBackend, RedisCache, TtlCache, build_cache};
pub use client::UpstreamClient;
pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use holonet_domain::{Document, ResourceKind};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to the upstream catalog.
///
/// Engines depend on this trait rather than on [`UpstreamClient`] so tests can script the
/// catalog without a network.
pub trait Upstream
where
	Self: Send + Sync,
{
	fn fetch_by_id<'a>(&'a self, kind: ResourceKind, id: u64) -> BoxFuture<'a, Result<Fetched>>;

	fn fetch_by_url<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Fetched>>;

	fn search_page<'a>(
		&'a self,
		kind: ResourceKind,
		text: Option<&'a str>,
		page: u32,
	) -> BoxFuture<'a, Result<SearchPage>>;

	/// A handle that tags every log record with `correlation_id`.
	fn with_correlation_id(&self, correlation_id: &str) -> Arc<dyn Upstream>;
}

/// Per-call cache annotation. Never stored alongside the cached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
	pub hit: bool,
	pub ttl: u64,
}
impl CacheMeta {
	pub fn hit(ttl: u64) -> Self {
		Self { hit: true, ttl }
	}

	pub fn miss(ttl: u64) -> Self {
		Self { hit: false, ttl }
	}
}

#[derive(Debug, Clone)]
pub struct Fetched {
	pub document: Document,
	pub cache: CacheMeta,
}

/// One page of upstream search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
	/// Upstream total across all pages, when reported.
	pub count: Option<u64>,
	pub results: Vec<Document>,
	pub next: Option<String>,
	pub cache: CacheMeta,
}
impl SearchPage {
	/// Reads `count`, `results` and `next`, skipping result entries that are not objects.
	pub fn from_fetched(fetched: Fetched) -> Self {
		let Fetched { mut document, cache } = fetched;
		let count = document.get("count").and_then(Value::as_u64);
		let next = document.get("next").and_then(Value::as_str).map(str::to_string);
		let results = match document.remove("results") {
			Some(Value::Array(items)) => items
				.into_iter()
				.filter_map(|item| match item {
					Value::Object(map) => Some(map),
					_ => None,
				})
				.collect(),
			_ => Vec::new(),
		};

		Self { count, results, next, cache }
	}
}

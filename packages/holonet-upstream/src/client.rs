// std
use std::{
	sync::Arc,
	time::{Duration, Instant},
};

// crates.io
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::Value;

// self
use crate::{BoxFuture, CacheBackend, CacheMeta, Error, Fetched, Result, SearchPage, Upstream};
use holonet_domain::ResourceKind;

const MAX_JITTER_SECONDS: f64 = 0.1;
const MAX_BACKOFF_EXPONENT: u32 = 10;
const MAX_BACKOFF_SECONDS: f64 = 300.0;

/// HTTP client for the upstream catalog with a cache-then-fetch path.
///
/// Cloning is cheap: the connection pool, cache and settings are shared.
#[derive(Clone)]
pub struct UpstreamClient {
	http: Client,
	cache: Option<Arc<dyn CacheBackend>>,
	settings: Arc<holonet_config::Upstream>,
	cache_ttl: u64,
	correlation_id: Option<String>,
}
impl UpstreamClient {
	pub fn new(
		settings: &holonet_config::Upstream,
		cache: Option<Arc<dyn CacheBackend>>,
		cache_ttl: u64,
	) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(settings.timeout_ms)).build()?;

		Ok(Self {
			http,
			cache,
			settings: Arc::new(settings.clone()),
			cache_ttl,
			correlation_id: None,
		})
	}

	pub fn scoped(&self, correlation_id: &str) -> Self {
		Self { correlation_id: Some(correlation_id.to_string()), ..self.clone() }
	}

	pub fn base_url(&self) -> &str {
		self.settings.base_url.trim_end_matches('/')
	}

	/// Canonical entity URL, `{base}/{resource}/{id}/`.
	pub fn resource_url(&self, kind: ResourceKind, id: u64) -> String {
		format!("{}/{kind}/{id}/", self.base_url())
	}

	pub async fn get_resource(&self, kind: ResourceKind, id: u64) -> Result<Fetched> {
		self.request(&self.resource_url(kind, id), &[]).await
	}

	pub async fn get_by_url(&self, url: &str) -> Result<Fetched> {
		self.request(url, &[]).await
	}

	pub async fn search(
		&self,
		kind: ResourceKind,
		text: Option<&str>,
		page: u32,
	) -> Result<SearchPage> {
		let url = format!("{}/{kind}/", self.base_url());
		let mut params = vec![("page", page.to_string())];

		if let Some(text) = text.filter(|text| !text.is_empty()) {
			params.push(("search", text.to_string()));
		}

		let fetched = self.request(&url, &params).await?;

		Ok(SearchPage::from_fetched(fetched))
	}

	async fn request(&self, url: &str, params: &[(&str, String)]) -> Result<Fetched> {
		let key = cache_key(url, params);
		let correlation_id = self.correlation_id.as_deref().unwrap_or("unknown");

		if let Some(cache) = self.cache.as_ref() {
			match cache.get(&key).await {
				Ok(Some(Value::Object(document))) => {
					tracing::info!(url, correlation_id, "Upstream cache hit.");

					return Ok(Fetched { document, cache: CacheMeta::hit(self.cache_ttl) });
				},
				Ok(_) => {},
				Err(err) => {
					tracing::warn!(error = %err, url, correlation_id, "Cache read failed.");
				},
			}
		}

		let attempts = self.settings.retries.saturating_add(1);
		let mut last_error = None;

		for attempt in 0..attempts {
			let started = Instant::now();
			let mut request = self.http.get(url);

			if !params.is_empty() {
				request = request.query(params);
			}

			match request.send().await {
				Ok(response) => {
					let status = response.status();

					if status == StatusCode::NOT_FOUND {
						return Err(Error::NotFound { url: url.to_string() });
					}
					if !status.is_success() {
						return Err(Error::Status { url: url.to_string(), status: status.as_u16() });
					}

					let body: Value = response.json().await.map_err(|err| Error::InvalidResponse {
						url: url.to_string(),
						message: err.to_string(),
					})?;
					let Value::Object(document) = body else {
						return Err(Error::InvalidResponse {
							url: url.to_string(),
							message: "Response body is not a JSON object.".to_string(),
						});
					};

					if let Some(cache) = self.cache.as_ref()
						&& let Err(err) = cache.set(&key, Value::Object(document.clone())).await
					{
						tracing::warn!(error = %err, url, correlation_id, "Cache write failed.");
					}

					tracing::info!(
						url,
						status = status.as_u16(),
						elapsed_ms = started.elapsed().as_millis() as u64,
						correlation_id,
						"Upstream request completed."
					);

					return Ok(Fetched { document, cache: CacheMeta::miss(self.cache_ttl) });
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						url,
						attempt,
						correlation_id,
						"Upstream request failed."
					);

					last_error = Some(err.to_string());
				},
			}

			if attempt + 1 < attempts {
				tokio::time::sleep(backoff_delay(self.settings.backoff_factor, attempt)).await;
			}
		}

		Err(Error::Unavailable {
			url: url.to_string(),
			message: last_error.unwrap_or_else(|| "unknown".to_string()),
		})
	}
}

impl Upstream for UpstreamClient {
	fn fetch_by_id<'a>(&'a self, kind: ResourceKind, id: u64) -> BoxFuture<'a, Result<Fetched>> {
		Box::pin(self.get_resource(kind, id))
	}

	fn fetch_by_url<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Fetched>> {
		Box::pin(self.get_by_url(url))
	}

	fn search_page<'a>(
		&'a self,
		kind: ResourceKind,
		text: Option<&'a str>,
		page: u32,
	) -> BoxFuture<'a, Result<SearchPage>> {
		Box::pin(self.search(kind, text, page))
	}

	fn with_correlation_id(&self, correlation_id: &str) -> Arc<dyn Upstream> {
		Arc::new(self.scoped(correlation_id))
	}
}

/// The URL alone, or the URL plus its query parameters in request order.
fn cache_key(url: &str, params: &[(&str, String)]) -> String {
	if params.is_empty() {
		return url.to_string();
	}

	let query: Vec<String> = params.iter().map(|(key, value)| format!("{key}={value}")).collect();

	format!("{url}?{}", query.join("&"))
}

fn backoff_delay(backoff_factor: f64, attempt: u32) -> Duration {
	let base = backoff_factor * f64::from(1_u32 << attempt.min(MAX_BACKOFF_EXPONENT));
	let jitter = rand::thread_rng().gen_range(0.0..MAX_JITTER_SECONDS);

	Duration::from_secs_f64((base + jitter).max(0.0).min(MAX_BACKOFF_SECONDS))
}

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub upstream: Upstream,
	pub cache: Cache,
	pub search: Search,
	pub expand: Expand,
	pub graph: Graph,
	pub planets_map: PlanetsMap,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
	/// Catalog root without a trailing slash, e.g. "https://swapi.dev/api".
	pub base_url: String,
	pub timeout_ms: u64,
	/// Extra attempts after the first one, only for transport failures.
	pub retries: u32,
	/// Seconds; attempt `n` waits `backoff_factor * 2^n` plus jitter.
	pub backoff_factor: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	/// One of "inmemory" or "redis".
	pub backend: String,
	pub ttl_seconds: u64,
	pub max_entries: usize,
	pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub default_page_size: u32,
	pub max_page_size: u32,
	pub max_upstream_pages: u32,
	#[serde(default = "default_max_query_chars")]
	pub max_query_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Expand {
	pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Graph {
	pub max_nodes: usize,
	pub max_depth: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanetsMap {
	pub max_pages: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Security {
	#[serde(default)]
	pub require_api_key: bool,
	pub api_key: Option<String>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_query_chars() -> usize {
	120
}

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, Config, Expand, Graph, PlanetsMap, Search, Security, Service, Upstream};

use std::{fs, path::Path};

pub const MAX_GRAPH_DEPTH: u32 = 3;
/// One year.
pub const MAX_CACHE_TTL_SECONDS: u64 = 31_536_000;
pub const MAX_BACKOFF_FACTOR: f64 = 60.0;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let base_url = cfg.upstream.base_url.as_str();

	if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "upstream.base_url must be an http or https URL.".to_string(),
		});
	}
	if cfg.upstream.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "upstream.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !cfg.upstream.backoff_factor.is_finite() {
		return Err(Error::Validation {
			message: "upstream.backoff_factor must be a finite number.".to_string(),
		});
	}
	if cfg.upstream.backoff_factor < 0.0 {
		return Err(Error::Validation {
			message: "upstream.backoff_factor must be zero or greater.".to_string(),
		});
	}
	if cfg.upstream.backoff_factor > MAX_BACKOFF_FACTOR {
		return Err(Error::Validation {
			message: format!("upstream.backoff_factor must be at most {MAX_BACKOFF_FACTOR}."),
		});
	}
	if !matches!(cfg.cache.backend.as_str(), "inmemory" | "redis") {
		return Err(Error::Validation {
			message: "cache.backend must be one of inmemory or redis.".to_string(),
		});
	}
	if cfg.cache.backend == "redis" && cfg.cache.redis_url.is_none() {
		return Err(Error::Validation {
			message: "cache.redis_url is required when cache.backend is redis.".to_string(),
		});
	}
	if cfg.cache.ttl_seconds == 0 {
		return Err(Error::Validation {
			message: "cache.ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.ttl_seconds > MAX_CACHE_TTL_SECONDS {
		return Err(Error::Validation {
			message: format!("cache.ttl_seconds must be at most {MAX_CACHE_TTL_SECONDS}."),
		});
	}
	if cfg.cache.max_entries == 0 {
		return Err(Error::Validation {
			message: "cache.max_entries must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_page_size == 0 || cfg.search.max_page_size == 0 {
		return Err(Error::Validation {
			message: "search page sizes must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_page_size > cfg.search.max_page_size {
		return Err(Error::Validation {
			message: "search.default_page_size must not exceed search.max_page_size.".to_string(),
		});
	}
	if cfg.search.max_upstream_pages == 0 {
		return Err(Error::Validation {
			message: "search.max_upstream_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.expand.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "expand.max_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.graph.max_nodes == 0 {
		return Err(Error::Validation {
			message: "graph.max_nodes must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_GRAPH_DEPTH).contains(&cfg.graph.max_depth) {
		return Err(Error::Validation {
			message: format!("graph.max_depth must be in the range 1-{MAX_GRAPH_DEPTH}."),
		});
	}
	if cfg.planets_map.max_pages == 0 {
		return Err(Error::Validation {
			message: "planets_map.max_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.security.require_api_key && cfg.security.api_key.is_none() {
		return Err(Error::Validation {
			message: "security.api_key must be set when security.require_api_key is true."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.upstream.base_url.trim().trim_end_matches('/').to_string();

	cfg.upstream.base_url = trimmed;

	if cfg.cache.redis_url.as_deref().map(|url| url.trim().is_empty()).unwrap_or(false) {
		cfg.cache.redis_url = None;
	}
	if cfg.security.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.security.api_key = None;
	}
}

use std::{
	collections::HashMap,
	sync::Arc,
	time::{Duration, Instant},
};

use parking_lot::Mutex;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde_json::Value;

use crate::{BoxFuture, Error, Result};

/// Key-value store shared by every in-flight request.
///
/// A miss is `Ok(None)`. Writers racing on one key resolve as last writer wins.
pub trait CacheBackend
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

	fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>>;

	fn clear<'a>(&'a self) -> BoxFuture<'a, Result<()>>;
}

/// In-process cache with a fixed TTL and oldest-expiry eviction.
///
/// The TTL is capped at [`holonet_config::MAX_CACHE_TTL_SECONDS`].
pub struct TtlCache {
	ttl: Duration,
	max_entries: usize,
	entries: Mutex<HashMap<String, (Instant, Value)>>,
}
impl TtlCache {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		let ttl = ttl.min(Duration::from_secs(holonet_config::MAX_CACHE_TTL_SECONDS));

		Self { ttl, max_entries, entries: Mutex::new(HashMap::new()) }
	}

	pub fn lookup(&self, key: &str) -> Option<Value> {
		let now = Instant::now();
		let mut entries = self.entries.lock();

		match entries.get(key) {
			Some((expires_at, value)) if *expires_at > now => Some(value.clone()),
			Some(_) => {
				entries.remove(key);

				None
			},
			None => None,
		}
	}

	pub fn insert(&self, key: &str, value: Value) {
		let now = Instant::now();
		let expires_at = now.checked_add(self.ttl).unwrap_or(now);
		let mut entries = self.entries.lock();

		if !entries.contains_key(key)
			&& entries.len() >= self.max_entries
			&& let Some(oldest) = entries
				.iter()
				.min_by_key(|(_, (expires_at, _))| *expires_at)
				.map(|(key, _)| key.clone())
		{
			entries.remove(&oldest);
		}

		entries.insert(key.to_string(), (expires_at, value));
	}

	pub fn purge(&self) {
		self.entries.lock().clear();
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl CacheBackend for TtlCache {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		let value = self.lookup(key);

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
		self.insert(key, value);

		Box::pin(async move { Ok(()) })
	}

	fn clear<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
		self.purge();

		Box::pin(async move { Ok(()) })
	}
}

/// Redis-backed cache. Values are stored as JSON text with `SETEX`.
pub struct RedisCache {
	conn: ConnectionManager,
	ttl_seconds: u64,
}
impl RedisCache {
	pub async fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self> {
		let client = redis::Client::open(redis_url)?;
		let conn = ConnectionManager::new(client).await?;

		Ok(Self { conn, ttl_seconds })
	}
}

impl CacheBackend for RedisCache {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move {
			let mut conn = self.conn.clone();
			let raw: Option<String> = conn.get(key).await?;

			raw.map(|raw| serde_json::from_str(&raw))
				.transpose()
				.map_err(|err| Error::Cache { message: format!("Invalid cached value: {err}") })
		})
	}

	fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let payload = serde_json::to_string(&value)
				.map_err(|err| Error::Cache { message: format!("Failed to encode value: {err}") })?;
			let mut conn = self.conn.clone();
			let _: () = conn.set_ex(key, payload, self.ttl_seconds).await?;

			Ok(())
		})
	}

	fn clear<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut conn = self.conn.clone();
			let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;

			Ok(())
		})
	}
}

/// Builds the backend named by `cache.backend`. Expects a validated config.
pub async fn build_cache(cfg: &holonet_config::Cache) -> Result<Arc<dyn CacheBackend>> {
	match (cfg.backend.as_str(), cfg.redis_url.as_deref()) {
		("redis", Some(url)) => Ok(Arc::new(RedisCache::connect(url, cfg.ttl_seconds).await?)),
		("redis", None) => Err(Error::Cache {
			message: "cache.redis_url is required for the redis backend.".to_string(),
		}),
		_ => Ok(Arc::new(TtlCache::new(Duration::from_secs(cfg.ttl_seconds), cfg.max_entries))),
	}
}

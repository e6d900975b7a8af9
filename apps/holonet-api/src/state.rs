use std::sync::Arc;

use holonet_config::Config;
use holonet_service::HolonetService;
use holonet_upstream::{Upstream, UpstreamClient};

#[derive(Clone)]
pub struct AppState {
	pub service: HolonetService,
}
impl AppState {
	/// Connects the configured cache backend and builds the upstream client over it.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let cache = holonet_upstream::build_cache(&config.cache).await?;
		let client =
			UpstreamClient::new(&config.upstream, Some(cache), config.cache.ttl_seconds)?;

		Ok(Self::with_upstream(config, Arc::new(client)))
	}

	pub fn with_upstream(config: Config, upstream: Arc<dyn Upstream>) -> Self {
		Self { service: HolonetService::new(Arc::new(config), upstream) }
	}

	pub fn config(&self) -> &Config {
		&self.service.cfg
	}
}

use std::sync::Arc;

use tokio::task::JoinSet;

use holonet_domain::Document;

use crate::{HolonetService, with_derived_id};

impl HolonetService {
	/// Resolves reference URLs into full documents, at most `expand.max_concurrency` at a time.
	///
	/// Best effort: a failed lookup is logged and left out. Output order follows completion,
	/// not input.
	pub async fn expand_urls(&self, urls: &[String]) -> Vec<Document> {
		if urls.is_empty() {
			return Vec::new();
		}

		let limit = self.cfg.expand.max_concurrency.max(1);
		let mut pending = urls.iter().cloned();
		let mut tasks = JoinSet::new();
		let mut documents = Vec::with_capacity(urls.len());

		loop {
			while tasks.len() < limit
				&& let Some(url) = pending.next()
			{
				let upstream = Arc::clone(&self.upstream);

				tasks.spawn(async move {
					let result = upstream.fetch_by_url(&url).await;

					(url, result)
				});
			}

			let Some(joined) = tasks.join_next().await else {
				break;
			};

			match joined {
				Ok((_, Ok(fetched))) => documents.push(with_derived_id(fetched.document)),
				Ok((url, Err(err))) => {
					tracing::warn!(url = %url, error = %err, "Expand lookup failed.");
				},
				Err(err) => {
					tracing::warn!(error = %err, "Expand task did not complete.");
				},
			}
		}

		documents
	}
}

use serde::{Deserialize, Serialize};

use holonet_domain::{Document, Pagination, ResourceKind, SortOrder, project_fields, sort_documents};
use holonet_upstream::CacheMeta;

use crate::{Error, HolonetService, Result, with_derived_id};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
	pub resource: ResourceKind,
	pub text: Option<String>,
	pub page: u32,
	pub page_size: u32,
	pub sort: Option<String>,
	#[serde(default)]
	pub order: SortOrder,
	pub fields: Option<Vec<String>>,
}
impl SearchQuery {
	pub fn new(resource: ResourceKind, page: u32, page_size: u32) -> Self {
		Self {
			resource,
			text: None,
			page,
			page_size,
			sort: None,
			order: SortOrder::Asc,
			fields: None,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
	pub items: Vec<Document>,
	pub pagination: Pagination,
	/// Cache annotation of the last upstream page fetched.
	pub cache: CacheMeta,
	/// Fetching stopped at `search.max_upstream_pages` before the upstream ran out of pages and
	/// before the requested rows were collected.
	pub truncated: bool,
}

struct Aggregate {
	items: Vec<Document>,
	total_items: u64,
	cache: CacheMeta,
	truncated: bool,
}

impl HolonetService {
	/// Returns one window of the virtual concatenation of upstream result pages.
	///
	/// Only as many upstream pages as the window needs are fetched. Sorting and projection
	/// apply to the window alone, so ordering is not global across windows.
	pub async fn search(&self, query: SearchQuery) -> Result<SearchOutcome> {
		self.check_query(&query)?;

		let (start, end) = window(query.page, query.page_size);
		let aggregate = self.aggregate(&query, Some(end)).await?;

		if start >= aggregate.items.len() && aggregate.total_items > 0 {
			return Err(Error::OutOfRange { page: query.page });
		}

		let mut items: Vec<Document> =
			aggregate.items.into_iter().skip(start).take(end - start).collect();

		if let Some(sort) = query.sort.as_deref() {
			sort_documents(&mut items, sort, query.order);
		}

		Ok(SearchOutcome {
			items: project_fields(items, query.fields.as_deref()),
			pagination: Pagination::new(query.page, query.page_size, aggregate.total_items),
			cache: aggregate.cache,
			truncated: aggregate.truncated,
		})
	}

	/// Fetches every upstream page (up to the page cap), sorts and projects the whole
	/// collection, then returns the requested window of it.
	pub async fn search_all(&self, query: SearchQuery) -> Result<SearchOutcome> {
		self.check_query(&query)?;

		let (start, end) = window(query.page, query.page_size);
		let aggregate = self.aggregate(&query, None).await?;
		let mut items = aggregate.items;

		if let Some(sort) = query.sort.as_deref() {
			sort_documents(&mut items, sort, query.order);
		}

		let items = project_fields(items, query.fields.as_deref());

		if start >= items.len() && aggregate.total_items > 0 {
			return Err(Error::OutOfRange { page: query.page });
		}

		Ok(SearchOutcome {
			items: items.into_iter().skip(start).take(end - start).collect(),
			pagination: Pagination::new(query.page, query.page_size, aggregate.total_items),
			cache: aggregate.cache,
			truncated: aggregate.truncated,
		})
	}

	/// Rejects bad windows and sort fields before any upstream call, so an unknown sort field
	/// is reported even when the page would also be out of range.
	fn check_query(&self, query: &SearchQuery) -> Result<()> {
		let cfg = &self.cfg.search;

		if query.page == 0 {
			return Err(Error::InvalidRequest { message: "page must be 1 or greater.".to_string() });
		}
		if query.page_size == 0 {
			return Err(Error::InvalidRequest {
				message: "page_size must be 1 or greater.".to_string(),
			});
		}
		if query.page_size > cfg.max_page_size {
			return Err(Error::PageSizeExceeded { max_page_size: cfg.max_page_size });
		}
		if let Some(text) = query.text.as_deref()
			&& text.chars().count() > cfg.max_query_chars
		{
			return Err(Error::InvalidRequest {
				message: format!("q must be at most {} characters.", cfg.max_query_chars),
			});
		}
		if let Some(sort) = query.sort.as_deref()
			&& !query.resource.allows_sort(sort)
		{
			let allowed = query.resource.sort_fields().iter().map(|field| field.to_string());

			return Err(Error::InvalidSort { sort: sort.to_string(), allowed: allowed.collect() });
		}

		Ok(())
	}

	/// Pulls upstream pages in order until `target` rows are held, the upstream has no next
	/// page, or the page cap is reached. `None` means fetch until exhaustion.
	async fn aggregate(&self, query: &SearchQuery, target: Option<usize>) -> Result<Aggregate> {
		let ttl = self.cfg.cache.ttl_seconds;
		let mut items = Vec::new();
		let mut total_items = None;
		let mut cache = CacheMeta::miss(ttl);
		let mut exhausted = false;

		for upstream_page in 1..=self.cfg.search.max_upstream_pages {
			let page = self
				.upstream
				.search_page(query.resource, query.text.as_deref(), upstream_page)
				.await?;

			cache = page.cache;
			total_items = page.count.or(total_items);
			items.extend(page.results.into_iter().map(with_derived_id));

			if page.next.is_none() {
				exhausted = true;

				break;
			}
			if target.is_some_and(|target| items.len() >= target) {
				break;
			}
		}

		let truncated = !exhausted && target.is_none_or(|target| items.len() < target);

		if truncated {
			tracing::info!(
				resource = %query.resource,
				collected = items.len(),
				max_upstream_pages = self.cfg.search.max_upstream_pages,
				"Search stopped at the upstream page cap."
			);
		}

		Ok(Aggregate {
			total_items: total_items.unwrap_or(items.len() as u64),
			items,
			cache,
			truncated,
		})
	}
}

/// `[start, end)` row offsets of `page` in the concatenated result set.
fn window(page: u32, page_size: u32) -> (usize, usize) {
	let page_size = page_size as usize;
	let start = (page.saturating_sub(1) as usize).saturating_mul(page_size);

	(start, start.saturating_add(page_size))
}

use serde::{Deserialize, Serialize};

/// Page metadata derived from the requested window and the upstream total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	pub page: u32,
	pub page_size: u32,
	pub total_items: u64,
	pub total_pages: u64,
	pub has_next: bool,
	pub has_prev: bool,
}
impl Pagination {
	pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
		let total_pages =
			if page_size == 0 { 1 } else { total_items.div_ceil(u64::from(page_size)).max(1) };

		Self {
			page,
			page_size,
			total_items,
			total_pages,
			has_next: u64::from(page) < total_pages,
			has_prev: page > 1,
		}
	}
}

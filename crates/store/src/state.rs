use hx_api::{Filters, Query, SortOrder};

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_SORT_FIELD: &str = "id";

/// What to do with a list response when a newer list fetch was issued after it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePolicy {
	/// Only the most recently issued fetch may write its result.
	#[default]
	LatestIssued,
	/// Whichever response arrives last wins, regardless of issue order.
	LastWriteWins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
	pub page_size: u32,
	pub sort_field: String,
	pub sort_order: SortOrder,
	pub response_policy: ResponsePolicy,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			page_size: DEFAULT_PAGE_SIZE,
			sort_field: DEFAULT_SORT_FIELD.to_string(),
			sort_order: SortOrder::Asc,
			response_policy: ResponsePolicy::default(),
		}
	}
}

impl StoreConfig {
	#[must_use]
	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = page_size.max(1);
		self
	}

	#[must_use]
	pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
		self.sort_field = field.into();
		self.sort_order = order;
		self
	}

	#[must_use]
	pub const fn with_response_policy(mut self, policy: ResponsePolicy) -> Self {
		self.response_policy = policy;
		self
	}
}

/// Everything a screen renders from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<T> {
	pub items: Vec<T>,
	pub current_item: Option<T>,

	pub is_loading: bool,
	pub is_refreshing: bool,
	pub is_loading_more: bool,

	pub error: Option<String>,

	pub current_page: u32,
	pub page_size: u32,
	pub total_items: u64,
	pub total_pages: u64,
	pub has_more: bool,

	pub filters: Filters,
	pub search_query: String,
	pub sort_field: String,
	pub sort_order: SortOrder,
}

impl<T> StoreState<T> {
	#[must_use]
	pub fn initial(config: &StoreConfig) -> Self {
		Self {
			items: Vec::new(),
			current_item: None,
			is_loading: false,
			is_refreshing: false,
			is_loading_more: false,
			error: None,
			current_page: 1,
			page_size: config.page_size.max(1),
			total_items: 0,
			total_pages: 0,
			has_more: false,
			filters: Filters::new(),
			search_query: String::new(),
			sort_field: config.sort_field.clone(),
			sort_order: config.sort_order,
		}
	}

	/// The list query for `page` under the current filters, sort and search.
	pub(crate) fn query_for_page(&self, page: u32) -> Query {
		let mut query = Query::new()
			.page(page)
			.limit(self.page_size)
			.sorted(self.sort_field.clone(), self.sort_order)
			.with_filters(&self.filters);

		if !self.search_query.is_empty() {
			query = query.with_search(self.search_query.clone());
		}

		query
	}

	pub(crate) fn query(&self) -> Query {
		self.query_for_page(self.current_page)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_reflects_state() {
		let config = StoreConfig::default()
			.with_page_size(20)
			.with_sort("rating", SortOrder::Desc);
		let mut state = StoreState::<()>::initial(&config);
		state.current_page = 3;
		state.search_query = "hoi an".into();
		state.filters.insert("status", "active").unwrap();

		let params = state.query().to_params();

		assert_eq!(params.get("page").map(String::as_str), Some("3"));
		assert_eq!(params.get("limit").map(String::as_str), Some("20"));
		assert_eq!(params.get("sort").map(String::as_str), Some("rating"));
		assert_eq!(params.get("order").map(String::as_str), Some("desc"));
		assert_eq!(params.get("q").map(String::as_str), Some("hoi an"));
		assert_eq!(params.get("status").map(String::as_str), Some("active"));
	}

	#[test]
	fn empty_search_is_not_sent() {
		let state = StoreState::<()>::initial(&StoreConfig::default());
		assert!(!state.query().to_params().contains_key("q"));
		assert_eq!(state.page_size, DEFAULT_PAGE_SIZE);
	}
}

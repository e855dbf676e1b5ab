use std::{any::type_name, fmt, sync::Arc};

use hx_api::{
	Entity, EntityId, EntitySource, Error, Filters, PaginatedResult, Patch, Query, SortOrder,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::{
	overlay::{LocalEdit, LocalOverlay},
	state::{ResponsePolicy, StoreConfig, StoreState},
};

struct Core<T> {
	state: StoreState<T>,
	snapshot: Vec<T>,
	overlay: LocalOverlay<T>,
	/// Bumped by every list fetch that replaces the items, and by `reset`.
	generation: u64,
}

impl<T: Entity> Core<T> {
	fn new(config: &StoreConfig) -> Self {
		Self {
			state: StoreState::initial(config),
			snapshot: Vec::new(),
			overlay: LocalOverlay::new(),
			generation: 0,
		}
	}

	fn accepts(&self, generation: u64, policy: ResponsePolicy) -> bool {
		match policy {
			ResponsePolicy::LatestIssued => self.generation == generation,
			ResponsePolicy::LastWriteWins => true,
		}
	}

	fn replace_page(&mut self, page: PaginatedResult<T>) {
		self.snapshot = page.items;
		self.overlay.clear();
		self.state.total_items = page.total;
		self.state.total_pages = page.total_pages;
		self.state.has_more = page.has_next;
	}
}

struct Inner<T> {
	source: Arc<dyn EntitySource<T>>,
	config: StoreConfig,
	core: Mutex<Core<T>>,
	tx: watch::Sender<StoreState<T>>,
}

/// Shared handle to the state of one entity type.
///
/// Actions never return errors: failures end up in [`StoreState::error`] and previously loaded
/// items are kept. List fetches are not serialized, but with the default
/// [`ResponsePolicy::LatestIssued`] a response only lands if no other list fetch was issued
/// after it.
pub struct EntityStore<T> {
	inner: Arc<Inner<T>>,
}

impl<T> Clone for EntityStore<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> fmt::Debug for EntityStore<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntityStore")
			.field("entity", &type_name::<T>())
			.field("config", &self.inner.config)
			.finish_non_exhaustive()
	}
}

impl<T: Entity> EntityStore<T> {
	pub fn new(source: impl EntitySource<T>, config: StoreConfig) -> Self {
		Self::from_shared(Arc::new(source), config)
	}

	pub fn from_shared(source: Arc<dyn EntitySource<T>>, config: StoreConfig) -> Self {
		let core = Core::new(&config);
		let (tx, _) = watch::channel(core.state.clone());

		Self {
			inner: Arc::new(Inner {
				source,
				config,
				core: Mutex::new(core),
				tx,
			}),
		}
	}

	#[must_use]
	pub fn config(&self) -> &StoreConfig {
		&self.inner.config
	}

	#[must_use]
	pub fn state(&self) -> StoreState<T> {
		self.inner.tx.borrow().clone()
	}

	/// Receives every state change made after this call.
	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<StoreState<T>> {
		self.inner.tx.subscribe()
	}

	/// Local edits not yet superseded by a fresh list from the backend.
	#[must_use]
	pub fn pending_edits(&self) -> Vec<LocalEdit<T>> {
		self.inner.core.lock().overlay.edits().to_vec()
	}

	/// Runs `f` on the core and publishes the resulting state.
	fn update<R>(&self, f: impl FnOnce(&mut Core<T>) -> R) -> R {
		let mut core = self.inner.core.lock();
		let out = f(&mut core);
		self.publish(&mut core);

		out
	}

	fn publish(&self, core: &mut Core<T>) {
		core.state.items = core.overlay.apply(&core.snapshot);
		self.inner.tx.send_replace(core.state.clone());
	}

	/// Starts a list fetch that will replace the items, returning its generation.
	fn begin_list_fetch(&self, prepare: impl FnOnce(&mut StoreState<T>) -> Query) -> (u64, Query) {
		self.update(|core| {
			core.generation += 1;
			core.state.is_loading = true;
			core.state.error = None;

			(core.generation, prepare(&mut core.state))
		})
	}

	fn finish_list_fetch(&self, generation: u64, result: Result<PaginatedResult<T>, Error>) {
		let policy = self.inner.config.response_policy;

		let mut core = self.inner.core.lock();

		// Nothing changes, subscribers aren't woken up
		if !core.accepts(generation, policy) {
			debug!(
				generation,
				latest = core.generation,
				"Discarding response of a superseded fetch"
			);
			return;
		}

		core.state.is_loading = false;

		match result {
			Ok(page) => core.replace_page(page),
			Err(e) => {
				warn!(%e, "Failed to fetch entities, keeping current items");
				core.state.error = Some(e.to_string());
			}
		}

		self.publish(&mut core);
	}

	/// Fetches the current page with the current filters, sort and search. `extra` parameters
	/// win over the store's own on collision.
	#[instrument(skip_all, fields(entity = type_name::<T>()))]
	pub async fn fetch_all(&self, extra: Option<Query>) {
		let (generation, query) = self.begin_list_fetch(|state| state.query());

		let query = match extra {
			Some(extra) => query.merged_with(&extra),
			None => query,
		};

		let result = self.inner.source.get_all(&query).await;
		self.finish_list_fetch(generation, result);
	}

	/// Sets the current item. On failure the previous current item stays, the error is stored
	/// and `None` is returned.
	#[instrument(skip(self), fields(entity = type_name::<T>()))]
	pub async fn fetch_by_id(&self, id: EntityId) -> Option<T> {
		self.update(|core| {
			core.state.is_loading = true;
			core.state.error = None;
		});

		let result = self.inner.source.get_by_id(&id).await;

		self.update(|core| {
			core.state.is_loading = false;

			match result {
				Ok(item) => {
					core.state.current_item = Some(item.clone());
					Some(item)
				}
				Err(e) => {
					warn!(%e, "Failed to fetch entity");
					core.state.error = Some(e.to_string());
					None
				}
			}
		})
	}

	/// Appends the next page. Does nothing when there is no next page or an append is already
	/// running.
	#[instrument(skip_all, fields(entity = type_name::<T>()))]
	pub async fn fetch_more(&self) {
		let started = self.update(|core| {
			let state = &mut core.state;
			if !state.has_more || state.is_loading_more {
				return None;
			}

			state.is_loading_more = true;
			state.error = None;

			let next_page = state.current_page + 1;
			Some((core.generation, next_page, state.query_for_page(next_page)))
		});

		let Some((generation, next_page, query)) = started else {
			debug!("No more pages to fetch or already fetching");
			return;
		};

		let result = self.inner.source.get_all(&query).await;
		let policy = self.inner.config.response_policy;

		self.update(|core| {
			core.state.is_loading_more = false;

			if !core.accepts(generation, policy) {
				debug!(next_page, "Discarding page fetched for a superseded list");
				return;
			}

			match result {
				Ok(page) => {
					core.snapshot.extend(page.items);
					core.state.current_page = next_page;
					core.state.has_more = page.has_next;
					// `total_items` stays, it already counts local inserts and removals
					core.state.total_pages = page.total_pages;
				}
				Err(e) => {
					warn!(%e, next_page, "Failed to fetch more entities");
					core.state.error = Some(e.to_string());
				}
			}
		});
	}

	/// Back to the first page keeping filters and search, then [`Self::fetch_all`].
	pub async fn refresh(&self) {
		self.update(|core| {
			core.state.is_refreshing = true;
			core.state.error = None;
			core.state.current_page = 1;
		});

		self.fetch_all(None).await;

		self.update(|core| core.state.is_refreshing = false);
	}

	#[instrument(skip(self), fields(entity = type_name::<T>()))]
	pub async fn search(&self, text: &str) {
		let (generation, query) = self.begin_list_fetch(|state| {
			state.search_query = text.to_string();
			state.current_page = 1;

			Query::new()
				.page(1)
				.limit(state.page_size)
				.sorted(state.sort_field.clone(), state.sort_order)
				.with_filters(&state.filters)
		});

		let result = self.inner.source.search(text, &query).await;
		self.finish_list_fetch(generation, result);
	}

	/// Stages filters without fetching, run [`Self::apply_filters`] or [`Self::fetch_all`] to
	/// use them.
	pub fn set_filters(&self, filters: Filters) {
		self.update(|core| {
			core.state.filters = filters;
			core.state.current_page = 1;
		});
	}

	/// Clears filters and search, then fetches right away.
	pub async fn clear_filters(&self) {
		self.update(|core| {
			core.state.filters.clear();
			core.state.search_query.clear();
			core.state.current_page = 1;
		});

		self.fetch_all(None).await;
	}

	/// Changes the sort, then fetches right away.
	pub async fn set_sorting(&self, field: impl Into<String> + Send, order: SortOrder) {
		let field = field.into();

		self.update(|core| {
			core.state.sort_field = field;
			core.state.sort_order = order;
			core.state.current_page = 1;
		});

		self.fetch_all(None).await;
	}

	pub async fn apply_filters(&self) {
		self.update(|core| core.state.current_page = 1);
		self.fetch_all(None).await;
	}

	/// Optimistically shows `item` first. It's the caller's job to have persisted it.
	pub fn add_item(&self, item: T) {
		self.update(|core| {
			core.overlay.push(LocalEdit::Insert(item));
			core.state.total_items += 1;
		});
	}

	pub fn remove_item(&self, id: EntityId) {
		self.remove_item_by(T::ID_FIELD, id);
	}

	/// Removes every item whose serialized `field` equals `id`.
	pub fn remove_item_by(&self, field: &str, id: EntityId) {
		self.update(|core| {
			core.overlay.push(LocalEdit::Remove {
				field: field.to_string(),
				id,
			});
			core.state.total_items = core.state.total_items.saturating_sub(1);
		});
	}

	pub fn update_item(&self, id: EntityId, patch: Patch) {
		self.update(|core| core.overlay.push(LocalEdit::Update { id, patch }));
	}

	/// Replaces the items with a locally known list, dropping local edits.
	pub fn set_items(&self, items: Vec<T>) {
		self.update(|core| {
			core.state.total_items = items.len() as u64;
			core.snapshot = items;
			core.overlay.clear();
		});
	}

	pub fn set_current_item(&self, item: Option<T>) {
		self.update(|core| core.state.current_item = item);
	}

	pub async fn set_page(&self, page: u32) {
		self.update(|core| core.state.current_page = page.max(1));
		self.fetch_all(None).await;
	}

	pub async fn next_page(&self) {
		let state = self.state();
		if state.has_more {
			self.set_page(state.current_page + 1).await;
		}
	}

	pub async fn prev_page(&self) {
		let current_page = self.state().current_page;
		if current_page > 1 {
			self.set_page(current_page - 1).await;
		}
	}

	pub async fn set_page_size(&self, size: u32) {
		self.update(|core| {
			core.state.page_size = size.max(1);
			core.state.current_page = 1;
		});

		self.fetch_all(None).await;
	}

	pub fn set_loading(&self, loading: bool) {
		self.update(|core| core.state.is_loading = loading);
	}

	pub fn set_error(&self, error: Option<String>) {
		self.update(|core| core.state.error = error);
	}

	/// Back to the construction time defaults. Responses of fetches still in flight are
	/// discarded under [`ResponsePolicy::LatestIssued`].
	pub fn reset(&self) {
		let config = &self.inner.config;

		self.update(|core| {
			let generation = core.generation + 1;
			*core = Core::new(config);
			core.generation = generation;
		});
	}
}

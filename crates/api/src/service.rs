use std::{fmt, marker::PhantomData};

use async_trait::async_trait;
use futures_concurrency::future::Join;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{
	client::ApiClient,
	entity::{Entity, EntityId},
	envelope::PaginatedResult,
	error::Error,
	query::{Filters, Query},
	transport::{Method, Request},
};

const SEARCH_SEGMENT: &str = "search";
const INCLUDE_PARAM: &str = "include";

/// REST operations over one resource, configured only by its base path.
///
/// Each method issues exactly one request, except the batch ones, which issue one request per
/// input concurrently.
pub struct ApiService<T> {
	client: ApiClient,
	base_path: String,
	_entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ApiService<T> {
	fn clone(&self) -> Self {
		Self {
			client: self.client.clone(),
			base_path: self.base_path.clone(),
			_entity: PhantomData,
		}
	}
}

impl<T> fmt::Debug for ApiService<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApiService")
			.field("base_path", &self.base_path)
			.finish_non_exhaustive()
	}
}

impl<T: Entity> ApiService<T> {
	pub fn new(client: ApiClient, base_path: impl Into<String>) -> Self {
		let base_path = base_path.into();

		Self {
			client,
			base_path: base_path.trim_end_matches('/').to_string(),
			_entity: PhantomData,
		}
	}

	#[must_use]
	pub fn base_path(&self) -> &str {
		&self.base_path
	}

	#[must_use]
	pub const fn client(&self) -> &ApiClient {
		&self.client
	}

	/// Path of a sub resource, e.g. `path(["7", "artifacts"])` is `base/7/artifacts`.
	pub fn path<S: fmt::Display>(&self, segments: impl IntoIterator<Item = S>) -> String {
		segments
			.into_iter()
			.fold(self.base_path.clone(), |mut path, segment| {
				path.push('/');
				path.push_str(&segment.to_string());
				path
			})
	}

	fn item_path(&self, id: &EntityId) -> String {
		self.path([id])
	}

	#[instrument(skip(self), fields(resource = %self.base_path), err)]
	pub async fn get_all(&self, query: &Query) -> Result<PaginatedResult<T>, Error> {
		self.client
			.fetch_page(
				Request::new(Method::Get, &self.base_path).with_params(query.to_params()),
				query,
			)
			.await
	}

	pub async fn get_by_id(&self, id: impl Into<EntityId> + Send) -> Result<T, Error> {
		self.get_by_id_with(id, &[]).await
	}

	/// Fetches one entity, asking the backend to embed the given relations.
	#[instrument(skip(self, id), fields(resource = %self.base_path), err)]
	pub async fn get_by_id_with(
		&self,
		id: impl Into<EntityId> + Send,
		relations: &[&str],
	) -> Result<T, Error> {
		let id = id.into();
		let mut request = Request::new(Method::Get, self.item_path(&id));

		if !relations.is_empty() {
			request
				.params
				.insert(INCLUDE_PARAM.to_string(), relations.join(","));
		}

		debug!(%id, "Fetching entity");

		self.client.fetch(request).await
	}

	/// Free text search on `base/search`, the text travels as the `q` parameter.
	pub async fn search(&self, text: &str, query: &Query) -> Result<PaginatedResult<T>, Error> {
		let query = query.clone().with_search(text);

		self.client
			.fetch_page(
				Request::new(Method::Get, self.path([SEARCH_SEGMENT]))
					.with_params(query.to_params()),
				&query,
			)
			.await
	}

	pub async fn filter(
		&self,
		filters: &Filters,
		query: &Query,
	) -> Result<PaginatedResult<T>, Error> {
		self.get_all(&query.clone().with_filters(filters)).await
	}

	pub async fn create<P: Serialize + Sync + ?Sized>(&self, partial: &P) -> Result<T, Error> {
		self.client
			.fetch(
				Request::new(Method::Post, &self.base_path)
					.with_body(serde_json::to_value(partial)?),
			)
			.await
	}

	/// Full replacement through `PUT`.
	pub async fn update<P: Serialize + Sync + ?Sized>(
		&self,
		id: impl Into<EntityId> + Send,
		partial: &P,
	) -> Result<T, Error> {
		self.client
			.fetch(
				Request::new(Method::Put, self.item_path(&id.into()))
					.with_body(serde_json::to_value(partial)?),
			)
			.await
	}

	pub async fn patch<P: Serialize + Sync + ?Sized>(
		&self,
		id: impl Into<EntityId> + Send,
		partial: &P,
	) -> Result<T, Error> {
		self.client
			.fetch(
				Request::new(Method::Patch, self.item_path(&id.into()))
					.with_body(serde_json::to_value(partial)?),
			)
			.await
	}

	pub async fn delete(&self, id: impl Into<EntityId> + Send) -> Result<(), Error> {
		self.client
			.execute(Request::new(Method::Delete, self.item_path(&id.into())))
			.await
	}

	/// All requests run to completion, then the first error (in input order) is returned. There
	/// is no partial success reporting.
	pub async fn batch_create<P: Serialize + Sync>(&self, items: &[P]) -> Result<Vec<T>, Error> {
		items
			.iter()
			.map(|item| self.create(item))
			.collect::<Vec<_>>()
			.join()
			.await
			.into_iter()
			.collect()
	}

	pub async fn batch_update<P: Serialize + Sync>(
		&self,
		items: &[(EntityId, P)],
	) -> Result<Vec<T>, Error> {
		items
			.iter()
			.map(|(id, item)| self.update(id.clone(), item))
			.collect::<Vec<_>>()
			.join()
			.await
			.into_iter()
			.collect()
	}

	pub async fn batch_delete(&self, ids: &[EntityId]) -> Result<(), Error> {
		ids.iter()
			.map(|id| self.delete(id.clone()))
			.collect::<Vec<_>>()
			.join()
			.await
			.into_iter()
			.collect()
	}

	/// Never fails, any error counts as "doesn't exist".
	pub async fn exists(&self, id: impl Into<EntityId> + Send) -> bool {
		let id = id.into();

		match self.get_by_id(id.clone()).await {
			Ok(_) => true,
			Err(e) => {
				debug!(%id, %e, "Entity considered missing");
				false
			}
		}
	}

	pub async fn count(&self, query: &Query) -> Result<u64, Error> {
		self.get_all(&query.clone().page(1).limit(1))
			.await
			.map(|page| page.total)
	}
}

/// What a store needs from a service to fill itself.
#[async_trait]
pub trait EntitySource<T: Entity>: Send + Sync + 'static {
	async fn get_all(&self, query: &Query) -> Result<PaginatedResult<T>, Error>;

	async fn get_by_id(&self, id: &EntityId) -> Result<T, Error>;

	async fn search(&self, text: &str, query: &Query) -> Result<PaginatedResult<T>, Error>;
}

#[async_trait]
impl<T: Entity> EntitySource<T> for ApiService<T> {
	async fn get_all(&self, query: &Query) -> Result<PaginatedResult<T>, Error> {
		Self::get_all(self, query).await
	}

	async fn get_by_id(&self, id: &EntityId) -> Result<T, Error> {
		Self::get_by_id(self, id.clone()).await
	}

	async fn search(&self, text: &str, query: &Query) -> Result<PaginatedResult<T>, Error> {
		Self::search(self, text, query).await
	}
}

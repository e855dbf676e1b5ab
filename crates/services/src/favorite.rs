use std::ops::Deref;

use hx_api::{
	ApiClient, ApiService, EntityId, Error, Method, PaginatedResult, Query, QueryParams, Request,
};
use serde::Deserialize;
use tracing::debug;

use crate::entities::{Favorite, FavoriteType};

pub const FAVORITES_PATH: &str = "/favorites";

// This endpoint pages with its own parameter names
const PAGE_PARAM: &str = "_page";
const LIMIT_PARAM: &str = "_limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
	pub is_favorite: bool,
}

#[derive(Debug, Clone)]
pub struct FavoriteService {
	api: ApiService<Favorite>,
}

impl Deref for FavoriteService {
	type Target = ApiService<Favorite>;

	fn deref(&self) -> &Self::Target {
		&self.api
	}
}

impl FavoriteService {
	#[must_use]
	pub fn new(client: ApiClient) -> Self {
		Self {
			api: ApiService::new(client, FAVORITES_PATH),
		}
	}

	/// Adds or removes the favorite, answering with the new status.
	pub async fn toggle(&self, kind: FavoriteType, id: i64) -> Result<FavoriteStatus, Error> {
		self.client()
			.fetch(Request::new(
				Method::Post,
				self.path([kind.to_string(), id.to_string(), "toggle".to_string()]),
			))
			.await
	}

	pub async fn by_type(
		&self,
		kind: FavoriteType,
		page: u32,
		limit: u32,
	) -> Result<PaginatedResult<Favorite>, Error> {
		let query = Query::new().page(page).limit(limit);
		let params = QueryParams::from([
			(PAGE_PARAM.to_string(), page.max(1).to_string()),
			(LIMIT_PARAM.to_string(), limit.max(1).to_string()),
		]);

		self.client()
			.fetch_page(
				Request::new(Method::Get, self.path([kind])).with_params(params),
				&query,
			)
			.await
	}

	/// Never fails, any error counts as "not a favorite".
	pub async fn is_favorite(&self, kind: FavoriteType, id: i64) -> bool {
		let result = self
			.client()
			.fetch::<FavoriteStatus>(Request::new(
				Method::Get,
				self.path([kind.to_string(), id.to_string(), "check".to_string()]),
			))
			.await;

		match result {
			Ok(status) => status.is_favorite,
			Err(e) => {
				debug!(%kind, id, %e, "Favorite check failed, assuming it isn't one");
				false
			}
		}
	}

	/// Only the referenced ids, lighter than listing the favorites.
	pub async fn ids(&self, kind: FavoriteType) -> Result<Vec<EntityId>, Error> {
		self.client()
			.fetch(Request::new(
				Method::Get,
				self.path([kind.to_string(), "ids".to_string()]),
			))
			.await
	}

	pub async fn remove(&self, kind: FavoriteType, id: i64) -> Result<(), Error> {
		self.client()
			.execute(Request::new(
				Method::Delete,
				self.path([kind.to_string(), id.to_string()]),
			))
			.await
	}
}

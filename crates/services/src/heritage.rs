use std::ops::Deref;

use hx_api::{ApiClient, ApiService, EntityId, Error, Method, QueryParams, Request};

use crate::entities::{Artifact, HeritageSite, TimelineEvent};

pub const HERITAGE_SITES_PATH: &str = "/heritage-sites";

/// Heritage sites plus their related artifacts and timelines.
#[derive(Debug, Clone)]
pub struct HeritageService {
	api: ApiService<HeritageSite>,
}

impl Deref for HeritageService {
	type Target = ApiService<HeritageSite>;

	fn deref(&self) -> &Self::Target {
		&self.api
	}
}

impl HeritageService {
	#[must_use]
	pub fn new(client: ApiClient) -> Self {
		Self {
			api: ApiService::new(client, HERITAGE_SITES_PATH),
		}
	}

	pub async fn nearby(&self, latitude: f64, longitude: f64) -> Result<Vec<HeritageSite>, Error> {
		let params = QueryParams::from([
			("latitude".to_string(), latitude.to_string()),
			("longitude".to_string(), longitude.to_string()),
		]);

		self.client()
			.fetch(Request::new(Method::Get, self.path(["nearby"])).with_params(params))
			.await
	}

	pub async fn artifacts(&self, id: impl Into<EntityId> + Send) -> Result<Vec<Artifact>, Error> {
		self.client()
			.fetch(Request::new(
				Method::Get,
				self.path([id.into().to_string(), "artifacts".to_string()]),
			))
			.await
	}

	pub async fn timeline(
		&self,
		id: impl Into<EntityId> + Send,
	) -> Result<Vec<TimelineEvent>, Error> {
		self.client()
			.fetch(Request::new(
				Method::Get,
				self.path([id.into().to_string(), "timeline".to_string()]),
			))
			.await
	}
}

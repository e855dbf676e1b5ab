use std::ops::Deref;

use hx_api::{ApiClient, ApiService, Error, Method, Request};

use crate::entities::Review;

pub const REVIEWS_PATH: &str = "/reviews";

#[derive(Debug, Clone)]
pub struct ReviewService {
	api: ApiService<Review>,
}

impl Deref for ReviewService {
	type Target = ApiService<Review>;

	fn deref(&self) -> &Self::Target {
		&self.api
	}
}

impl ReviewService {
	#[must_use]
	pub fn new(client: ApiClient) -> Self {
		Self {
			api: ApiService::new(client, REVIEWS_PATH),
		}
	}

	/// Reviews of one kind of target, e.g. `heritage`.
	pub async fn by_type(&self, kind: &str) -> Result<Vec<Review>, Error> {
		self.client()
			.fetch(Request::new(Method::Get, self.path(["type", kind])))
			.await
	}
}

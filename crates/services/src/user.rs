use std::ops::Deref;

use hx_api::{ApiClient, ApiService, EntityId, Error, Method, Patch, Request};
use serde_json::Value;

use crate::entities::User;

pub const USERS_PATH: &str = "/users";

#[derive(Debug, Clone)]
pub struct UserService {
	api: ApiService<User>,
}

impl Deref for UserService {
	type Target = ApiService<User>;

	fn deref(&self) -> &Self::Target {
		&self.api
	}
}

impl UserService {
	#[must_use]
	pub fn new(client: ApiClient) -> Self {
		Self {
			api: ApiService::new(client, USERS_PATH),
		}
	}

	/// Recent activity of a user. Entries are free form, the backend mixes visits, reviews and
	/// game results.
	pub async fn activity(&self, user_id: impl Into<EntityId> + Send) -> Result<Vec<Value>, Error> {
		self.client()
			.fetch::<Option<Vec<Value>>>(Request::new(
				Method::Get,
				self.path([user_id.into().to_string(), "activity".to_string()]),
			))
			.await
			.map(Option::unwrap_or_default)
	}

	/// Profile of the signed in user.
	pub async fn profile(&self) -> Result<User, Error> {
		self.client()
			.fetch(Request::new(Method::Get, self.path(["profile"])))
			.await
	}

	pub async fn update_profile(&self, changes: Patch) -> Result<User, Error> {
		self.client()
			.fetch(
				Request::new(Method::Put, self.path(["profile"])).with_body(Value::Object(changes)),
			)
			.await
	}

	pub async fn stats(&self) -> Result<Value, Error> {
		self.client()
			.fetch(Request::new(Method::Get, self.path(["stats", "summary"])))
			.await
	}
}

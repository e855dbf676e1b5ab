use std::ops::Deref;

use hx_api::{ApiClient, ApiService, EntityId, Error, Method, QueryParams, Request, Transport};
use serde_json::Value;
use tracing::{debug, warn};

use crate::entities::Notification;

pub const NOTIFICATIONS_PATH: &str = "/notifications";

const UNREAD_COUNT_FIELD: &str = "unreadCount";

#[derive(Debug, Clone)]
pub struct NotificationService {
	api: ApiService<Notification>,
}

impl Deref for NotificationService {
	type Target = ApiService<Notification>;

	fn deref(&self) -> &Self::Target {
		&self.api
	}
}

impl NotificationService {
	#[must_use]
	pub fn new(client: ApiClient) -> Self {
		Self {
			api: ApiService::new(client, NOTIFICATIONS_PATH),
		}
	}

	pub async fn mark_read(&self, id: impl Into<EntityId> + Send) -> Result<(), Error> {
		self.client()
			.execute(Request::new(
				Method::Patch,
				self.path([id.into().to_string(), "read".to_string()]),
			))
			.await
	}

	pub async fn mark_all_read(&self) -> Result<(), Error> {
		self.client()
			.execute(Request::new(Method::Patch, self.path(["read-all"])))
			.await
	}

	pub async fn clear_all(&self) -> Result<(), Error> {
		self.client()
			.execute(Request::new(Method::Delete, self.base_path()))
			.await
	}

	/// Never fails, `0` when the count can't be read.
	///
	/// The count rides along the list response, either at the top level of the body or inside
	/// its data.
	pub async fn unread_count(&self) -> u64 {
		let response = match self
			.client()
			.transport()
			.get(self.base_path(), QueryParams::new())
			.await
		{
			Ok(response) if response.is_success() => response,
			Ok(response) => {
				warn!(status = response.status, "Failed to get unread notifications count");
				return 0;
			}
			Err(e) => {
				warn!(%e, "Failed to get unread notifications count");
				return 0;
			}
		};

		let data_field = &self.client().envelope_fields().data;

		response
			.body
			.get(UNREAD_COUNT_FIELD)
			.or_else(|| {
				response
					.body
					.get(data_field)
					.and_then(|data| data.get(UNREAD_COUNT_FIELD))
			})
			.and_then(Value::as_u64)
			.unwrap_or_else(|| {
				debug!("No unread count in the notifications response");
				0
			})
	}
}

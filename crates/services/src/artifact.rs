use std::ops::Deref;

use hx_api::{ApiClient, ApiService, EntityId, Error, PaginatedResult, Query};

use crate::entities::Artifact;

pub const ARTIFACTS_PATH: &str = "/artifacts";

const HERITAGE_ID_FILTER: &str = "heritageId";

#[derive(Debug, Clone)]
pub struct ArtifactService {
	api: ApiService<Artifact>,
}

impl Deref for ArtifactService {
	type Target = ApiService<Artifact>;

	fn deref(&self) -> &Self::Target {
		&self.api
	}
}

impl ArtifactService {
	#[must_use]
	pub fn new(client: ApiClient) -> Self {
		Self {
			api: ApiService::new(client, ARTIFACTS_PATH),
		}
	}

	/// Artifacts kept at one heritage site, through the regular list endpoint.
	pub async fn for_site(
		&self,
		heritage_id: impl Into<EntityId> + Send,
		query: &Query,
	) -> Result<PaginatedResult<Artifact>, Error> {
		let query = query
			.clone()
			.filter(HERITAGE_ID_FILTER, heritage_id.into().to_string())?;

		self.get_all(&query).await
	}
}

use hx_api::{ApiClient, ApiService, SortOrder};
use hx_store::{EntityStore, StoreConfig, StoreRegistry};
use tracing::debug;

use crate::{
	artifact::ARTIFACTS_PATH,
	entities::{Artifact, Favorite, HeritageSite, Notification, Review},
	favorite::FAVORITES_PATH,
	heritage::HERITAGE_SITES_PATH,
	notification::NOTIFICATIONS_PATH,
	review::REVIEWS_PATH,
};

const HERITAGE_PAGE_SIZE: u32 = 20;

/// Every store of the app, created once at start up.
#[derive(Debug)]
pub struct AppStores {
	registry: StoreRegistry,
	heritage_sites: EntityStore<HeritageSite>,
	artifacts: EntityStore<Artifact>,
	favorites: EntityStore<Favorite>,
	notifications: EntityStore<Notification>,
	reviews: EntityStore<Review>,
}

impl AppStores {
	#[must_use]
	pub fn new(client: &ApiClient) -> Self {
		let registry = StoreRegistry::new();

		let heritage_sites = registry.get_or_insert_with(|| {
			EntityStore::new(
				ApiService::<HeritageSite>::new(client.clone(), HERITAGE_SITES_PATH),
				StoreConfig::default()
					.with_page_size(HERITAGE_PAGE_SIZE)
					.with_sort("rating", SortOrder::Desc),
			)
		});
		let artifacts = registry.get_or_insert_with(|| {
			EntityStore::new(
				ApiService::<Artifact>::new(client.clone(), ARTIFACTS_PATH),
				StoreConfig::default(),
			)
		});
		let favorites = registry.get_or_insert_with(|| {
			EntityStore::new(
				ApiService::<Favorite>::new(client.clone(), FAVORITES_PATH),
				StoreConfig::default().with_sort("createdAt", SortOrder::Desc),
			)
		});
		let notifications = registry.get_or_insert_with(|| {
			EntityStore::new(
				ApiService::<Notification>::new(client.clone(), NOTIFICATIONS_PATH),
				StoreConfig::default().with_sort("createdAt", SortOrder::Desc),
			)
		});
		let reviews = registry.get_or_insert_with(|| {
			EntityStore::new(
				ApiService::<Review>::new(client.clone(), REVIEWS_PATH),
				StoreConfig::default(),
			)
		});

		debug!(stores = registry.len(), "App stores ready");

		Self {
			registry,
			heritage_sites,
			artifacts,
			favorites,
			notifications,
			reviews,
		}
	}

	/// Lookup by entity type, for code that is generic over the entity.
	#[must_use]
	pub const fn registry(&self) -> &StoreRegistry {
		&self.registry
	}

	#[must_use]
	pub const fn heritage_sites(&self) -> &EntityStore<HeritageSite> {
		&self.heritage_sites
	}

	#[must_use]
	pub const fn artifacts(&self) -> &EntityStore<Artifact> {
		&self.artifacts
	}

	#[must_use]
	pub const fn favorites(&self) -> &EntityStore<Favorite> {
		&self.favorites
	}

	#[must_use]
	pub const fn notifications(&self) -> &EntityStore<Notification> {
		&self.notifications
	}

	#[must_use]
	pub const fn reviews(&self) -> &EntityStore<Review> {
		&self.reviews
	}

	/// Back to a blank slate, e.g. after logging out.
	pub fn reset_all(&self) {
		self.heritage_sites.reset();
		self.artifacts.reset();
		self.favorites.reset();
		self.notifications.reset();
		self.reviews.reset();
	}
}

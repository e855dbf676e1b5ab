//!
//! # Entity stores
//!
//! One reactive state container per entity type: list data, the current item, loading flags,
//! pagination, filters, search and sorting, mutated only through the store's own actions.
//! Consumers read snapshots with [`EntityStore::state`] or follow changes through
//! [`EntityStore::subscribe`].
//!
//! Stores are created once at app start and kept in a [`StoreRegistry`], tests build their own
//! isolated registries and stores.
//!
//! ## Basic example
//!
//! ```no_run
//! use hx_api::{ApiClient, ApiConfig, ApiService, Entity, EntityId, HttpTransport, SortOrder};
//! use hx_store::{EntityStore, StoreConfig, StoreRegistry};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Site {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Entity for Site {
//!     fn id(&self) -> EntityId {
//!         self.id.into()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::from_env()?;
//!     let client = ApiClient::new(HttpTransport::new(&config)?, config.envelope.clone());
//!
//!     let registry = StoreRegistry::new();
//!     registry.register(EntityStore::new(
//!         ApiService::<Site>::new(client, "/heritage-sites"),
//!         StoreConfig::default().with_sort("rating", SortOrder::Desc),
//!     ));
//!
//!     if let Some(sites) = registry.get::<Site>() {
//!         sites.fetch_all(None).await;
//!         println!("{} sites loaded", sites.state().items.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod overlay;
mod registry;
mod repository;
mod state;
mod store;

pub use overlay::{LocalEdit, LocalOverlay};
pub use registry::StoreRegistry;
pub use repository::InMemoryRepository;
pub use state::{ResponsePolicy, StoreConfig, StoreState};
pub use store::EntityStore;

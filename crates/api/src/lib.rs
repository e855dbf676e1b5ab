//!
//! # Heritage Explorer API layer
//!
//! A thin, typed layer between the app's state containers and its REST backend. Every
//! [`ApiService`] is configured only by the base path of its resource and turns each
//! semantic operation (list, fetch, search, create, ...) into exactly one outbound request,
//! unwrapping the backend's `{ success, data, message }` envelope into a typed value or an
//! [`Error`].
//!
//! ## Basic example
//!
//! ```no_run
//! use hx_api::{ApiClient, ApiConfig, ApiService, Entity, EntityId, HttpTransport, Query};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Widget {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Entity for Widget {
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
//!     let widgets = ApiService::<Widget>::new(client, "/widgets");
//!     let page = widgets.get_all(&Query::new().page(1).limit(10)).await?;
//!
//!     println!("{} of {} widgets", page.items.len(), page.total);
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

mod client;
mod config;
mod entity;
mod envelope;
mod error;
mod query;
mod service;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::ApiClient;
pub use config::{ApiConfig, AppEnv, ConfigError};
pub use entity::{Entity, EntityId, Patch};
pub use envelope::{Envelope, EnvelopeFields, PageInfo, PaginatedResult, Pagination};
pub use error::{Error, QueryError};
pub use query::{FilterKey, Filters, Query, QueryParams, ReservedKey, ScalarValue, SortOrder};
pub use service::{ApiService, EntitySource};
pub use transport::{
	HttpTransport, Method, Request, Response, SharedToken, StaticToken, TokenProvider, Transport,
};

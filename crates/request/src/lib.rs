//!
//! # Request hooks
//!
//! Cancelable handles over single async calls, for UI components that must never apply a stale
//! or late result. A [`RequestHook`] exposes a uniform [`RequestState`] (data, loading, error,
//! success) and guarantees that once a call is superseded, or the hook is unmounted, its result
//! only goes back to whoever awaited it.
//!
//! [`QueryHook`] adds a small keyed cache on top, per hook unless a [`QueryCache`] is shared.
//!
//! ## Basic example
//!
//! ```
//! use hx_request::{RequestHook, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hook = RequestHook::mount(
//!         |id: u32, token| async move {
//!             if token.is_cancelled() {
//!                 return Err("canceled".to_string());
//!             }
//!             Ok(format!("site {id}"))
//!         },
//!         RequestOptions::default().on_success(|name: &String| println!("loaded {name}")),
//!     );
//!
//!     assert_eq!(hook.execute(7).await.as_deref(), Ok("site 7"));
//!     assert!(hook.state().is_success);
//!
//!     hook.unmount();
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

mod hook;
mod query;

pub use hook::{Callbacks, MutationHook, RequestHook, RequestOptions, RequestState};
pub use query::{CacheEntry, QueryCache, QueryHook, QueryKey, QueryOptions};
pub use tokio_util::sync::CancellationToken;

//!
//! # Heritage Explorer services
//!
//! The app's entities and the services reaching their endpoints, most of them an
//! [`ApiService`](hx_api::ApiService) extended with the endpoint specific calls, plus
//! [`AppStores`], the set of entity stores the app creates at start up. The game and the chat
//! assistant aren't entity collections, their services talk to the
//! [`ApiClient`](hx_api::ApiClient) directly.

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

mod ai;
mod artifact;
mod entities;
mod favorite;
mod game;
mod heritage;
mod notification;
mod review;
mod stores;
mod user;

pub use ai::{AiService, ChatMessage, ChatReply, ChatRole, AI_CHAT_PATH};
pub use artifact::{ArtifactService, ARTIFACTS_PATH};
pub use entities::{
	Artifact, Badge, Chapter, Difficulty, Favorite, FavoriteType, GameProgress, HeritageSite,
	Level, LevelKind, Notification, NotificationKind, Review, TimelineEvent, User, UserRole,
};
pub use favorite::{FavoriteService, FavoriteStatus, FAVORITES_PATH};
pub use game::{AnswerResult, GameService, LevelCompletion, TimelineResult, GAME_PATH};
pub use heritage::{HeritageService, HERITAGE_SITES_PATH};
pub use notification::{NotificationService, NOTIFICATIONS_PATH};
pub use review::{ReviewService, REVIEWS_PATH};
pub use stores::AppStores;
pub use user::{UserService, USERS_PATH};

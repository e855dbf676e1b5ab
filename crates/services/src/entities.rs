use std::fmt;

use hx_api::{Entity, EntityId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeritageSite {
	pub id: EntityId,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub location: String,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub image_url: String,
	#[serde(default)]
	pub gallery: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub historical_era: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub significance: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub latitude: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub longitude: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub view_count: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_favorite: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rating: Option<f64>,
	// Fields below come from the backend in snake case
	#[serde(rename = "visit_hours", default, skip_serializing_if = "Option::is_none")]
	pub visit_hours: Option<String>,
	#[serde(rename = "entrance_fee", default, skip_serializing_if = "Option::is_none")]
	pub entrance_fee: Option<f64>,
	#[serde(rename = "year_established", default, skip_serializing_if = "Option::is_none")]
	pub year_established: Option<String>,
	#[serde(rename = "cultural_period", default, skip_serializing_if = "Option::is_none")]
	pub cultural_period: Option<String>,
	#[serde(rename = "total_reviews", default, skip_serializing_if = "Option::is_none")]
	pub total_reviews: Option<u64>,
	#[serde(rename = "unesco_listed", default, skip_serializing_if = "Option::is_none")]
	pub unesco_listed: Option<bool>,
	#[serde(rename = "related_history_ids", default)]
	pub related_history_ids: Vec<EntityId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
}

impl Entity for HeritageSite {
	fn id(&self) -> EntityId {
		self.id.clone()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
	pub id: EntityId,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub image_url: String,
	#[serde(default)]
	pub gallery: Vec<String>,
	pub heritage_id: EntityId,
	#[serde(default)]
	pub category: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dating: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dimensions: Option<String>,
	#[serde(rename = "is3D", default)]
	pub is_3d: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub model_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rating: Option<f64>,
	#[serde(rename = "total_reviews", default, skip_serializing_if = "Option::is_none")]
	pub total_reviews: Option<u64>,
	#[serde(rename = "historical_context", default, skip_serializing_if = "Option::is_none")]
	pub historical_context: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
}

impl Entity for Artifact {
	fn id(&self) -> EntityId {
		self.id.clone()
	}
}

/// A dated milestone in the history of a site. Not an entity, it has no id of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
	pub year: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteType {
	Item,
	Category,
	Other,
}

impl FavoriteType {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Item => "item",
			Self::Category => "category",
			Self::Other => "other",
		}
	}
}

impl fmt::Display for FavoriteType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
	pub id: i64,
	pub user_id: i64,
	#[serde(rename = "type")]
	pub kind: FavoriteType,
	pub reference_id: i64,
	#[serde(default)]
	pub created_at: String,
}

impl Entity for Favorite {
	fn id(&self) -> EntityId {
		self.id.into()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
	Order,
	Promotion,
	System,
	Review,
}

/// Accepts the backend's snake case as well as camel case field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub id: i64,
	#[serde(alias = "user_id")]
	pub user_id: i64,
	pub title: String,
	pub message: String,
	#[serde(rename = "type")]
	pub kind: NotificationKind,
	#[serde(alias = "ref_id", default, skip_serializing_if = "Option::is_none")]
	pub ref_id: Option<i64>,
	#[serde(alias = "is_read", default)]
	pub is_read: bool,
	#[serde(alias = "created_at", default)]
	pub created_at: String,
}

impl Entity for Notification {
	fn id(&self) -> EntityId {
		self.id.into()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
	pub id: i64,
	pub user_id: i64,
	/// What is reviewed, e.g. `heritage` or `level`.
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub reference_id: Option<i64>,
	pub rating: u8,
	#[serde(default)]
	pub comment: String,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub updated_at: String,
}

impl Entity for Review {
	fn id(&self) -> EntityId {
		self.id.into()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
	pub id: EntityId,
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub order: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	#[serde(default)]
	pub is_unlocked: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_level_required: Option<u32>,
}

impl Entity for Chapter {
	fn id(&self) -> EntityId {
		self.id.clone()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
	Quiz,
	Puzzle,
	Exploration,
	Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
	Easy,
	Medium,
	Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
	pub id: EntityId,
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub chapter_id: EntityId,
	pub order: u32,
	#[serde(rename = "type")]
	pub kind: LevelKind,
	pub difficulty: Difficulty,
	#[serde(default)]
	pub points: u32,
	#[serde(default)]
	pub is_completed: bool,
	#[serde(default)]
	pub is_unlocked: bool,
}

impl Entity for Level {
	fn id(&self) -> EntityId {
		self.id.clone()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
	pub id: EntityId,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub icon_url: String,
	#[serde(default)]
	pub condition: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub obtained_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgress {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current_level_id: Option<EntityId>,
	#[serde(default)]
	pub total_points: u64,
	#[serde(default)]
	pub completed_levels: Vec<EntityId>,
	#[serde(default)]
	pub unlocked_chapters: Vec<EntityId>,
	#[serde(default)]
	pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
	User,
	Admin,
	Researcher,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: EntityId,
	pub username: String,
	pub email: String,
	#[serde(default)]
	pub full_name: String,
	pub role: UserRole,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
	#[serde(default)]
	pub permissions: Vec<String>,
	#[serde(default)]
	pub points: u64,
	#[serde(default)]
	pub level: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_login: Option<String>,
}

impl Entity for User {
	fn id(&self) -> EntityId {
		self.id.clone()
	}
}

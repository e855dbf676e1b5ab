use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial updates are sent and merged as plain JSON objects.
pub type Patch = Map<String, Value>;

/// Identifier of an entity, backends use both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
	Int(i64),
	Str(String),
}

impl EntityId {
	/// Compares against a raw JSON value, so ids can be matched on any field of a serialized
	/// entity.
	#[must_use]
	pub fn matches(&self, value: &Value) -> bool {
		match (self, value) {
			(Self::Int(id), Value::Number(n)) => n.as_i64() == Some(*id),
			(Self::Str(id), Value::String(s)) => id == s,
			_ => false,
		}
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(id) => write!(f, "{id}"),
			Self::Str(id) => f.write_str(id),
		}
	}
}

impl From<i64> for EntityId {
	fn from(id: i64) -> Self {
		Self::Int(id)
	}
}

impl From<i32> for EntityId {
	fn from(id: i32) -> Self {
		Self::Int(id.into())
	}
}

impl From<u32> for EntityId {
	fn from(id: u32) -> Self {
		Self::Int(id.into())
	}
}

impl From<&str> for EntityId {
	fn from(id: &str) -> Self {
		Self::Str(id.to_string())
	}
}

impl From<String> for EntityId {
	fn from(id: String) -> Self {
		Self::Str(id)
	}
}

/// A domain record managed by an [`ApiService`](crate::ApiService) and its stores.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
	/// Name of the identity field in the serialized form.
	const ID_FIELD: &'static str = "id";

	fn id(&self) -> EntityId;

	/// Whether the serialized `field` of this entity equals `id`. Falls back to [`Entity::id`]
	/// for the identity field so the common case skips serialization.
	fn field_matches(&self, field: &str, id: &EntityId) -> bool {
		if field == Self::ID_FIELD {
			return &self.id() == id;
		}

		serde_json::to_value(self)
			.ok()
			.and_then(|value| value.get(field).map(|value| id.matches(value)))
			.unwrap_or(false)
	}

	/// Applies a shallow JSON merge of `patch` on top of this entity.
	fn merged(&self, patch: &Patch) -> Result<Self, serde_json::Error> {
		let mut value = serde_json::to_value(self)?;

		if let Value::Object(fields) = &mut value {
			fields.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
		}

		serde_json::from_value(value)
	}
}

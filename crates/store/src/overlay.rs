use hx_api::{Entity, EntityId, Patch};
use tracing::warn;

/// An optimistic change made locally, not (yet) confirmed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEdit<T> {
	Insert(T),
	Update { id: EntityId, patch: Patch },
	Remove { field: String, id: EntityId },
}

/// Local edits replayed, in order, over the last server snapshot.
///
/// Nothing here is ever sent to the backend, the overlay only keeps local changes apart from
/// server data so they can be reconciled or dropped later.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalOverlay<T> {
	edits: Vec<LocalEdit<T>>,
}

impl<T> Default for LocalOverlay<T> {
	fn default() -> Self {
		Self { edits: Vec::new() }
	}
}

impl<T: Entity> LocalOverlay<T> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, edit: LocalEdit<T>) {
		self.edits.push(edit);
	}

	pub fn clear(&mut self) {
		self.edits.clear();
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.edits.is_empty()
	}

	#[must_use]
	pub fn edits(&self) -> &[LocalEdit<T>] {
		&self.edits
	}

	#[must_use]
	pub fn apply(&self, snapshot: &[T]) -> Vec<T> {
		let mut items = snapshot.to_vec();

		for edit in &self.edits {
			match edit {
				LocalEdit::Insert(item) => items.insert(0, item.clone()),

				LocalEdit::Update { id, patch } => {
					for item in items
						.iter_mut()
						.filter(|item| item.field_matches(T::ID_FIELD, id))
					{
						match item.merged(patch) {
							Ok(merged) => *item = merged,
							Err(e) => {
								warn!(%id, ?e, "Local update doesn't fit the entity, skipping it");
							}
						}
					}
				}

				LocalEdit::Remove { field, id } => {
					items.retain(|item| !item.field_matches(field, id));
				}
			}
		}

		items
	}
}

#[cfg(test)]
mod tests {
	use serde::{Deserialize, Serialize};
	use serde_json::json;

	use super::*;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Artifact {
		id: i64,
		code: String,
		name: String,
	}

	impl Entity for Artifact {
		fn id(&self) -> EntityId {
			self.id.into()
		}
	}

	fn artifact(id: i64) -> Artifact {
		Artifact {
			id,
			code: format!("A-{id}"),
			name: format!("artifact {id}"),
		}
	}

	fn patch(value: serde_json::Value) -> Patch {
		match value {
			serde_json::Value::Object(patch) => patch,
			_ => unreachable!(),
		}
	}

	#[test]
	fn edits_replay_in_order() {
		let snapshot = vec![artifact(1), artifact(2), artifact(3)];
		let mut overlay = LocalOverlay::new();

		overlay.push(LocalEdit::Insert(artifact(9)));
		overlay.push(LocalEdit::Update {
			id: 2.into(),
			patch: patch(json!({ "name": "bronze drum" })),
		});
		overlay.push(LocalEdit::Remove {
			field: "code".into(),
			id: "A-3".into(),
		});

		let items = overlay.apply(&snapshot);

		assert_eq!(
			items.iter().map(|a| a.id).collect::<Vec<_>>(),
			vec![9, 1, 2]
		);
		assert_eq!(items[2].name, "bronze drum");
		assert_eq!(snapshot[1].name, "artifact 2");
	}

	#[test]
	fn ill_typed_update_is_skipped() {
		let mut overlay = LocalOverlay::new();
		overlay.push(LocalEdit::Update {
			id: 1.into(),
			patch: patch(json!({ "id": "not a number" })),
		});

		assert_eq!(overlay.apply(&[artifact(1)]), vec![artifact(1)]);
	}
}

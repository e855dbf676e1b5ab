use std::cmp::Ordering;

use hx_api::{Entity, EntityId, PaginatedResult, Pagination, Patch, SortOrder};
use serde_json::Value;

/// Plain in-memory collection, handy to cache responses or hold purely local data.
#[derive(Debug, Clone)]
pub struct InMemoryRepository<T> {
	items: Vec<T>,
}

impl<T> Default for InMemoryRepository<T> {
	fn default() -> Self {
		Self { items: Vec::new() }
	}
}

impl<T: Entity> FromIterator<T> for InMemoryRepository<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self {
			items: iter.into_iter().collect(),
		}
	}
}

impl<T: Entity> InMemoryRepository<T> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, item: T) {
		self.items.push(item);
	}

	pub fn remove(&mut self, id: &EntityId) {
		self.remove_by(T::ID_FIELD, id);
	}

	pub fn remove_by(&mut self, field: &str, id: &EntityId) {
		self.items.retain(|item| !item.field_matches(field, id));
	}

	/// Merges `patch` into the first item with this id, returns whether one was found.
	pub fn update(&mut self, id: &EntityId, patch: &Patch) -> Result<bool, serde_json::Error> {
		let Some(item) = self
			.items
			.iter_mut()
			.find(|item| item.field_matches(T::ID_FIELD, id))
		else {
			return Ok(false);
		};

		*item = item.merged(patch)?;

		Ok(true)
	}

	#[must_use]
	pub fn get_by_id(&self, id: &EntityId) -> Option<&T> {
		self.items
			.iter()
			.find(|item| item.field_matches(T::ID_FIELD, id))
	}

	#[must_use]
	pub fn get_all(&self) -> Vec<T> {
		self.items.clone()
	}

	pub fn clear(&mut self) {
		self.items.clear();
	}

	pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
		self.items
			.iter()
			.filter(|item| predicate(item))
			.cloned()
			.collect()
	}

	#[must_use]
	pub fn count(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn paginate(&self, page: u32, limit: u32) -> PaginatedResult<T> {
		let page = page.max(1);
		let limit = limit.max(1);
		let start = (page as usize - 1).saturating_mul(limit as usize);

		PaginatedResult::new(
			self.items
				.iter()
				.skip(start)
				.take(limit as usize)
				.cloned()
				.collect(),
			Pagination::new(page, limit, self.items.len() as u64),
		)
	}

	/// Items ordered by a serialized field. Items missing the field sort first.
	#[must_use]
	pub fn sorted_by(&self, field: &str, order: SortOrder) -> Vec<T> {
		let mut keyed = self
			.items
			.iter()
			.map(|item| (field_value(item, field), item.clone()))
			.collect::<Vec<_>>();

		keyed.sort_by(|(a, _), (b, _)| {
			let ordering = compare_values(a, b);
			match order {
				SortOrder::Asc => ordering,
				SortOrder::Desc => ordering.reverse(),
			}
		});

		keyed.into_iter().map(|(_, item)| item).collect()
	}

	/// Case insensitive substring search on a serialized field.
	#[must_use]
	pub fn search(&self, field: &str, text: &str) -> Vec<T> {
		let needle = text.to_lowercase();

		self.filter(|item| match field_value(item, field) {
			Value::String(s) => s.to_lowercase().contains(&needle),
			Value::Null => false,
			other => other.to_string().to_lowercase().contains(&needle),
		})
	}
}

fn field_value<T: Entity>(item: &T, field: &str) -> Value {
	serde_json::to_value(item)
		.ok()
		.and_then(|mut value| value.get_mut(field).map(Value::take))
		.unwrap_or(Value::Null)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
	match (a, b) {
		(Value::Number(a), Value::Number(b)) => a
			.as_f64()
			.partial_cmp(&b.as_f64())
			.unwrap_or(Ordering::Equal),
		(Value::String(a), Value::String(b)) => a.cmp(b),
		(Value::Bool(a), Value::Bool(b)) => a.cmp(b),
		(Value::Null, Value::Null) => Ordering::Equal,
		(Value::Null, _) => Ordering::Less,
		(_, Value::Null) => Ordering::Greater,
		_ => a.to_string().cmp(&b.to_string()),
	}
}

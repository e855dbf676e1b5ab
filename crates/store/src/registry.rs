use std::{
	any::{type_name, Any, TypeId},
	collections::HashMap,
	fmt,
};

use hx_api::Entity;
use parking_lot::RwLock;
use tracing::warn;

use super::store::EntityStore;

/// Holds at most one [`EntityStore`] per entity type.
#[derive(Default)]
pub struct StoreRegistry {
	stores: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl fmt::Debug for StoreRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreRegistry")
			.field("stores", &self.len())
			.finish()
	}
}

impl StoreRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `store`, handing back the one it replaces, if any.
	pub fn register<T: Entity>(&self, store: EntityStore<T>) -> Option<EntityStore<T>> {
		let previous = self
			.stores
			.write()
			.insert(TypeId::of::<T>(), Box::new(store))
			.and_then(|previous| previous.downcast::<EntityStore<T>>().ok())
			.map(|previous| *previous);

		if previous.is_some() {
			warn!(entity = type_name::<T>(), "Replacing an already registered store");
		}

		previous
	}

	#[must_use]
	pub fn get<T: Entity>(&self) -> Option<EntityStore<T>> {
		self.stores
			.read()
			.get(&TypeId::of::<T>())
			.and_then(|store| store.downcast_ref::<EntityStore<T>>())
			.cloned()
	}

	pub fn get_or_insert_with<T: Entity>(
		&self,
		init: impl FnOnce() -> EntityStore<T>,
	) -> EntityStore<T> {
		let mut stores = self.stores.write();

		if let Some(store) = stores
			.get(&TypeId::of::<T>())
			.and_then(|store| store.downcast_ref::<EntityStore<T>>())
		{
			return store.clone();
		}

		let store = init();
		stores.insert(TypeId::of::<T>(), Box::new(store.clone()));
		store
	}

	#[must_use]
	pub fn contains<T: Entity>(&self) -> bool {
		self.stores.read().contains_key(&TypeId::of::<T>())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.stores.read().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.stores.read().is_empty()
	}
}

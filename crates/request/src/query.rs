use std::{collections::HashMap, fmt, future::Future, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{sync::watch, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::hook::{Callbacks, RequestHook, RequestOptions, RequestState};

/// Identifies cached data. Multi part keys are joined with `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
	Single(String),
	Parts(Vec<String>),
}

impl QueryKey {
	#[must_use]
	pub fn cache_key(&self) -> String {
		match self {
			Self::Single(key) => key.clone(),
			Self::Parts(parts) => parts.join("-"),
		}
	}
}

impl fmt::Display for QueryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.cache_key())
	}
}

impl From<&str> for QueryKey {
	fn from(key: &str) -> Self {
		Self::Single(key.to_string())
	}
}

impl From<String> for QueryKey {
	fn from(key: String) -> Self {
		Self::Single(key)
	}
}

impl From<Vec<String>> for QueryKey {
	fn from(parts: Vec<String>) -> Self {
		Self::Parts(parts)
	}
}

impl<const N: usize> From<[&str; N]> for QueryKey {
	fn from(parts: [&str; N]) -> Self {
		Self::Parts(parts.iter().map(ToString::to_string).collect())
	}
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
	pub data: T,
	pub timestamp: Instant,
}

/// Cached query results by key. Cloning shares the entries, hand the same cache to several
/// hooks to share their results.
pub struct QueryCache<T> {
	entries: Arc<Mutex<HashMap<String, CacheEntry<T>>>>,
}

impl<T> Clone for QueryCache<T> {
	fn clone(&self) -> Self {
		Self {
			entries: Arc::clone(&self.entries),
		}
	}
}

impl<T> Default for QueryCache<T> {
	fn default() -> Self {
		Self {
			entries: Arc::default(),
		}
	}
}

impl<T> fmt::Debug for QueryCache<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QueryCache")
			.field("entries", &self.entries.lock().len())
			.finish()
	}
}

impl<T: Clone + Send + 'static> QueryCache<T> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
		self.entries.lock().get(key).cloned()
	}

	/// Data stored less than `stale_time` ago. A zero `stale_time` never finds anything.
	#[must_use]
	pub fn fresh(&self, key: &str, stale_time: Duration) -> Option<T> {
		self.entries
			.lock()
			.get(key)
			.filter(|entry| entry.timestamp.elapsed() < stale_time)
			.map(|entry| entry.data.clone())
	}

	pub fn insert(&self, key: impl Into<String>, data: T, timestamp: Instant) {
		self.entries
			.lock()
			.insert(key.into(), CacheEntry { data, timestamp });
	}

	pub fn remove(&self, key: &str) -> Option<T> {
		self.entries.lock().remove(key).map(|entry| entry.data)
	}

	/// Drops the entry stored at `timestamp` once `delay` has passed. An entry stored again in
	/// the meantime is left alone, it has its own eviction scheduled.
	pub fn evict_after(&self, key: String, timestamp: Instant, delay: Duration) {
		let entries = Arc::clone(&self.entries);

		tokio::spawn(async move {
			tokio::time::sleep(delay).await;

			let mut entries = entries.lock();
			if entries
				.get(&key)
				.is_some_and(|entry| entry.timestamp == timestamp)
			{
				entries.remove(&key);
				debug!(%key, "Evicted cached query");
			}
		});
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

pub struct QueryOptions<T, E> {
	pub callbacks: Callbacks<T, E>,
	/// How long cached data is used without fetching again.
	pub stale_time: Duration,
	/// How long an entry stays in the cache, forever if unset.
	pub cache_time: Option<Duration>,
	/// Fetch on mount and on key change when the cache has nothing fresh.
	pub immediate: bool,
}

impl<T, E> Default for QueryOptions<T, E> {
	fn default() -> Self {
		Self {
			callbacks: Callbacks::default(),
			stale_time: Duration::ZERO,
			cache_time: None,
			immediate: true,
		}
	}
}

impl<T, E> fmt::Debug for QueryOptions<T, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QueryOptions")
			.field("callbacks", &self.callbacks)
			.field("stale_time", &self.stale_time)
			.field("cache_time", &self.cache_time)
			.field("immediate", &self.immediate)
			.finish()
	}
}

impl<T, E> QueryOptions<T, E> {
	#[must_use]
	pub fn stale_time(mut self, stale_time: Duration) -> Self {
		self.stale_time = stale_time;
		self
	}

	#[must_use]
	pub fn cache_time(mut self, cache_time: Duration) -> Self {
		self.cache_time = Some(cache_time);
		self
	}

	#[must_use]
	pub fn immediate(mut self, immediate: bool) -> Self {
		self.immediate = immediate;
		self
	}

	#[must_use]
	pub fn callbacks(mut self, callbacks: Callbacks<T, E>) -> Self {
		self.callbacks = callbacks;
		self
	}
}

struct Inner<T, E> {
	request: RequestHook<(), T, E>,
	cache: QueryCache<T>,
	key: Mutex<QueryKey>,
	stale_time: Duration,
	cache_time: Option<Duration>,
	immediate: bool,
}

/// A [`RequestHook`] for argument-less reads, backed by a [`QueryCache`].
pub struct QueryHook<T, E> {
	inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for QueryHook<T, E> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T, E> fmt::Debug for QueryHook<T, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QueryHook")
			.field("key", &*self.inner.key.lock())
			.field("cache", &self.inner.cache)
			.finish_non_exhaustive()
	}
}

impl<T, E> QueryHook<T, E>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + fmt::Debug + Send + Sync + 'static,
{
	/// Mounts with a cache of its own.
	pub fn mount<F, Fut>(key: impl Into<QueryKey>, func: F, options: QueryOptions<T, E>) -> Self
	where
		F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
	{
		Self::mount_with_cache(key, func, options, QueryCache::new())
	}

	/// Mounts over a cache that outlives this hook, possibly shared with other hooks. Fresh
	/// cached data is shown right away, otherwise a fetch is spawned when `immediate` is set.
	pub fn mount_with_cache<F, Fut>(
		key: impl Into<QueryKey>,
		func: F,
		options: QueryOptions<T, E>,
		cache: QueryCache<T>,
	) -> Self
	where
		F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
	{
		let QueryOptions {
			callbacks,
			stale_time,
			cache_time,
			immediate,
		} = options;

		let request = RequestHook::mount(
			move |(), token| func(token),
			RequestOptions {
				callbacks,
				immediate: None,
			},
		);

		let hook = Self {
			inner: Arc::new(Inner {
				request,
				cache,
				key: Mutex::new(key.into()),
				stale_time,
				cache_time,
				immediate,
			}),
		};

		hook.load();

		hook
	}

	/// Switches to another key, loading it the same way as on mount.
	pub fn set_key(&self, key: impl Into<QueryKey>) {
		let key = key.into();
		if *self.inner.key.lock() == key {
			return;
		}

		*self.inner.key.lock() = key;
		self.load();
	}

	fn load(&self) {
		let key = self.cache_key();

		if let Some(data) = self.inner.cache.fresh(&key, self.inner.stale_time) {
			debug!(%key, "Using cached query data");
			self.inner.request.settle_with(data);
			return;
		}

		if self.inner.immediate {
			let hook = self.clone();
			tokio::spawn(async move {
				if let Err(e) = hook.refetch().await {
					debug!(?e, "Query failed");
				}
			});
		}
	}

	/// Fetches regardless of the cache and stores the result under the current key.
	pub async fn refetch(&self) -> Result<T, E> {
		let key = self.cache_key();
		let started = Instant::now();

		let data = self.inner.request.execute(()).await?;

		self.inner.cache.insert(key.clone(), data.clone(), started);
		if let Some(cache_time) = self.inner.cache_time {
			self.inner.cache.evict_after(key, started, cache_time);
		}

		Ok(data)
	}

	#[must_use]
	pub fn key(&self) -> QueryKey {
		self.inner.key.lock().clone()
	}

	#[must_use]
	pub fn cache_key(&self) -> String {
		self.inner.key.lock().cache_key()
	}

	#[must_use]
	pub fn cache(&self) -> &QueryCache<T> {
		&self.inner.cache
	}

	#[must_use]
	pub fn request(&self) -> &RequestHook<(), T, E> {
		&self.inner.request
	}

	#[must_use]
	pub fn state(&self) -> RequestState<T, E> {
		self.inner.request.state()
	}

	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<RequestState<T, E>> {
		self.inner.request.subscribe()
	}

	pub fn unmount(&self) {
		self.inner.request.unmount();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use tokio::sync::oneshot;

	use super::*;

	fn counting() -> (
		Arc<AtomicU32>,
		impl Fn(CancellationToken) -> futures::future::Ready<Result<u32, String>>
			+ Send
			+ Sync
			+ 'static,
	) {
		let calls = Arc::new(AtomicU32::new(0));
		let func = {
			let calls = Arc::clone(&calls);
			move |_: CancellationToken| {
				futures::future::ready(Ok(calls.fetch_add(1, Ordering::SeqCst) + 1))
			}
		};

		(calls, func)
	}

	async fn settled(hook: &QueryHook<u32, String>) -> RequestState<u32, String> {
		hook.subscribe()
			.wait_for(|state| state.is_success || state.error.is_some())
			.await
			.map(|state| state.clone())
			.unwrap_or_default()
	}

	#[test]
	fn keys() {
		assert_eq!(QueryKey::from("sites").cache_key(), "sites");
		assert_eq!(QueryKey::from(["site", "42"]).cache_key(), "site-42");
		assert_eq!(
			QueryKey::from(vec!["a".to_string(), "b".to_string()]).to_string(),
			"a-b"
		);
	}

	#[tokio::test(start_paused = true)]
	async fn fresh_cache_skips_fetch() {
		let cache = QueryCache::new();
		let (calls, func) = counting();
		let func = Arc::new(func);

		let options = || QueryOptions::default().stale_time(Duration::from_secs(300));

		let first = QueryHook::mount_with_cache(
			"sites",
			{
				let func = Arc::clone(&func);
				move |token| func(token)
			},
			options(),
			cache.clone(),
		);
		assert_eq!(settled(&first).await.data, Some(1));

		let second = QueryHook::mount_with_cache(
			"sites",
			{
				let func = Arc::clone(&func);
				move |token| func(token)
			},
			options(),
			cache.clone(),
		);
		assert_eq!(second.state().data, Some(1));
		assert_eq!(calls.load(Ordering::SeqCst), 1);

		tokio::time::advance(Duration::from_secs(301)).await;

		let third = QueryHook::mount_with_cache(
			"sites",
			move |token| func(token),
			options(),
			cache.clone(),
		);
		assert_eq!(settled(&third).await.data, Some(2));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn zero_stale_time_always_fetches() {
		let (calls, func) = counting();
		let hook = QueryHook::mount("sites", func, QueryOptions::default());
		assert_eq!(settled(&hook).await.data, Some(1));

		hook.set_key(["sites", "2"]);
		hook.subscribe()
			.wait_for(|state| state.data == Some(2))
			.await
			.unwrap();

		hook.set_key("sites");
		hook.subscribe()
			.wait_for(|state| state.data == Some(3))
			.await
			.unwrap();

		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert_eq!(hook.cache().len(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn entries_are_evicted_after_cache_time() {
		let (_, func) = counting();
		let hook = QueryHook::mount(
			["site", "1"],
			func,
			QueryOptions::default().cache_time(Duration::from_secs(10)),
		);
		settled(&hook).await;
		assert!(hook.cache().get("site-1").is_some());

		tokio::time::sleep(Duration::from_secs(9)).await;
		assert_eq!(hook.cache().len(), 1);

		tokio::time::sleep(Duration::from_secs(2)).await;
		assert!(hook.cache().is_empty());
		// Eviction leaves the hook state alone
		assert_eq!(hook.state().data, Some(1));
	}

	#[tokio::test(start_paused = true)]
	async fn refetch_replaces_entry_without_early_eviction() {
		let (_, func) = counting();
		let hook = QueryHook::mount(
			"sites",
			func,
			QueryOptions::default()
				.cache_time(Duration::from_secs(10))
				.immediate(false),
		);
		assert!(hook.cache().is_empty());

		assert_eq!(hook.refetch().await, Ok(1));
		tokio::time::sleep(Duration::from_secs(6)).await;
		assert_eq!(hook.refetch().await, Ok(2));

		// First eviction timer fires, but the entry was stored again since
		tokio::time::sleep(Duration::from_secs(5)).await;
		assert_eq!(hook.cache().get("sites").map(|entry| entry.data), Some(2));

		tokio::time::sleep(Duration::from_secs(6)).await;
		assert!(hook.cache().is_empty());
	}

	#[tokio::test]
	async fn not_immediate_waits_for_refetch() {
		let (calls, func) = counting();
		let hook = QueryHook::mount("sites", func, QueryOptions::default().immediate(false));

		tokio::task::yield_now().await;
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert_eq!(hook.state(), RequestState::default());

		hook.unmount();
		assert_eq!(hook.refetch().await, Ok(1));
		assert_eq!(hook.state().data, None);
		assert_eq!(hook.cache().get("sites").map(|entry| entry.data), Some(1));
	}

	#[tokio::test(start_paused = true)]
	async fn cached_key_supersedes_fetch_in_flight() {
		let cache = QueryCache::new();
		cache.insert("b", 200, Instant::now());

		let (gate_tx, gate_rx) = oneshot::channel::<u32>();
		let gate = Arc::new(Mutex::new(Some(gate_rx)));

		let hook = QueryHook::mount_with_cache(
			"a",
			move |_: CancellationToken| {
				let gate = gate.lock().take();
				async move {
					match gate {
						Some(rx) => rx.await.map_err(|e| e.to_string()),
						None => Err("no more answers".to_string()),
					}
				}
			},
			QueryOptions::default().stale_time(Duration::from_secs(300)),
			cache.clone(),
		);
		hook.subscribe()
			.wait_for(|state| state.loading)
			.await
			.unwrap();

		hook.set_key("b");
		let state = hook.state();
		assert_eq!(state.data, Some(200));
		assert!(!state.loading);

		gate_tx.send(100).unwrap();
		while cache.get("a").is_none() {
			tokio::task::yield_now().await;
		}

		// The late answer for "a" is cached under its own key only
		assert_eq!(hook.key(), QueryKey::from("b"));
		assert_eq!(hook.state().data, Some(200));
		assert_eq!(cache.get("a").map(|entry| entry.data), Some(100));
	}
}

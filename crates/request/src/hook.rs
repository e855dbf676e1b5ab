use std::{fmt, future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type RequestFn<A, T, E> =
	Arc<dyn Fn(A, CancellationToken) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Uniform view over the last call made through a [`RequestHook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState<T, E> {
	pub data: Option<T>,
	pub loading: bool,
	pub error: Option<E>,
	pub is_success: bool,
}

impl<T, E> Default for RequestState<T, E> {
	fn default() -> Self {
		Self {
			data: None,
			loading: false,
			error: None,
			is_success: false,
		}
	}
}

impl<T, E> RequestState<T, E> {
	const fn loading() -> Self {
		Self {
			data: None,
			loading: true,
			error: None,
			is_success: false,
		}
	}
}

/// Lifecycle callbacks, only ever run for the latest call of a mounted hook.
pub struct Callbacks<T, E> {
	on_success: Option<Arc<dyn Fn(&T) + Send + Sync>>,
	on_error: Option<Arc<dyn Fn(&E) + Send + Sync>>,
	on_settled: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl<T, E> Default for Callbacks<T, E> {
	fn default() -> Self {
		Self {
			on_success: None,
			on_error: None,
			on_settled: None,
		}
	}
}

impl<T, E> Clone for Callbacks<T, E> {
	fn clone(&self) -> Self {
		Self {
			on_success: self.on_success.clone(),
			on_error: self.on_error.clone(),
			on_settled: self.on_settled.clone(),
		}
	}
}

impl<T, E> fmt::Debug for Callbacks<T, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callbacks")
			.field("on_success", &self.on_success.is_some())
			.field("on_error", &self.on_error.is_some())
			.field("on_settled", &self.on_settled.is_some())
			.finish()
	}
}

impl<T, E> Callbacks<T, E> {
	#[must_use]
	pub fn on_success(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
		self.on_success = Some(Arc::new(f));
		self
	}

	#[must_use]
	pub fn on_error(mut self, f: impl Fn(&E) + Send + Sync + 'static) -> Self {
		self.on_error = Some(Arc::new(f));
		self
	}

	/// Runs after `on_success` or `on_error`.
	#[must_use]
	pub fn on_settled(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
		self.on_settled = Some(Arc::new(f));
		self
	}

	fn run(&self, result: &Result<T, E>) {
		match result {
			Ok(data) => {
				if let Some(on_success) = &self.on_success {
					on_success(data);
				}
			}
			Err(e) => {
				if let Some(on_error) = &self.on_error {
					on_error(e);
				}
			}
		}

		if let Some(on_settled) = &self.on_settled {
			on_settled();
		}
	}
}

pub struct RequestOptions<A, T, E> {
	pub callbacks: Callbacks<T, E>,
	/// Arguments for a single call made right when the hook is mounted.
	pub immediate: Option<A>,
}

impl<A, T, E> Default for RequestOptions<A, T, E> {
	fn default() -> Self {
		Self {
			callbacks: Callbacks::default(),
			immediate: None,
		}
	}
}

impl<A: fmt::Debug, T, E> fmt::Debug for RequestOptions<A, T, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RequestOptions")
			.field("callbacks", &self.callbacks)
			.field("immediate", &self.immediate)
			.finish()
	}
}

impl<A, T, E> RequestOptions<A, T, E> {
	#[must_use]
	pub fn on_success(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
		self.callbacks = self.callbacks.on_success(f);
		self
	}

	#[must_use]
	pub fn on_error(mut self, f: impl Fn(&E) + Send + Sync + 'static) -> Self {
		self.callbacks = self.callbacks.on_error(f);
		self
	}

	#[must_use]
	pub fn on_settled(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
		self.callbacks = self.callbacks.on_settled(f);
		self
	}

	#[must_use]
	pub fn immediate(mut self, args: A) -> Self {
		self.immediate = Some(args);
		self
	}
}

struct Tracker {
	/// Sequence number of the latest call, only that one may touch the state.
	latest: u64,
	token: Option<CancellationToken>,
	mounted: bool,
}

struct Inner<A, T, E> {
	func: RequestFn<A, T, E>,
	callbacks: Callbacks<T, E>,
	tracker: Mutex<Tracker>,
	tx: watch::Sender<RequestState<T, E>>,
}

/// Cancelable handle around one async function.
///
/// Every [`execute`](Self::execute) hands the function a fresh [`CancellationToken`] and cancels
/// the one of the call it supersedes. Cancellation is advisory: the function may observe the
/// token to stop early, but what the hook guarantees is that only the latest call of a mounted
/// hook ever updates the state or runs callbacks. Results of superseded calls, and of any call
/// after [`unmount`](Self::unmount), are still returned to whoever awaited them.
pub struct RequestHook<A, T, E> {
	inner: Arc<Inner<A, T, E>>,
}

/// Hooks wrapping create, update or delete calls.
pub type MutationHook<V, T, E> = RequestHook<V, T, E>;

impl<A, T, E> Clone for RequestHook<A, T, E> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<A, T, E> fmt::Debug for RequestHook<A, T, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tracker = self.inner.tracker.lock();

		f.debug_struct("RequestHook")
			.field("latest", &tracker.latest)
			.field("mounted", &tracker.mounted)
			.finish_non_exhaustive()
	}
}

impl<A, T, E> RequestHook<A, T, E>
where
	A: Send + 'static,
	T: Clone + Send + Sync + 'static,
	E: Clone + fmt::Debug + Send + Sync + 'static,
{
	/// Mounts a hook around `func`. With [`RequestOptions::immediate`] set, the first call is
	/// spawned right away, so this must run inside a Tokio runtime in that case.
	pub fn mount<F, Fut>(func: F, options: RequestOptions<A, T, E>) -> Self
	where
		F: Fn(A, CancellationToken) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
	{
		let RequestOptions {
			callbacks,
			immediate,
		} = options;

		let (tx, _) = watch::channel(RequestState::default());

		let hook = Self {
			inner: Arc::new(Inner {
				func: Arc::new(move |args: A, token: CancellationToken| {
					func(args, token).boxed()
				}),
				callbacks,
				tracker: Mutex::new(Tracker {
					latest: 0,
					token: None,
					mounted: true,
				}),
				tx,
			}),
		};

		if let Some(args) = immediate {
			let hook = hook.clone();
			tokio::spawn(async move {
				if let Err(e) = hook.execute(args).await {
					debug!(?e, "Immediate request failed");
				}
			});
		}

		hook
	}

	/// Mounts a hook around a function that doesn't care about cancellation.
	pub fn mutation<F, Fut>(func: F, options: RequestOptions<A, T, E>) -> Self
	where
		F: Fn(A) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
	{
		Self::mount(move |args, _| func(args), options)
	}

	/// Runs the wrapped function, superseding any call still in flight.
	pub async fn execute(&self, args: A) -> Result<T, E> {
		let (seq, token) = {
			let mut tracker = self.inner.tracker.lock();

			if let Some(previous) = tracker.token.take() {
				previous.cancel();
			}

			tracker.latest += 1;
			let token = CancellationToken::new();
			tracker.token = Some(token.clone());

			if tracker.mounted {
				self.inner.tx.send_replace(RequestState::loading());
			}

			(tracker.latest, token)
		};

		let result = (self.inner.func)(args, token).await;

		{
			let mut tracker = self.inner.tracker.lock();

			if !tracker.mounted || tracker.latest != seq {
				debug!(
					seq,
					latest = tracker.latest,
					mounted = tracker.mounted,
					"Dropping result of a superseded request"
				);
				return result;
			}

			tracker.token = None;

			self.inner.tx.send_replace(match &result {
				Ok(data) => RequestState {
					data: Some(data.clone()),
					loading: false,
					error: None,
					is_success: true,
				},
				Err(e) => RequestState {
					data: None,
					loading: false,
					error: Some(e.clone()),
					is_success: false,
				},
			});
		}

		self.inner.callbacks.run(&result);

		result
	}

	/// Cancels the outstanding call, no later result touches the state or runs a callback.
	pub fn unmount(&self) {
		let mut tracker = self.inner.tracker.lock();
		tracker.mounted = false;

		if let Some(token) = tracker.token.take() {
			token.cancel();
		}
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.inner.tracker.lock().mounted
	}

	/// Supersedes any call in flight and shows `data` as settled, the way a cache hit does.
	pub(crate) fn settle_with(&self, data: T) {
		let mut tracker = self.inner.tracker.lock();

		if let Some(token) = tracker.token.take() {
			token.cancel();
		}
		tracker.latest += 1;

		if tracker.mounted {
			self.inner.tx.send_modify(|state| {
				state.data = Some(data);
				state.loading = false;
				state.error = None;
			});
		}
	}

	pub fn reset(&self) {
		self.inner.tx.send_replace(RequestState::default());
	}

	pub fn set_data(&self, data: Option<T>) {
		self.inner.tx.send_modify(|state| state.data = data);
	}

	#[must_use]
	pub fn state(&self) -> RequestState<T, E> {
		self.inner.tx.borrow().clone()
	}

	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<RequestState<T, E>> {
		self.inner.tx.subscribe()
	}
}

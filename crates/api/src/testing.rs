//! Scripted in-memory [`Transport`] for tests.

use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use super::{
	error::Error,
	transport::{Method, Request, Response, Transport},
};

type Route = (Method, String);

enum Scripted {
	Ready(Result<Response, Error>),
	Deferred(oneshot::Receiver<Result<Response, Error>>),
}

#[derive(Default)]
struct Script {
	once: HashMap<Route, VecDeque<Scripted>>,
	sticky: HashMap<Route, Result<Response, Error>>,
	received: Vec<Request>,
}

/// Answers requests by method and path, ignoring query parameters. One-shot answers are used
/// before the sticky one for the same route. Every received request is recorded.
#[derive(Clone, Default)]
pub struct MockTransport {
	script: Arc<Mutex<Script>>,
}

/// The answer to a request that was scripted with [`MockTransport::defer`].
pub struct Deferred(oneshot::Sender<Result<Response, Error>>);

impl Deferred {
	pub fn resolve(self, status: u16, body: Value) {
		// The request may be gone already, nobody to answer then
		let _ = self.0.send(Ok(Response { status, body }));
	}

	pub fn fail(self, error: Error) {
		let _ = self.0.send(Err(error));
	}
}

impl MockTransport {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Answers every request to the route with this response.
	pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
		self.script
			.lock()
			.sticky
			.insert((method, path.to_string()), Ok(Response { status, body }));
	}

	/// Answers only the next request to the route with this response.
	pub fn respond_once(&self, method: Method, path: &str, status: u16, body: Value) {
		self.push_once(method, path, Scripted::Ready(Ok(Response { status, body })));
	}

	/// Fails every request to the route at the transport level.
	pub fn fail(&self, method: Method, path: &str, error: Error) {
		self.script
			.lock()
			.sticky
			.insert((method, path.to_string()), Err(error));
	}

	/// The next request to the route waits until the returned handle is resolved.
	#[must_use]
	pub fn defer(&self, method: Method, path: &str) -> Deferred {
		let (tx, rx) = oneshot::channel();
		self.push_once(method, path, Scripted::Deferred(rx));
		Deferred(tx)
	}

	#[must_use]
	pub fn requests(&self) -> Vec<Request> {
		self.script.lock().received.clone()
	}

	#[must_use]
	pub fn requests_to(&self, method: Method, path: &str) -> Vec<Request> {
		self.script
			.lock()
			.received
			.iter()
			.filter(|r| r.method == method && r.path == path)
			.cloned()
			.collect()
	}

	#[must_use]
	pub fn last_request(&self) -> Option<Request> {
		self.script.lock().received.last().cloned()
	}

	fn push_once(&self, method: Method, path: &str, scripted: Scripted) {
		self.script
			.lock()
			.once
			.entry((method, path.to_string()))
			.or_default()
			.push_back(scripted);
	}
}

#[async_trait]
impl Transport for MockTransport {
	async fn send(&self, request: Request) -> Result<Response, Error> {
		let route = (request.method, request.path.clone());

		let scripted = {
			let mut script = self.script.lock();
			script.received.push(request);

			script
				.once
				.get_mut(&route)
				.and_then(VecDeque::pop_front)
				.or_else(|| script.sticky.get(&route).cloned().map(Scripted::Ready))
		};

		match scripted {
			Some(Scripted::Ready(result)) => result,
			Some(Scripted::Deferred(rx)) => rx
				.await
				.unwrap_or_else(|_| Err(Error::transport("deferred response dropped"))),
			None => Err(Error::transport(format!(
				"no scripted response for {} {}",
				route.0, route.1
			))),
		}
	}
}

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{header, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{config::ApiConfig, error::Error, query::QueryParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl Method {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Patch => Self::PATCH,
			Method::Delete => Self::DELETE,
		}
	}
}

/// One outbound call, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
	pub method: Method,
	pub path: String,
	pub params: QueryParams,
	pub body: Option<Value>,
}

impl Request {
	#[must_use]
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			params: QueryParams::new(),
			body: None,
		}
	}

	#[must_use]
	pub fn with_params(mut self, params: QueryParams) -> Self {
		self.params = params;
		self
	}

	#[must_use]
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);
		self
	}
}

/// Raw HTTP answer, any status. Interpreting it is up to [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
	pub status: u16,
	pub body: Value,
}

impl Response {
	#[must_use]
	pub const fn is_success(&self) -> bool {
		self.status >= 200 && self.status < 300
	}
}

/// The HTTP collaborator. Implementations only fail for transport level problems, every HTTP
/// status comes back as a [`Response`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	async fn send(&self, request: Request) -> Result<Response, Error>;

	async fn get(&self, path: &str, params: QueryParams) -> Result<Response, Error> {
		self.send(Request::new(Method::Get, path).with_params(params))
			.await
	}

	async fn post(&self, path: &str, body: Option<Value>) -> Result<Response, Error> {
		self.send(with_optional_body(Request::new(Method::Post, path), body))
			.await
	}

	async fn put(&self, path: &str, body: Option<Value>) -> Result<Response, Error> {
		self.send(with_optional_body(Request::new(Method::Put, path), body))
			.await
	}

	async fn patch(&self, path: &str, body: Option<Value>) -> Result<Response, Error> {
		self.send(with_optional_body(Request::new(Method::Patch, path), body))
			.await
	}

	async fn delete(&self, path: &str) -> Result<Response, Error> {
		self.send(Request::new(Method::Delete, path)).await
	}
}

fn with_optional_body(request: Request, body: Option<Value>) -> Request {
	match body {
		Some(body) => request.with_body(body),
		None => request,
	}
}

/// Source of the bearer token attached to every request.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
	async fn token(&self) -> Option<String>;

	/// Called when the backend rejects the current token.
	async fn invalidate(&self) {}
}

#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
	async fn token(&self) -> Option<String> {
		Some(self.0.clone())
	}
}

/// A token slot shared with whatever performs the login, cleared on `401`.
#[derive(Debug, Clone, Default)]
pub struct SharedToken(Arc<RwLock<Option<String>>>);

impl SharedToken {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, token: impl Into<String>) {
		*self.0.write() = Some(token.into());
	}

	pub fn clear(&self) {
		self.0.write().take();
	}

	#[must_use]
	pub fn get(&self) -> Option<String> {
		self.0.read().clone()
	}
}

#[async_trait]
impl TokenProvider for SharedToken {
	async fn token(&self) -> Option<String> {
		self.get()
	}

	async fn invalidate(&self) {
		self.clear();
	}
}

trait WithAuth {
	fn with_auth(self, token: Option<String>) -> Self;
}

impl WithAuth for RequestBuilder {
	fn with_auth(self, token: Option<String>) -> Self {
		match token {
			Some(token) => self.header(header::AUTHORIZATION, format!("Bearer {token}")),
			None => self,
		}
	}
}

/// [`Transport`] backed by [`reqwest`], with a fixed timeout for every request.
pub struct HttpTransport {
	client: reqwest::Client,
	base_url: String,
	token_provider: Option<Arc<dyn TokenProvider>>,
}

impl fmt::Debug for HttpTransport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HttpTransport")
			.field("base_url", &self.base_url)
			.field("authenticated", &self.token_provider.is_some())
			.finish_non_exhaustive()
	}
}

impl HttpTransport {
	pub fn new(config: &ApiConfig) -> Result<Self, Error> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()?;

		Ok(Self {
			client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			token_provider: None,
		})
	}

	#[must_use]
	pub fn with_token_provider(mut self, provider: impl TokenProvider) -> Self {
		self.token_provider = Some(Arc::new(provider));
		self
	}

	fn url(&self, path: &str) -> String {
		if path.starts_with('/') {
			format!("{}{path}", self.base_url)
		} else {
			format!("{}/{path}", self.base_url)
		}
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send(&self, request: Request) -> Result<Response, Error> {
		let Request {
			method,
			path,
			params,
			body,
		} = request;

		let url = self.url(&path);

		let token = match &self.token_provider {
			Some(provider) => provider.token().await,
			None => None,
		};

		let mut builder = self
			.client
			.request(method.into(), &url)
			.header(header::CONTENT_TYPE, "application/json")
			.query(&params)
			.with_auth(token);

		if let Some(body) = body {
			builder = builder.json(&body);
		}

		debug!(%method, %url, "API request");

		let response = builder.send().await.map_err(|e| {
			error!(%method, %url, ?e, "API request failed");
			Error::from(e)
		})?;

		let status = response.status();
		debug!(status = status.as_u16(), %url, "API response");

		if status == StatusCode::UNAUTHORIZED {
			if let Some(provider) = &self.token_provider {
				warn!(%url, "Access token rejected, invalidating it");
				provider.invalidate().await;
			}
		}

		let text = response.text().await?;

		let body = if text.trim().is_empty() {
			Value::Null
		} else {
			match serde_json::from_str(&text) {
				Ok(body) => body,
				Err(e) if status.is_success() => return Err(e.into()),
				Err(_) => Value::String(text),
			}
		};

		if !status.is_success() {
			error!(status = status.as_u16(), %url, %body, "API error response");
		}

		Ok(Response {
			status: status.as_u16(),
			body,
		})
	}
}

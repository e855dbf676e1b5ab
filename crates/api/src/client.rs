use std::{fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
	envelope::{Envelope, EnvelopeFields, PaginatedResult},
	error::Error,
	query::Query,
	transport::{Request, Response, Transport},
};

/// Shared handle over a [`Transport`] that knows how to unwrap the backend's envelopes.
#[derive(Clone)]
pub struct ApiClient {
	transport: Arc<dyn Transport>,
	envelope: Arc<EnvelopeFields>,
}

impl fmt::Debug for ApiClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApiClient")
			.field("envelope", &self.envelope)
			.finish_non_exhaustive()
	}
}

impl ApiClient {
	pub fn new(transport: impl Transport, envelope: EnvelopeFields) -> Self {
		Self::from_shared(Arc::new(transport), envelope)
	}

	pub fn from_shared(transport: Arc<dyn Transport>, envelope: EnvelopeFields) -> Self {
		Self {
			transport,
			envelope: Arc::new(envelope),
		}
	}

	#[must_use]
	pub fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	#[must_use]
	pub fn envelope_fields(&self) -> &EnvelopeFields {
		&self.envelope
	}

	/// Issues exactly one request and unwraps its envelope.
	pub async fn send(&self, request: Request) -> Result<Envelope, Error> {
		let response = self.transport.send(request).await?;
		self.unwrap(response)
	}

	pub async fn fetch<D: DeserializeOwned>(&self, request: Request) -> Result<D, Error> {
		self.send(request).await?.into_data()
	}

	pub async fn fetch_page<D: DeserializeOwned>(
		&self,
		request: Request,
		query: &Query,
	) -> Result<PaginatedResult<D>, Error> {
		PaginatedResult::from_envelope(self.send(request).await?, query)
	}

	pub async fn execute(&self, request: Request) -> Result<(), Error> {
		self.send(request).await.map(|_| ())
	}

	fn unwrap(&self, Response { status, body }: Response) -> Result<Envelope, Error> {
		if (200..300).contains(&status) {
			return Envelope::from_value(body, &self.envelope, Some(status));
		}

		let message = body
			.get(&self.envelope.message)
			.and_then(Value::as_str)
			.map(str::to_string);

		match Envelope::from_value(body, &self.envelope, Some(status)) {
			Err(e @ Error::Application { .. }) => Err(e),
			_ => Err(Error::Transport {
				message: message.unwrap_or_else(|| format!("HTTP {status}")),
				status: Some(status),
				timeout: false,
			}),
		}
	}
}

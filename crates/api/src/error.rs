use thiserror::Error;

use super::query::ReservedKey;

const NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
	#[error("`{0}` is reserved for the query descriptor and can't be used as a filter key")]
	ReservedKey(ReservedKey),
	#[error("filter keys must not be empty")]
	EmptyKey,
	#[error("invalid value for `{key}`: {value}")]
	InvalidValue { key: &'static str, value: String },
}

/// All failures surfaced by the API layer.
///
/// It's `Clone` so state containers can keep a copy of the last error while still handing one
/// back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// Network failure, timeout or a non-2xx response without a parseable envelope.
	#[error("transport error{}: {message}", .status.map(|s| format!(" <status='{s}'>")).unwrap_or_default())]
	Transport {
		message: String,
		status: Option<u16>,
		timeout: bool,
	},
	/// The backend answered with `success: false`.
	#[error("{message}")]
	Application {
		message: String,
		status: Option<u16>,
	},
	#[error("failed to decode response: {0}")]
	Decode(String),
	#[error(transparent)]
	Query(#[from] QueryError),
	#[error("request canceled")]
	Canceled,
}

impl Error {
	pub(crate) fn transport(message: impl Into<String>) -> Self {
		Self::Transport {
			message: message.into(),
			status: None,
			timeout: false,
		}
	}

	#[must_use]
	pub const fn status(&self) -> Option<u16> {
		match self {
			Self::Transport { status, .. } | Self::Application { status, .. } => *status,
			Self::Decode(_) | Self::Query(_) | Self::Canceled => None,
		}
	}

	/// Unknown ids are reported by the backend as a failed envelope with a 404 status, there is
	/// no dedicated variant for them.
	#[must_use]
	pub fn is_not_found(&self) -> bool {
		self.status() == Some(NOT_FOUND)
	}

	#[must_use]
	pub const fn is_timeout(&self) -> bool {
		matches!(self, Self::Transport { timeout: true, .. })
	}
}

impl From<reqwest::Error> for Error {
	fn from(e: reqwest::Error) -> Self {
		Self::Transport {
			message: e.to_string(),
			status: e.status().map(|s| s.as_u16()),
			timeout: e.is_timeout(),
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Self::Decode(e.to_string())
	}
}

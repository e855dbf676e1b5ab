//! Configuration consumed by the API layer, supplied by the embedding app.

use std::{
	env, fs, io,
	path::{Path, PathBuf},
	str::FromStr,
	time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::envelope::EnvelopeFields;

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_COUNT: u32 = 3;

pub const ENV_VAR: &str = "HX_ENV";
pub const API_URL_VAR: &str = "HX_API_URL";
pub const API_TIMEOUT_VAR: &str = "HX_API_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to access config file <path='{}'>: {source}", .path.display())]
	Io { path: PathBuf, source: io::Error },
	#[error("failed to parse config: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("invalid value for environment variable {var}: {value}")]
	InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
	#[default]
	Development,
	Staging,
	Production,
}

impl AppEnv {
	/// Default `tracing` filter directive for the profile.
	#[must_use]
	pub const fn log_level(self) -> &'static str {
		match self {
			Self::Development => "debug",
			Self::Staging => "info",
			Self::Production => "warn",
		}
	}
}

impl FromStr for AppEnv {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"development" | "dev" => Ok(Self::Development),
			"staging" => Ok(Self::Staging),
			"production" | "prod" => Ok(Self::Production),
			other => Err(ConfigError::InvalidEnv {
				var: ENV_VAR,
				value: other.to_string(),
			}),
		}
	}
}

mod duration_ms {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	pub env: AppEnv,
	pub base_url: String,
	/// Applied to every request, there is no per operation override.
	#[serde(rename = "timeout_ms", with = "duration_ms")]
	pub timeout: Duration,
	/// Carried for the embedding app, requests are never retried by this layer.
	pub retry_count: u32,
	pub envelope: EnvelopeFields,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			env: AppEnv::default(),
			base_url: DEFAULT_BASE_URL.to_string(),
			timeout: DEFAULT_TIMEOUT,
			retry_count: DEFAULT_RETRY_COUNT,
			envelope: EnvelopeFields::default(),
		}
	}
}

impl ApiConfig {
	/// Defaults overridden by `HX_ENV`, `HX_API_URL` and `HX_API_TIMEOUT_MS`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::default().with_overrides(|var| env::var(var).ok())
	}

	fn with_overrides(
		mut self,
		lookup: impl Fn(&'static str) -> Option<String>,
	) -> Result<Self, ConfigError> {
		if let Some(app_env) = lookup(ENV_VAR) {
			self.env = app_env.parse()?;
		}

		if let Some(base_url) = lookup(API_URL_VAR).filter(|url| !url.is_empty()) {
			self.base_url = base_url;
		} else {
			warn!(var = API_URL_VAR, base_url = %self.base_url, "API URL not set, using default");
		}

		if let Some(timeout) = lookup(API_TIMEOUT_VAR) {
			self.timeout = timeout
				.parse()
				.map(Duration::from_millis)
				.map_err(|_| ConfigError::InvalidEnv {
					var: API_TIMEOUT_VAR,
					value: timeout,
				})?;
		}

		Ok(self)
	}

	/// Loads a JSON config file, falling back to defaults when it doesn't exist.
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();

		match fs::read_to_string(path) {
			Ok(json) => {
				info!("Loading API config from {}", path.display());
				serde_json::from_str(&json).map_err(Into::into)
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				warn!("No API config at {}, using defaults", path.display());
				Ok(Self::default())
			}
			Err(source) => Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			}),
		}
	}

	pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let path = path.as_ref();

		fs::write(path, serde_json::to_string_pretty(self)?).map_err(|source| {
			ConfigError::Io {
				path: path.to_path_buf(),
				source,
			}
		})
	}
}

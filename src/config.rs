//! Resolved client configuration and the validated scope newtype.
//!
//! Loading values from files or environments stays with the caller; the client only consumes a
//! fully resolved [`ClientConfig`]. Serde derives are provided so callers can bind the value
//! from whatever configuration source they use.

// self
use crate::{_prelude::*, error::ConfigError};

/// Maximum length the token endpoint accepts for the `scope` form field.
pub const MAX_SCOPE_LEN: usize = 300;

/// Space-separated OAuth scope string, validated against [`MAX_SCOPE_LEN`].
///
/// Scopes are kept verbatim (no normalization or deduplication); the token endpoint receives
/// exactly what the operator configured. Serde round-trips through `TryFrom<String>` so
/// deserialized values are validated the same way as constructed ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(String);
impl Scope {
	/// Creates a scope after validating its length.
	pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
		let value = value.into();

		if value.len() > MAX_SCOPE_LEN {
			return Err(ConfigError::ScopeTooLong { max: MAX_SCOPE_LEN, len: value.len() });
		}

		Ok(Self(value))
	}

	/// Returns the raw space-separated scope string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true when no scopes are configured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for Scope {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<Scope> for String {
	fn from(value: Scope) -> Self {
		value.0
	}
}
impl TryFrom<String> for Scope {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for Scope {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Resolved configuration for one client identity against one fixed authorization server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
	/// OAuth 2.0 client identifier; also fills the assertion's `iss` and `sub` claims.
	pub client_id: String,
	/// Token endpoint URL; doubles as the assertion's `aud` claim.
	pub token_endpoint: Url,
	/// Scopes requested on every exchange.
	pub scope: Scope,
	/// Lifetime of each signed assertion in seconds (`exp - iat`).
	#[serde(default = "default_assertion_ttl_secs")]
	pub assertion_ttl_secs: u64,
}
impl ClientConfig {
	/// Creates a validated configuration with the default 60-second assertion TTL.
	pub fn new(
		client_id: impl Into<String>,
		token_endpoint: Url,
		scope: Scope,
	) -> Result<Self, ConfigError> {
		let config = Self {
			client_id: client_id.into(),
			token_endpoint,
			scope,
			assertion_ttl_secs: default_assertion_ttl_secs(),
		};

		config.validate()?;

		Ok(config)
	}

	/// Overrides the assertion TTL (defaults to 60 seconds).
	pub fn with_assertion_ttl_secs(mut self, secs: u64) -> Self {
		self.assertion_ttl_secs = secs;

		self
	}

	/// Re-validates the configuration; the exchanger calls this before any I/O so values built
	/// via serde or struct literals are checked as strictly as constructed ones.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::EmptyClientId);
		}
		if self.assertion_ttl_secs == 0 {
			return Err(ConfigError::NonPositiveTtl);
		}

		Ok(())
	}

	/// Assertion lifetime as a [`Duration`].
	pub fn assertion_ttl(&self) -> Duration {
		Duration::seconds(i64::try_from(self.assertion_ttl_secs).unwrap_or(i64::MAX))
	}
}

fn default_assertion_ttl_secs() -> u64 {
	60
}

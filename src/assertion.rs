//! Signed client-assertion construction (RFC 7523 private_key_jwt).

// crates.io
use uuid::Uuid;
// self
use crate::{_prelude::*, config::ClientConfig, error::KeyError, key::KeyHolder};

/// Claim set carried by every client assertion—exactly these seven, no extras.
///
/// `jti` is freshly generated per assertion, so no two assertions from the same process share
/// one; the token endpoint relies on that for replay protection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Unique token identifier (UUID v4).
	pub jti: String,
	/// Subject; equals the client id.
	pub sub: String,
	/// Issuer; equals the client id.
	pub iss: String,
	/// Audience; the token endpoint URL.
	pub aud: String,
	/// Issued-at instant, Unix seconds.
	pub iat: i64,
	/// Not-before instant; equals `iat`.
	pub nbf: i64,
	/// Expiry instant; `iat` plus the configured TTL.
	pub exp: i64,
}
impl AssertionClaims {
	/// Issues a fresh claim set for the configured client identity at `now`.
	pub fn issue(config: &ClientConfig, now: OffsetDateTime) -> Self {
		let iat = now.unix_timestamp();

		Self {
			jti: Uuid::new_v4().to_string(),
			sub: config.client_id.clone(),
			iss: config.client_id.clone(),
			aud: config.token_endpoint.as_str().to_owned(),
			iat,
			nbf: iat,
			exp: iat + config.assertion_ttl().whole_seconds(),
		}
	}
}

/// Builds signed assertions for one client identity.
///
/// Stateless apart from the borrowed configuration and key holder; every
/// [`build`](Self::build) call produces a syntactically distinct token (fresh `jti` and `iat`)
/// even with identical inputs.
#[derive(Clone, Debug)]
pub struct AssertionBuilder<'a> {
	config: &'a ClientConfig,
	keys: &'a KeyHolder,
}
impl<'a> AssertionBuilder<'a> {
	/// Creates a builder over the provided configuration and key holder.
	pub fn new(config: &'a ClientConfig, keys: &'a KeyHolder) -> Self {
		Self { config, keys }
	}

	/// Produces a freshly signed assertion; the only side effect is the signing call itself.
	pub fn build(&self) -> Result<ClientAssertion, KeyError> {
		let claims = AssertionClaims::issue(self.config, OffsetDateTime::now_utc());

		self.keys.sign(&claims)
	}
}

/// A transient signed assertion in compact JWS form (`header.payload.signature`).
///
/// Produced fresh for every token request and never cached or reused; each carries a unique
/// `jti` and a narrow validity window. Formatters redact the value since it is a credential.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientAssertion(String);
impl ClientAssertion {
	pub(crate) fn new(compact: impl Into<String>) -> Self {
		Self(compact.into())
	}

	/// Returns the compact JWS string for the `client_assertion` form field.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Consumes the assertion, yielding the compact JWS string.
	pub fn into_string(self) -> String {
		self.0
	}
}
impl Debug for ClientAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ClientAssertion").field(&"<redacted>").finish()
	}
}

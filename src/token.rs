//! Access-token models: the wire-level response and the cache-stamped record.

pub mod secret;

pub use secret::TokenSecret;

// crates.io
use time::PrimitiveDateTime;
// self
use crate::_prelude::*;

/// Successful token-endpoint response, exactly as it appears on the wire.
///
/// `obtained_at` is deliberately absent here—the cache stamps it the moment the response is
/// accepted, keeping expiry bookkeeping in one place.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	/// Bearer access token. Must be non-empty; the exchanger rejects 2xx bodies without it.
	pub access_token: TokenSecret,
	/// Token type, normally `Bearer`.
	#[serde(default)]
	pub token_type: String,
	/// Token lifetime in seconds, relative to the instant it was obtained.
	#[serde(default)]
	pub expires_in: u64,
	/// Scopes the server actually granted, when echoed back.
	#[serde(default)]
	pub scope: Option<String>,
}

/// The single live access token for this client identity.
///
/// Replaced, never accumulated: the cache holds at most one of these at a time.
#[derive(Clone, Debug)]
pub struct AccessToken {
	/// Bearer access token value.
	pub access_token: TokenSecret,
	/// Token type, normally `Bearer`.
	pub token_type: String,
	/// Granted lifetime in seconds.
	pub expires_in: u64,
	/// Scopes the server granted, when echoed back.
	pub scope: Option<String>,
	/// Instant the cache accepted the response.
	pub obtained_at: OffsetDateTime,
}
impl AccessToken {
	/// Safety margin subtracted from the token lifetime so expiry is declared before the
	/// authorization server's own clock would reject the token. A token whose `expires_in`
	/// does not exceed this buffer is treated as stale immediately.
	pub const EXPIRY_BUFFER: Duration = Duration::seconds(60);

	/// Stamps a wire response with the instant it was obtained.
	pub fn issue(response: TokenResponse, obtained_at: OffsetDateTime) -> Self {
		Self {
			access_token: response.access_token,
			token_type: response.token_type,
			expires_in: response.expires_in,
			scope: response.scope,
			obtained_at,
		}
	}

	/// Instant the token stops being valid, saturating at the far future.
	pub fn expires_at(&self) -> OffsetDateTime {
		let lifetime = Duration::seconds(i64::try_from(self.expires_in).unwrap_or(i64::MAX));

		self.obtained_at
			.checked_add(lifetime)
			.unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
	}

	/// Whether the token is expired (or inside the safety buffer) at the given instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at() - Self::EXPIRY_BUFFER
	}

	/// Whether the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// `Authorization` header value for this token.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn token(expires_in: u64, obtained_at: OffsetDateTime) -> AccessToken {
		AccessToken::issue(
			TokenResponse {
				access_token: TokenSecret::new("tok-1"),
				token_type: "Bearer".into(),
				expires_in,
				scope: Some("read".into()),
			},
			obtained_at,
		)
	}

	#[test]
	fn expiry_respects_the_sixty_second_buffer() {
		let obtained = macros::datetime!(2025-01-01 00:00 UTC);
		let token = token(120, obtained);

		assert!(!token.is_expired_at(macros::datetime!(2025-01-01 00:00:59 UTC)));
		// The buffer fires a full minute before the real expiry.
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 00:01:00 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 00:02:00 UTC)));
	}

	#[test]
	fn lifetime_at_or_below_the_buffer_is_immediately_stale() {
		let obtained = macros::datetime!(2025-01-01 00:00 UTC);

		assert!(token(60, obtained).is_expired_at(obtained));
		assert!(token(0, obtained).is_expired_at(obtained));
	}

	#[test]
	fn oversized_lifetime_saturates_instead_of_overflowing() {
		let token = token(u64::MAX, macros::datetime!(2025-01-01 00:00 UTC));

		assert!(!token.is_expired_at(macros::datetime!(9999-01-01 00:00 UTC)));
	}

	#[test]
	fn bearer_header_prefixes_the_token() {
		let token = token(120, OffsetDateTime::now_utc());

		assert_eq!(token.bearer_header(), "Bearer tok-1");
	}
}

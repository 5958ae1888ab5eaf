//! Client-level error types shared across assertion building, key handling, and token exchange.
//!
//! Every variant carries cloneable payloads (messages, paths, status codes) instead of opaque
//! error sources: the token cache hands the refresh initiator's failure to every caller that
//! joined the same refresh round, so errors must be duplicable after the fact.

// std
use std::path::PathBuf;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical client error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; detected before any I/O, never retried automatically.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Signing key missing, unparsable, or unusable. Fatal for the calling operation.
	#[error(transparent)]
	Key(#[from] KeyError),
	/// Token endpoint rejected the request or answered with an unusable body.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Network-level failure from the injected HTTP transport.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised before any request leaves the process.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Client identifier is empty or whitespace.
	#[error("Client identifier cannot be empty.")]
	EmptyClientId,
	/// Scope string exceeds the 300-character limit accepted by the token endpoint.
	#[error("Scope field accepts at most {max} characters, got {len}.")]
	ScopeTooLong {
		/// Maximum accepted length.
		max: usize,
		/// Offending scope length.
		len: usize,
	},
	/// Assertion TTL must be positive so `exp` lands after `iat`.
	#[error("Assertion TTL must be positive.")]
	NonPositiveTtl,
	/// Outbound HTTP client could not be constructed.
	#[error("HTTP client could not be constructed: {message}.")]
	HttpClientBuild {
		/// Human-readable builder failure.
		message: String,
	},
}

/// Signing-key failures. Not retried; the operator must fix the key material.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum KeyError {
	/// The key source points at a file that does not exist.
	#[error("Private key file not found: {}.", .path.display())]
	NotFound {
		/// Path the holder attempted to read.
		path: PathBuf,
	},
	/// The key material could not be parsed as a PEM-encoded RSA private key.
	#[error("Private key is not a readable RSA private key: {message}.")]
	Unreadable {
		/// Parser failure detail.
		message: String,
	},
	/// The signing operation itself failed (wrong key type, corrupted material).
	#[error("Signing the client assertion failed: {message}.")]
	Signing {
		/// Signer failure detail.
		message: String,
	},
}

/// Failures reported by the token endpoint or by response parsing.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ExchangeError {
	/// Non-2xx response carrying a standard OAuth error body.
	#[error("Token endpoint rejected the request with HTTP {status}: {error}{}.", .error_description.as_ref().map(|reason| format!(" - {reason}")).unwrap_or_default())]
	Rejected {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// OAuth `error` code from the response body.
		error: String,
		/// OAuth `error_description`, when supplied.
		error_description: Option<String>,
	},
	/// Non-2xx response whose body does not match the OAuth error schema.
	#[error("Token endpoint returned HTTP {status} with an unrecognized body: {body}.")]
	Http {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Truncated raw body for diagnostics.
		body: String,
	},
	/// 2xx response whose body is missing, empty, or not the token schema.
	#[error("Token endpoint returned a malformed success response: {message}.")]
	MalformedResponse {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Parse failure detail, including the JSON path when available.
		message: String,
	},
}

/// Transport-level failures (DNS, TCP, TLS, timeout) from the injected HTTP client.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint: {message}.")]
	Network {
		/// Transport-specific failure detail.
		message: String,
	},
	/// The request exceeded the transport's configured deadline.
	#[error("Request to the token endpoint timed out.")]
	Timeout,
}
impl TransportError {
	/// Wraps a transport-specific error into the network variant.
	pub fn network(source: impl Display) -> Self {
		Self::Network { message: source.to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(error: ReqwestError) -> Self {
		if error.is_timeout() { Self::Timeout } else { Self::network(error) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejection_includes_error_and_description() {
		let bare = ExchangeError::Rejected {
			status: 400,
			error: "invalid_client".into(),
			error_description: None,
		};

		assert_eq!(
			bare.to_string(),
			"Token endpoint rejected the request with HTTP 400: invalid_client."
		);

		let described = ExchangeError::Rejected {
			status: 400,
			error: "invalid_client".into(),
			error_description: Some("unknown key".into()),
		};

		assert!(described.to_string().contains("invalid_client - unknown key"));
	}

	#[test]
	fn errors_stay_cloneable_across_the_taxonomy() {
		let error = Error::from(ExchangeError::Http { status: 502, body: "<html>".into() });
		let clone = error.clone();

		assert_eq!(error.to_string(), clone.to_string());
	}
}

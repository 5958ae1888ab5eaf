//! Transport primitives for the token exchange.
//!
//! The client's only dependency on an HTTP stack is [`TokenHttpClient`]: send one form-encoded
//! POST, hand back the status and body. Everything else—wire fields, response parsing, error
//! classification—stays inside the crate, so tests and downstream services can swap in their
//! own transport without re-implementing any OAuth logic.

#[cfg(feature = "reqwest")] use std::ops::Deref;

#[cfg(feature = "reqwest")] use reqwest::header::CACHE_CONTROL;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`TokenHttpClient::post_form`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// One form-encoded POST to the token endpoint.
#[derive(Clone, Debug)]
pub struct FormRequest {
	/// Destination URL.
	pub url: Url,
	/// Form fields, sent `application/x-www-form-urlencoded`.
	pub fields: Vec<(&'static str, String)>,
}

/// Raw transport-level response: status plus body, nothing interpreted.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body as text.
	pub body: String,
}
impl RawResponse {
	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing the token exchange.
///
/// Implementations must attach a `Cache-Control: no-cache` request header so intermediaries
/// never serve a stale token response, must honor whatever timeout the underlying client is
/// configured with, and must return `Send` futures so client calls can hop executors. Timeouts
/// and other network-level failures map to [`TransportError`]; HTTP error statuses are NOT
/// transport failures—they come back as a [`RawResponse`] for the exchanger to classify.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends the form POST and resolves to the raw status + body.
	fn post_form<'a>(&'a self, request: &'a FormRequest) -> TransportFuture<'a>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure the wrapped client with the request timeout the caller wants to bound exchanges
/// by; the wrapper adds only the `Cache-Control` header.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_form<'a>(&'a self, request: &'a FormRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.post(request.url.clone())
				.header(CACHE_CONTROL, "no-cache")
				.form(&request.fields)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(RawResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn success_covers_the_whole_2xx_range() {
		assert!(RawResponse { status: 200, body: String::new() }.is_success());
		assert!(RawResponse { status: 204, body: String::new() }.is_success());
		assert!(!RawResponse { status: 199, body: String::new() }.is_success());
		assert!(!RawResponse { status: 400, body: String::new() }.is_success());
	}
}

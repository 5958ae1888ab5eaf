//! The public facade composing assertion building, key handling, exchange, and the cache.

#[cfg(feature = "reqwest")]
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
// self
use crate::{
	_prelude::*,
	assertion::AssertionBuilder,
	cache::{TokenCache, TokenMetrics},
	config::ClientConfig,
	exchange::TokenExchanger,
	http::TokenHttpClient,
	key::{KeyHolder, KeySource},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	token::{AccessToken, TokenResponse, TokenSecret},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestAssertionClient = AssertionClient<ReqwestHttpClient>;

/// OAuth 2.0 private_key_jwt client for a single trusted backend identity.
///
/// Owns the configuration, the lazily loaded signing key, the exchanger, and the single-token
/// cache; one instance per client identity. All public operations are safe under concurrent
/// use, and dropping the client releases the key material, the lock, and any pooled transport
/// connections with it. There is no automatic retry and no background refresh: errors surface
/// to the caller as-is and the next call after a failure retries lazily.
pub struct AssertionClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: ClientConfig,
	keys: KeyHolder,
	exchanger: TokenExchanger<C>,
	cache: TokenCache,
}
impl<C> AssertionClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a client over a caller-provided transport.
	///
	/// The signing key is not touched until the first token request; configure timeouts on the
	/// transport itself, and cancel an in-flight operation by dropping its future—the refresh
	/// guard is released on every exit path.
	pub fn with_http_client(
		config: ClientConfig,
		key_source: KeySource,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			config,
			keys: KeyHolder::new(key_source),
			exchanger: TokenExchanger::new(http_client),
			cache: TokenCache::new(),
		}
	}

	/// The resolved configuration this client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Traffic counters for the underlying token cache.
	pub fn metrics(&self) -> &TokenMetrics {
		self.cache.metrics()
	}

	/// Returns a valid bearer access token, reusing the cached one whenever it is still inside
	/// its validity window (expiry minus the 60-second safety buffer).
	///
	/// Concurrent callers share a single token exchange; whoever arrives while a refresh is in
	/// flight waits for that refresh's outcome instead of starting another.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::CachedFetch;

		let span = FlowSpan::new(KIND, "access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move { self.cache.get_or_refresh(|| self.request_token()).await })
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result.map(|token| token.access_token)
	}

	/// Unconditionally obtains a brand-new token, replacing the cached one even if it is still
	/// valid.
	pub async fn refresh_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::ForceRefresh;

		let span = FlowSpan::new(KIND, "refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move { self.cache.force_refresh(|| self.request_token()).await })
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result.map(|token| token.access_token)
	}

	/// Non-blocking read of whatever the cache currently holds.
	///
	/// `None` while the slot is empty; never triggers network I/O and never waits on an
	/// in-flight refresh.
	pub fn current_token_response(&self) -> Option<AccessToken> {
		self.cache.current()
	}

	async fn request_token(&self) -> Result<TokenResponse> {
		let assertion = AssertionBuilder::new(&self.config, &self.keys).build()?;

		self.exchanger.exchange(&self.config, assertion).await
	}
}
#[cfg(feature = "reqwest")]
impl AssertionClient<ReqwestHttpClient> {
	/// Creates a client with a default reqwest transport.
	pub fn new(config: ClientConfig, key_source: KeySource) -> Self {
		Self::with_http_client(config, key_source, ReqwestHttpClient::default())
	}

	/// Builds an outbound [`ReqwestClient`] whose every request carries
	/// `Authorization: Bearer <token>`.
	///
	/// Obtains a valid token through the cache first (waiting on a refresh when necessary); the
	/// returned client holds no cache of its own and does not extend the token's lifetime—once
	/// the token expires, build a new authorized client.
	pub async fn authorized_client(&self) -> Result<ReqwestClient> {
		let token = self.access_token().await?;
		let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
			.map_err(|error| ConfigError::HttpClientBuild { message: error.to_string() })?;

		bearer.set_sensitive(true);

		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, bearer);

		ReqwestClient::builder()
			.default_headers(headers)
			.build()
			.map_err(|error| ConfigError::HttpClientBuild { message: error.to_string() }.into())
	}
}
impl<C> Debug for AssertionClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssertionClient")
			.field("client_id", &self.config.client_id)
			.field("token_endpoint", &self.config.token_endpoint.as_str())
			.field("cache", &self.cache)
			.finish()
	}
}

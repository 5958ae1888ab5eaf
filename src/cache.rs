//! Single-slot access-token cache with a single-flight refresh guard.
//!
//! One cache instance serves one client identity. The slot conceptually moves between Empty,
//! Valid, and Refreshing: reads of a still-valid token return immediately, a miss runs the
//! exchange while holding the refresh guard so at most one exchange is ever in flight, and a
//! failure empties the slot again so the next caller may retry.
//!
//! Callers that queue behind an in-flight refresh share that refresh's outcome instead of
//! starting their own: each completed refresh bumps a round counter and records its result, and
//! a caller that observes a bumped round on wake-up returns the recorded outcome. Refresh is
//! purely lazy—no background timer; the first caller after expiry pays the refresh latency.
//!
//! Cancellation safety: the guard is released by RAII on every exit path, including a caller's
//! future being dropped mid-exchange, so an abandoned refresh never strands the queue.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	token::{AccessToken, TokenResponse},
};

/// Thread-safe counters describing the cache's traffic.
///
/// Always on (plain atomics); the feature-gated `metrics` recorder in [`crate::obs`] is layered
/// on top at the facade, not here.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	attempts: AtomicU64,
	cache_hits: AtomicU64,
	exchanges: AtomicU64,
	failures: AtomicU64,
}
impl TokenMetrics {
	/// Total token requests served, cached or not.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Requests answered from the cached token without I/O.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Token exchanges actually dispatched to the endpoint.
	pub fn exchanges(&self) -> u64 {
		self.exchanges.load(Ordering::Relaxed)
	}

	/// Exchanges that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	fn record_exchange(&self) {
		self.exchanges.fetch_add(1, Ordering::Relaxed);
	}

	fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[derive(Default)]
struct CacheState {
	token: Option<AccessToken>,
	round: u64,
	last_failure: Option<Error>,
}

/// Owns the single currently-valid token for one client identity.
///
/// The async refresh guard is held across the whole read-or-refresh critical section, network
/// exchange included, so it doubles as the single-flight primitive; the snapshot state behind a
/// cheap sync mutex lets [`current`](Self::current) read without blocking on a refresh.
#[derive(Default)]
pub struct TokenCache {
	refresh_guard: AsyncMutex<()>,
	state: Mutex<CacheState>,
	metrics: TokenMetrics,
}
impl TokenCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Traffic counters for this cache.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.metrics
	}

	/// Non-blocking snapshot of the slot; never triggers I/O and never waits on a refresh.
	pub fn current(&self) -> Option<AccessToken> {
		self.state.lock().token.clone()
	}

	/// Returns the cached token when still valid, otherwise refreshes via `refresh`.
	///
	/// Concurrent callers collapse onto one exchange: whoever acquires the guard first runs
	/// `refresh`; everyone queued behind it receives that round's outcome (the fresh token, or
	/// a clone of the initiator's error) without dispatching another exchange.
	pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<TokenResponse>>,
	{
		self.metrics.record_attempt();

		let joined_round = self.state.lock().round;
		let _guard = self.refresh_guard.lock().await;

		{
			let state = self.state.lock();

			if let Some(token) = state.token.as_ref().filter(|token| !token.is_expired()) {
				self.metrics.record_cache_hit();

				return Ok(token.clone());
			}
			if state.round != joined_round
				&& let Some(failure) = &state.last_failure
			{
				// Queued behind a refresh that failed; share its outcome instead of retrying.
				return Err(failure.clone());
			}
		}

		self.run_refresh(refresh()).await
	}

	/// Refreshes unconditionally, bypassing the expiry check, under the same guard.
	pub async fn force_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<TokenResponse>>,
	{
		self.metrics.record_attempt();

		let _guard = self.refresh_guard.lock().await;

		self.run_refresh(refresh()).await
	}

	// Caller must hold `refresh_guard`.
	async fn run_refresh(&self, exchange: impl Future<Output = Result<TokenResponse>>) -> Result<AccessToken> {
		self.metrics.record_exchange();

		let outcome = exchange.await;
		let obtained_at = OffsetDateTime::now_utc();
		let mut state = self.state.lock();

		state.round = state.round.wrapping_add(1);

		match outcome {
			Ok(response) => {
				let token = AccessToken::issue(response, obtained_at);

				state.token = Some(token.clone());
				state.last_failure = None;

				Ok(token)
			},
			Err(error) => {
				self.metrics.record_failure();

				state.token = None;
				state.last_failure = Some(error.clone());

				Err(error)
			},
		}
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenCache")
			.field("token_present", &state.token.is_some())
			.field("round", &state.round)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// self
	use super::*;
	use crate::{error::TransportError, token::TokenSecret};

	fn response(token: &str, expires_in: u64) -> TokenResponse {
		TokenResponse {
			access_token: TokenSecret::new(token),
			token_type: "Bearer".into(),
			expires_in,
			scope: None,
		}
	}

	#[tokio::test]
	async fn sequential_calls_within_validity_reuse_the_token() {
		let cache = TokenCache::new();
		let exchanges = AtomicUsize::new(0);
		let refresh = || {
			exchanges.fetch_add(1, Ordering::SeqCst);

			async { Ok(response("tok-1", 120)) }
		};
		let first = cache.get_or_refresh(refresh).await.expect("First fetch should succeed.");
		let second = cache.get_or_refresh(refresh).await.expect("Second fetch should succeed.");

		assert_eq!(first.access_token.expose(), "tok-1");
		assert_eq!(second.access_token.expose(), "tok-1");
		assert_eq!(exchanges.load(Ordering::SeqCst), 1);
		assert_eq!(cache.metrics().cache_hits(), 1);
	}

	#[tokio::test]
	async fn lifetime_inside_the_buffer_triggers_a_new_exchange() {
		let cache = TokenCache::new();
		let exchanges = AtomicUsize::new(0);
		// expires_in == 60 is swallowed whole by the 60 s safety buffer.
		let refresh = || {
			let n = exchanges.fetch_add(1, Ordering::SeqCst);

			async move { Ok(response(if n == 0 { "tok-1" } else { "tok-2" }, 60)) }
		};
		let first = cache.get_or_refresh(refresh).await.expect("First fetch should succeed.");
		let second = cache.get_or_refresh(refresh).await.expect("Second fetch should succeed.");

		assert_eq!(first.access_token.expose(), "tok-1");
		assert_eq!(second.access_token.expose(), "tok-2");
		assert_eq!(exchanges.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_exchange() {
		let cache = TokenCache::new();
		let exchanges = AtomicUsize::new(0);
		let slow_refresh = || {
			exchanges.fetch_add(1, Ordering::SeqCst);

			async {
				tokio::time::sleep(std::time::Duration::from_millis(50)).await;

				Ok(response("tok-1", 120))
			}
		};
		let (first, second, third) = tokio::join!(
			cache.get_or_refresh(slow_refresh),
			cache.get_or_refresh(slow_refresh),
			cache.get_or_refresh(slow_refresh),
		);

		assert_eq!(
			first.expect("First concurrent fetch should succeed.").access_token.expose(),
			"tok-1",
		);
		assert_eq!(
			second.expect("Second concurrent fetch should succeed.").access_token.expose(),
			"tok-1",
		);
		assert_eq!(
			third.expect("Third concurrent fetch should succeed.").access_token.expose(),
			"tok-1",
		);
		assert_eq!(exchanges.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn queued_callers_receive_the_initiators_failure() {
		let cache = TokenCache::new();
		let exchanges = AtomicUsize::new(0);
		let failing = || {
			exchanges.fetch_add(1, Ordering::SeqCst);

			async {
				tokio::time::sleep(std::time::Duration::from_millis(50)).await;

				Err(TransportError::Timeout.into())
			}
		};
		let late_joiner = async {
			tokio::time::sleep(std::time::Duration::from_millis(10)).await;

			cache.get_or_refresh(failing).await
		};
		let (initiator, joiner) = tokio::join!(cache.get_or_refresh(failing), late_joiner);
		let initiator_err =
			initiator.expect_err("Initiator should observe the exchange failure.");
		let joiner_err = joiner.expect_err("Joiner should observe the same failure.");

		assert!(matches!(initiator_err, Error::Transport(TransportError::Timeout)));
		assert!(matches!(joiner_err, Error::Transport(TransportError::Timeout)));
		// The joiner must not have dispatched its own exchange.
		assert_eq!(exchanges.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn failure_leaves_the_slot_empty_and_the_next_call_retries() {
		let cache = TokenCache::new();
		let failed = cache
			.get_or_refresh(|| async { Err(TransportError::Timeout.into()) })
			.await;

		assert!(failed.is_err());
		assert!(cache.current().is_none());

		let recovered = cache
			.get_or_refresh(|| async { Ok(response("tok-2", 120)) })
			.await
			.expect("A fresh call after a failed round should retry and succeed.");

		assert_eq!(recovered.access_token.expose(), "tok-2");
		assert_eq!(cache.metrics().exchanges(), 2);
	}

	#[tokio::test]
	async fn force_refresh_bypasses_a_valid_token() {
		let cache = TokenCache::new();
		let first = cache
			.get_or_refresh(|| async { Ok(response("tok-1", 3600)) })
			.await
			.expect("Initial fetch should succeed.");
		let forced = cache
			.force_refresh(|| async { Ok(response("tok-2", 3600)) })
			.await
			.expect("Forced refresh should succeed.");

		assert_eq!(first.access_token.expose(), "tok-1");
		assert_eq!(forced.access_token.expose(), "tok-2");
		assert_eq!(
			cache
				.current()
				.expect("Slot should hold the forced token.")
				.access_token
				.expose(),
			"tok-2",
		);
	}

	#[tokio::test]
	async fn current_never_blocks_on_an_inflight_refresh() {
		let cache = TokenCache::new();
		let slow_refresh = || async {
			tokio::time::sleep(std::time::Duration::from_millis(50)).await;

			Ok(response("tok-1", 120))
		};
		let snapshot_during_refresh = async {
			tokio::time::sleep(std::time::Duration::from_millis(10)).await;

			cache.current()
		};
		let (fetched, snapshot) =
			tokio::join!(cache.get_or_refresh(slow_refresh), snapshot_during_refresh);

		assert!(fetched.is_ok());
		// The slot was still empty mid-refresh; the read returned instantly anyway.
		assert!(snapshot.is_none());
	}
}

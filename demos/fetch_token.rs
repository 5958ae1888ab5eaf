//! Demonstrates the private_key_jwt client against a mock token endpoint: the first call signs
//! an assertion and performs the exchange, the second is served from the cache, and a forced
//! refresh mints a brand-new token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_assertion_client::{
	client::ReqwestAssertionClient,
	config::{ClientConfig, Scope},
	key::KeySource,
};

const SIGNING_KEY_PEM: &str = include_str!("../tests/fixtures/rsa_signing_key.pem");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token").header("cache-control", "no-cache");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"demo-access","token_type":"Bearer","expires_in":900,"scope":"read"}"#,
			);
		})
		.await;
	let config = ClientConfig::new(
		"demo-client",
		Url::parse(&server.url("/connect/token"))?,
		Scope::new("read")?,
	)?;
	let client = ReqwestAssertionClient::new(config, KeySource::Pem(SIGNING_KEY_PEM.into()));
	let first = client.access_token().await?;
	let second = client.access_token().await?;

	println!("First token:  {}.", first.expose());
	println!("Second token: {} (served from cache).", second.expose());

	let refreshed = client.refresh_token().await?;

	println!("Forced refresh minted: {}.", refreshed.expose());
	println!(
		"Traffic: {} attempts, {} exchanges, {} cache hits.",
		client.metrics().attempts(),
		client.metrics().exchanges(),
		client.metrics().cache_hits(),
	);

	token_mock.assert_calls_async(2).await;

	Ok(())
}

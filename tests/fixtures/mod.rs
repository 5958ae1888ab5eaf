//! Shared fixtures for the integration suite: static RSA keypairs and client builders.

// Each test binary compiles its own copy and uses a different subset.
#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
use url::Url;
// self
use oauth2_assertion_client::{
	client::ReqwestAssertionClient,
	config::{ClientConfig, Scope},
	key::KeySource,
};

/// RSA private key the suite signs assertions with.
pub const SIGNING_KEY_PEM: &str = include_str!("rsa_signing_key.pem");
/// Public half of [`SIGNING_KEY_PEM`].
pub const SIGNING_KEY_PUBLIC_PEM: &str = include_str!("rsa_signing_key.pub.pem");
/// Public half of an unrelated keypair; assertions must NOT validate against it.
pub const OTHER_KEY_PUBLIC_PEM: &str = include_str!("rsa_other_key.pub.pem");

pub const CLIENT_ID: &str = "abc";

/// Builds a config pointing at the mock server's `/token` path.
pub fn config(server: &MockServer) -> ClientConfig {
	ClientConfig::new(
		CLIENT_ID,
		Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."),
		Scope::new("read").expect("Fixture scope should be valid."),
	)
	.expect("Fixture config should build.")
}

/// Builds a reqwest-backed client over the fixture signing key.
pub fn client(server: &MockServer) -> ReqwestAssertionClient {
	ReqwestAssertionClient::new(config(server), KeySource::Pem(SIGNING_KEY_PEM.into()))
}

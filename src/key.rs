//! Private signing key ownership: lazy one-time materialization and the signing operation.

// std
use std::{fs, io, path::PathBuf, sync::OnceLock};
// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	assertion::{AssertionClaims, ClientAssertion},
	error::KeyError,
};

/// Where the PEM-encoded RSA private key comes from.
///
/// The blob must contain exactly one `-----BEGIN ... PRIVATE KEY-----` block; the holder never
/// constructs paths itself.
#[derive(Clone)]
pub enum KeySource {
	/// Read the PEM from a file on first use.
	Path(PathBuf),
	/// Use an in-memory PEM blob.
	Pem(String),
}
impl KeySource {
	fn read(&self) -> Result<String, KeyError> {
		match self {
			Self::Path(path) => fs::read_to_string(path).map_err(|error| match error.kind() {
				io::ErrorKind::NotFound => KeyError::NotFound { path: path.clone() },
				_ => KeyError::Unreadable { message: error.to_string() },
			}),
			Self::Pem(pem) => Ok(pem.clone()),
		}
	}
}
impl Debug for KeySource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
			Self::Pem(_) => f.debug_tuple("Pem").field(&"<redacted>").finish(),
		}
	}
}

/// Owns the decoded RSA signing key for the lifetime of the client.
///
/// The key is parsed from its source at most once and reused for every subsequent signing call;
/// signing is a read-only use of the key material, so a shared holder is safe under concurrent
/// signing. The decoded key drops together with the holder, never outliving it.
pub struct KeyHolder {
	source: KeySource,
	key: OnceLock<Result<EncodingKey, KeyError>>,
}
impl KeyHolder {
	/// Creates a holder that will materialize the key from `source` on first use.
	pub fn new(source: KeySource) -> Self {
		Self { source, key: OnceLock::new() }
	}

	/// Signs the claims into a compact RS256 JWS (`header.payload.signature`, base64url).
	///
	/// Fails with [`KeyError::NotFound`]/[`KeyError::Unreadable`] when the key cannot be
	/// materialized and [`KeyError::Signing`] when the signer itself rejects the key; a
	/// malformed token is never returned.
	pub fn sign(&self, claims: &AssertionClaims) -> Result<ClientAssertion, KeyError> {
		let key = self.signing_key()?;
		let compact = jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, key)
			.map_err(|error| KeyError::Signing { message: error.to_string() })?;

		Ok(ClientAssertion::new(compact))
	}

	fn signing_key(&self) -> Result<&EncodingKey, KeyError> {
		match self.key.get_or_init(|| load_signing_key(&self.source)) {
			Ok(key) => Ok(key),
			Err(error) => Err(error.clone()),
		}
	}
}
impl Debug for KeyHolder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeyHolder")
			.field("source", &self.source)
			.field("loaded", &self.key.get().map(Result::is_ok))
			.finish()
	}
}

fn load_signing_key(source: &KeySource) -> Result<EncodingKey, KeyError> {
	let pem = source.read()?;

	EncodingKey::from_rsa_pem(pem.as_bytes())
		.map_err(|error| KeyError::Unreadable { message: error.to_string() })
}

//! OAuth 2.0 private_key_jwt client—mint RSA-signed client assertions on demand, exchange them
//! for bearer access tokens, and share one validity-checked cached token across concurrent
//! callers without redundant token requests.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod assertion;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod exchange;
pub mod http;
pub mod key;
pub mod obs;
pub mod token;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {base64 as _, color_eyre as _, httpmock as _, tokio as _};

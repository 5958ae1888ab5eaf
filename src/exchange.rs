//! The OAuth 2.0 token exchange: form construction, the single HTTP call, response parsing.

// self
use crate::{
	_prelude::*,
	assertion::ClientAssertion,
	config::ClientConfig,
	error::ExchangeError,
	http::{FormRequest, RawResponse, TokenHttpClient},
	token::TokenResponse,
};

/// Fixed `client_assertion_type` value for JWT-bearer client authentication (RFC 7523).
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const GRANT_TYPE: &str = "client_credentials";
const BODY_PREVIEW_LEN: usize = 256;

/// Performs the token request against the configured endpoint via an injected transport.
///
/// Stateless: the exchanger neither caches tokens nor stamps `obtained_at`—both belong to the
/// cache that drives it.
#[derive(Clone, Debug)]
pub struct TokenExchanger<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
}
impl<C> TokenExchanger<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates an exchanger over the provided transport.
	pub fn new(http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into() }
	}

	/// Exchanges a signed assertion for an access token.
	///
	/// Re-validates the configuration first so values assembled without the constructor (serde,
	/// struct literals) fail fast without any network call. The request carries exactly the
	/// five RFC 7523 form fields; the response is accepted only when it is a 2xx with a
	/// non-empty `access_token`, and rejections surface the HTTP status together with the OAuth
	/// `error`/`error_description` pair when the body provides one.
	pub async fn exchange(
		&self,
		config: &ClientConfig,
		assertion: ClientAssertion,
	) -> Result<TokenResponse> {
		config.validate()?;

		let request = FormRequest {
			url: config.token_endpoint.clone(),
			fields: vec![
				("grant_type", GRANT_TYPE.into()),
				("client_id", config.client_id.clone()),
				("scope", config.scope.as_str().to_owned()),
				("client_assertion", assertion.into_string()),
				("client_assertion_type", CLIENT_ASSERTION_TYPE.into()),
			],
		};
		let response = self.http_client.post_form(&request).await?;

		if response.is_success() {
			parse_token_response(&response)
		} else {
			Err(parse_rejection(&response))
		}
	}
}

fn parse_token_response(response: &RawResponse) -> Result<TokenResponse> {
	let mut deserializer = serde_json::Deserializer::from_str(&response.body);
	let parsed: TokenResponse =
		serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
			ExchangeError::MalformedResponse { status: response.status, message: error.to_string() }
		})?;

	if parsed.access_token.expose().is_empty() {
		return Err(ExchangeError::MalformedResponse {
			status: response.status,
			message: "access_token is empty".into(),
		}
		.into());
	}

	Ok(parsed)
}

fn parse_rejection(response: &RawResponse) -> Error {
	#[derive(Deserialize)]
	struct OAuthErrorBody {
		error: String,
		#[serde(default)]
		error_description: Option<String>,
	}

	match serde_json::from_str::<OAuthErrorBody>(&response.body) {
		Ok(body) => ExchangeError::Rejected {
			status: response.status,
			error: body.error,
			error_description: body.error_description,
		}
		.into(),
		Err(_) => ExchangeError::Http {
			status: response.status,
			body: body_preview(&response.body),
		}
		.into(),
	}
}

fn body_preview(body: &str) -> String {
	match body.char_indices().nth(BODY_PREVIEW_LEN) {
		Some((offset, _)) => format!("{}…", &body[..offset]),
		None => body.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn raw(status: u16, body: &str) -> RawResponse {
		RawResponse { status, body: body.into() }
	}

	#[test]
	fn success_body_parses_into_a_token_response() {
		let parsed = parse_token_response(&raw(
			200,
			r#"{"access_token":"tok-1","token_type":"Bearer","expires_in":120,"scope":"read"}"#,
		))
		.expect("Well-formed success body should parse.");

		assert_eq!(parsed.access_token.expose(), "tok-1");
		assert_eq!(parsed.token_type, "Bearer");
		assert_eq!(parsed.expires_in, 120);
		assert_eq!(parsed.scope.as_deref(), Some("read"));
	}

	#[test]
	fn empty_access_token_is_a_malformed_success() {
		let err = parse_token_response(&raw(200, r#"{"access_token":""}"#))
			.expect_err("Empty access_token must not be accepted.");

		assert!(matches!(
			err,
			Error::Exchange(ExchangeError::MalformedResponse { status: 200, .. })
		));
	}

	#[test]
	fn unparseable_success_body_names_the_json_path() {
		let err = parse_token_response(&raw(200, r#"{"access_token":42}"#))
			.expect_err("Non-string access_token must not be accepted.");

		assert!(err.to_string().contains("access_token"));
	}

	#[test]
	fn oauth_error_bodies_surface_code_and_description() {
		let err = parse_rejection(&raw(
			400,
			r#"{"error":"invalid_client","error_description":"unknown key"}"#,
		));

		assert!(matches!(
			&err,
			Error::Exchange(ExchangeError::Rejected { status: 400, error, .. })
				if error == "invalid_client"
		));
		assert!(err.to_string().contains("unknown key"));
	}

	#[test]
	fn non_schema_error_bodies_fall_back_to_status_and_preview() {
		let err = parse_rejection(&raw(502, "<html>bad gateway</html>"));

		assert!(matches!(
			&err,
			Error::Exchange(ExchangeError::Http { status: 502, body }) if body.contains("bad gateway")
		));
	}

	#[test]
	fn body_preview_truncates_on_char_boundaries() {
		let long = "é".repeat(BODY_PREVIEW_LEN + 10);
		let preview = body_preview(&long);

		assert!(preview.chars().count() <= BODY_PREVIEW_LEN + 1);
		assert!(preview.ends_with('…'));
		assert_eq!(body_preview("short"), "short");
	}
}

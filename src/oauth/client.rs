//! LinkedIn OAuth client
//!
//! Builds the authorization URL and exchanges the returned code for an
//! access token. Holds no state beyond its configuration.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::callback::CALLBACK_PATH;
use crate::config::LinkedInConfig;
use crate::{Error, Result};

/// Scopes requested: sign-in identity plus posting on the member's behalf
pub const SCOPES: &str = "openid profile w_member_social";

const SECONDS_PER_DAY: u64 = 86_400;

/// Redirect URI for a callback server on `port`
pub fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{port}{CALLBACK_PATH}")
}

/// OAuth token response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token
    #[serde(deserialize_with = "secret_string")]
    pub access_token: SecretString,

    /// Lifetime in seconds
    pub expires_in: u64,

    /// Any other fields LinkedIn returned (scope, id_token, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Lifetime rounded to whole days
    pub fn expires_in_days(&self) -> u64 {
        self.expires_in.saturating_add(SECONDS_PER_DAY / 2) / SECONDS_PER_DAY
    }
}

fn secret_string<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// OAuth error body
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth client for the LinkedIn app
pub struct LinkedInClient<'a> {
    http: Client,
    config: &'a LinkedInConfig,
    redirect_uri: String,
}

impl<'a> LinkedInClient<'a> {
    /// Create a client whose redirect URI points at `port`
    #[must_use]
    pub fn new(http: Client, config: &'a LinkedInConfig, port: u16) -> Self {
        Self {
            http,
            config,
            redirect_uri: redirect_uri(port),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.config.oauth_url.trim_end_matches('/'))
    }

    /// Build the URL the user authorizes the app at
    pub fn authorization_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint("authorization"))
            .map_err(|e| Error::Config(format!("Invalid LinkedIn OAuth URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", SCOPES);

        Ok(url)
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let token_url = self.endpoint("accessToken");
        debug!(url = %token_url, "Exchanging authorization code");

        let response = self.http.post(&token_url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, "Token endpoint responded");

        parse_token_response(body)
    }
}

fn parse_token_response(body: String) -> Result<TokenResponse> {
    let Ok(value) = serde_json::from_str::<Value>(&body) else {
        return Err(Error::ResponseParse {
            context: "LinkedIn response",
            body,
        });
    };

    if value.get("error").is_some_and(|e| !e.is_null()) {
        return match serde_json::from_value::<TokenErrorResponse>(value) {
            Ok(err) => Err(Error::ProviderToken {
                error: err.error,
                description: err.error_description.unwrap_or_default(),
            }),
            Err(_) => Err(Error::ResponseParse {
                context: "LinkedIn error response",
                body,
            }),
        };
    }

    serde_json::from_value(value).map_err(|e| Error::ResponseParse {
        context: "LinkedIn token response",
        body: format!("{e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(oauth_url: &str) -> LinkedInConfig {
        LinkedInConfig {
            client_id: "86abc".to_string(),
            client_secret: SecretString::from("shh".to_string()),
            oauth_url: oauth_url.to_string(),
        }
    }

    #[test]
    fn redirect_uri_targets_local_callback() {
        assert_eq!(redirect_uri(3000), "http://localhost:3000/callback");
    }

    #[test]
    fn authorization_url_is_deterministic() {
        let cfg = config("https://www.linkedin.com/oauth/v2");
        let a = LinkedInClient::new(Client::new(), &cfg, 3000)
            .authorization_url()
            .unwrap();
        let b = LinkedInClient::new(Client::new(), &cfg, 3000)
            .authorization_url()
            .unwrap();

        assert_eq!(a.as_str(), b.as_str());
        assert_eq!(
            a.as_str(),
            "https://www.linkedin.com/oauth/v2/authorization?response_type=code&client_id=86abc\
             &redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback\
             &scope=openid+profile+w_member_social"
        );
    }

    #[test]
    fn authorization_url_round_trips_parameters() {
        let cfg = config("https://auth.example.test/oauth/v2/");
        let url = LinkedInClient::new(Client::new(), &cfg, 4567)
            .authorization_url()
            .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/oauth/v2/authorization");
        assert!(pairs.contains(&("client_id".into(), "86abc".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:4567/callback".into()
        )));
        assert!(pairs.contains(&("scope".into(), SCOPES.into())));
        assert!(!url.as_str().contains("shh"));
    }

    #[test]
    fn parses_token_and_keeps_extra_fields() {
        let token = parse_token_response(
            r#"{"access_token":"AQX","expires_in":5183999,"scope":"openid,profile"}"#.to_string(),
        )
        .unwrap();

        assert_eq!(token.access_token.expose_secret(), "AQX");
        assert_eq!(token.expires_in, 5_183_999);
        assert_eq!(token.expires_in_days(), 60);
        assert_eq!(token.extra["scope"], "openid,profile");
    }

    #[test]
    fn huge_expiry_does_not_overflow_day_rounding() {
        let token = parse_token_response(
            r#"{"access_token":"AQX","expires_in":18446744073709551615}"#.to_string(),
        )
        .unwrap();

        assert_eq!(token.expires_in, u64::MAX);
        assert_eq!(token.expires_in_days(), u64::MAX / SECONDS_PER_DAY);
    }

    #[test]
    fn error_body_becomes_provider_token_error() {
        let err = parse_token_response(
            r#"{"error":"invalid_request","error_description":"Unable to retrieve access token"}"#
                .to_string(),
        )
        .unwrap_err();

        match err {
            Error::ProviderToken { error, description } => {
                assert_eq!(error, "invalid_request");
                assert_eq!(description, "Unable to retrieve access token");
            }
            other => panic!("expected ProviderToken, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_a_parse_error_with_raw_body() {
        let err = parse_token_response("<html>502 Bad Gateway</html>".to_string()).unwrap_err();

        match err {
            Error::ResponseParse { body, .. } => assert_eq!(body, "<html>502 Bad Gateway</html>"),
            other => panic!("expected ResponseParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_expiry_is_a_parse_error() {
        let err = parse_token_response(r#"{"access_token":"AQX"}"#.to_string()).unwrap_err();
        assert!(matches!(err, Error::ResponseParse { .. }));
        assert!(!err.to_string().contains("AQX"));
    }
}

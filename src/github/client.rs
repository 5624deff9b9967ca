//! GitHub REST client for Actions secrets

use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SecretScope;
use super::seal;
use crate::config::GitHubConfig;
use crate::{Error, Result};

const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Public key used to encrypt secrets for a scope
#[derive(Debug, Clone, Deserialize)]
pub struct PublicKey {
    /// Key identifier, echoed back on upsert
    pub key_id: String,
    /// Base64-encoded X25519 public key
    pub key: String,
}

/// A value sealed against a specific public key
#[derive(Debug, Clone)]
pub struct SealedSecret {
    /// Base64 sealed-box ciphertext
    pub encrypted_value: String,
    /// Identifier of the key it was sealed with
    pub key_id: String,
}

impl SealedSecret {
    /// Seal `value` against `key`
    pub fn seal(key: &PublicKey, value: &str) -> Result<Self> {
        Ok(Self {
            encrypted_value: seal::seal(&key.key, value.as_bytes())?,
            key_id: key.key_id.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct UpsertSecretRequest<'a> {
    encrypted_value: &'a str,
    key_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<&'static str>,
}

/// Client for the Actions secrets endpoints
pub struct GitHubClient<'a> {
    http: Client,
    config: &'a GitHubConfig,
}

impl<'a> GitHubClient<'a> {
    /// Create a client over a shared HTTP client
    #[must_use]
    pub fn new(http: Client, config: &'a GitHubConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(self.config.token.expose_secret())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Fetch the public key for a scope
    pub async fn public_key(&self, scope: &SecretScope) -> Result<PublicKey> {
        let path = scope.public_key_path();
        debug!(path = %path, "Fetching GitHub public key");

        let response = self.request(reqwest::Method::GET, &path).send().await?;
        let body = error_for_status(response).await?;

        serde_json::from_str(&body).map_err(|_| Error::ResponseParse {
            context: "GitHub public key response",
            body,
        })
    }

    /// Create or update a secret
    pub async fn put_secret(
        &self,
        scope: &SecretScope,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<()> {
        let path = scope.secret_path(name);
        let body = UpsertSecretRequest {
            encrypted_value: &secret.encrypted_value,
            key_id: &secret.key_id,
            visibility: scope.visibility(),
        };
        debug!(path = %path, key_id = %secret.key_id, "Updating GitHub secret");

        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&body)
            .send()
            .await?;
        error_for_status(response).await?;

        Ok(())
    }
}

/// Read the body, turning any status >= 400 into a `StoreApi` error
async fn error_for_status(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if status.as_u16() >= 400 {
        return Err(Error::StoreApi {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

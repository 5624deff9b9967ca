//! GitHub Actions secrets
//!
//! Writes a value into an organization or repository Actions secret:
//! - fetch the scope's public key
//! - seal the value against it (libsodium sealed box)
//! - upsert the encrypted value under the secret name

mod client;
pub mod seal;

use std::fmt;

pub use client::{GitHubClient, PublicKey, SealedSecret};

/// Where an Actions secret is stored
///
/// The scope decides both the API paths and whether a `visibility` field is
/// sent; the two always change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretScope {
    /// Organization secret, visible to all repositories in the org
    Organization {
        /// Organization login
        org: String,
    },
    /// Secret on a single repository
    Repository {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
    },
}

impl SecretScope {
    fn base_path(&self) -> String {
        match self {
            Self::Organization { org } => format!("/orgs/{org}/actions/secrets"),
            Self::Repository { owner, repo } => format!("/repos/{owner}/{repo}/actions/secrets"),
        }
    }

    /// Path of the public key endpoint
    pub fn public_key_path(&self) -> String {
        format!("{}/public-key", self.base_path())
    }

    /// Path of the named secret
    pub fn secret_path(&self, name: &str) -> String {
        format!("{}/{name}", self.base_path())
    }

    /// Visibility sent with an upsert; repository secrets have none
    pub fn visibility(&self) -> Option<&'static str> {
        match self {
            Self::Organization { .. } => Some("all"),
            Self::Repository { .. } => None,
        }
    }
}

impl fmt::Display for SecretScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization { org } => write!(f, "org {org}"),
            Self::Repository { owner, repo } => write!(f, "repo {owner}/{repo}"),
        }
    }
}

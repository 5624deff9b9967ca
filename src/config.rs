//! Configuration management
//!
//! Settings come from the environment (optionally seeded from a `.env`
//! file) or the equivalent command-line flags. [`Config::from_settings`] is
//! the single validation point; everything downstream receives an immutable
//! [`Config`] by reference.

use std::time::Duration;

use clap::Args;
use secrecy::SecretString;

use crate::github::SecretScope;
use crate::{Error, Result};

/// Env var holding the LinkedIn app client ID
pub const ENV_CLIENT_ID: &str = "LINKEDIN_CLIENT_ID";
/// Env var holding the LinkedIn app client secret
pub const ENV_CLIENT_SECRET: &str = "LINKEDIN_CLIENT_SECRET";
/// Env var holding the GitHub token
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Default GitHub organization
pub const DEFAULT_ORG: &str = "CodingWithCalvin";
/// Default secret name
pub const DEFAULT_SECRET_NAME: &str = "LINKEDIN_ACCESS_TOKEN";
/// Default LinkedIn OAuth base URL
pub const DEFAULT_LINKEDIN_OAUTH_URL: &str = "https://www.linkedin.com/oauth/v2";
/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Raw settings, before validation
#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
    /// Your LinkedIn app client ID
    #[arg(long, env = ENV_CLIENT_ID, hide_env_values = true)]
    pub linkedin_client_id: Option<String>,

    /// Your LinkedIn app client secret
    #[arg(long, env = ENV_CLIENT_SECRET, hide_env_values = true)]
    pub linkedin_client_secret: Option<String>,

    /// GitHub PAT with admin:org or repo scope
    #[arg(long, env = ENV_GITHUB_TOKEN, hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub org name (also the owner of --github-repo)
    #[arg(long, env = "GITHUB_ORG")]
    pub github_org: Option<String>,

    /// GitHub repo name; if set, updates a repo secret instead of an org secret
    #[arg(long, env = "GITHUB_REPO")]
    pub github_repo: Option<String>,

    /// Secret name to update
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: Option<String>,

    /// Local callback server port
    #[arg(long, env = "PORT")]
    pub port: Option<String>,

    /// Give up waiting for the browser redirect after this many seconds
    #[arg(long, env = "CALLBACK_TIMEOUT")]
    pub callback_timeout: Option<String>,

    /// LinkedIn OAuth base URL
    #[arg(long, env = "LINKEDIN_OAUTH_URL", hide = true)]
    pub linkedin_oauth_url: Option<String>,

    /// GitHub REST API base URL (GitHub Enterprise, or the Actions runner's GITHUB_API_URL)
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,
}

/// LinkedIn app settings
#[derive(Debug)]
pub struct LinkedInConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Base URL holding the `authorization` and `accessToken` endpoints
    pub oauth_url: String,
}

/// GitHub API settings
#[derive(Debug)]
pub struct GitHubConfig {
    /// Bearer token
    pub token: SecretString,
    /// REST API base URL
    pub api_url: String,
    /// Where the secret lives
    pub scope: SecretScope,
}

/// Validated configuration
#[derive(Debug)]
pub struct Config {
    /// LinkedIn app settings
    pub linkedin: LinkedInConfig,
    /// GitHub API settings
    pub github: GitHubConfig,
    /// Name of the Actions secret to write
    pub secret_name: String,
    /// Callback server port (0 picks an ephemeral port)
    pub port: u16,
    /// Optional bound on the wait for the redirect
    pub callback_timeout: Option<Duration>,
}

impl Config {
    /// Validate raw settings
    ///
    /// Only presence is checked for the credentials. Every missing one is
    /// reported at once, in a stable order.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client_id = non_empty(settings.linkedin_client_id);
        let client_secret = non_empty(settings.linkedin_client_secret);
        let github_token = non_empty(settings.github_token);

        let missing: Vec<&'static str> = [
            (ENV_CLIENT_ID, client_id.is_none()),
            (ENV_CLIENT_SECRET, client_secret.is_none()),
            (ENV_GITHUB_TOKEN, github_token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(client_id), Some(client_secret), Some(github_token)) =
            (client_id, client_secret, github_token)
        else {
            return Err(Error::MissingConfig(missing));
        };

        let port = match non_empty(settings.port) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT must be a port number, got {raw:?}: {e}")))?,
            None => 3000,
        };

        let callback_timeout = match non_empty(settings.callback_timeout) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    Error::Config(format!(
                        "CALLBACK_TIMEOUT must be a number of seconds, got {raw:?}: {e}"
                    ))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let org = non_empty(settings.github_org).unwrap_or_else(|| DEFAULT_ORG.to_string());
        let scope = match non_empty(settings.github_repo) {
            Some(repo) => SecretScope::Repository { owner: org, repo },
            None => SecretScope::Organization { org },
        };

        Ok(Self {
            linkedin: LinkedInConfig {
                client_id,
                client_secret: SecretString::from(client_secret),
                oauth_url: non_empty(settings.linkedin_oauth_url)
                    .unwrap_or_else(|| DEFAULT_LINKEDIN_OAUTH_URL.to_string()),
            },
            github: GitHubConfig {
                token: SecretString::from(github_token),
                api_url: non_empty(settings.github_api_url)
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                scope,
            },
            secret_name: non_empty(settings.secret_name)
                .unwrap_or_else(|| DEFAULT_SECRET_NAME.to_string()),
            port,
            callback_timeout,
        })
    }
}

/// Usage summary printed alongside a missing-configuration error
pub const ENV_HELP: &str = "\
Required environment variables:
  LINKEDIN_CLIENT_ID     - Your LinkedIn app client ID
  LINKEDIN_CLIENT_SECRET - Your LinkedIn app client secret
  GITHUB_TOKEN           - GitHub PAT with admin:org or repo scope

Optional environment variables:
  GITHUB_ORG             - GitHub org name (default: CodingWithCalvin)
  GITHUB_REPO            - GitHub repo name (if set, updates repo secret instead of org)
  SECRET_NAME            - Secret name to update (default: LINKEDIN_ACCESS_TOKEN)
  PORT                   - Local server port (default: 3000)
  CALLBACK_TIMEOUT       - Seconds to wait for the browser redirect (default: wait forever)";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn complete() -> Settings {
        Settings {
            linkedin_client_id: Some("client-id".to_string()),
            linkedin_client_secret: Some("client-secret".to_string()),
            github_token: Some("ghp_token".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_when_optional_values_absent() {
        let config = Config::from_settings(complete()).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.secret_name, "LINKEDIN_ACCESS_TOKEN");
        assert_eq!(
            config.github.scope,
            SecretScope::Organization {
                org: "CodingWithCalvin".to_string()
            }
        );
        assert_eq!(config.linkedin.oauth_url, DEFAULT_LINKEDIN_OAUTH_URL);
        assert_eq!(config.github.api_url, DEFAULT_GITHUB_API_URL);
        assert!(config.callback_timeout.is_none());
        assert_eq!(config.linkedin.client_secret.expose_secret(), "client-secret");
    }

    #[test]
    fn every_subset_of_missing_credentials_is_reported_exactly() {
        for mask in 1u8..8 {
            let mut settings = complete();
            let mut expected = Vec::new();
            if mask & 1 != 0 {
                settings.linkedin_client_id = None;
                expected.push(ENV_CLIENT_ID);
            }
            if mask & 2 != 0 {
                settings.linkedin_client_secret = Some(String::new());
                expected.push(ENV_CLIENT_SECRET);
            }
            if mask & 4 != 0 {
                settings.github_token = None;
                expected.push(ENV_GITHUB_TOKEN);
            }

            match Config::from_settings(settings) {
                Err(Error::MissingConfig(missing)) => assert_eq!(missing, expected),
                other => panic!("mask {mask}: expected MissingConfig, got {other:?}"),
            }
        }
    }

    #[test]
    fn repo_switches_to_repository_scope() {
        let settings = Settings {
            github_org: Some("acme".to_string()),
            github_repo: Some("site".to_string()),
            ..complete()
        };
        let config = Config::from_settings(settings).unwrap();

        assert_eq!(
            config.github.scope,
            SecretScope::Repository {
                owner: "acme".to_string(),
                repo: "site".to_string()
            }
        );
    }

    #[test]
    fn empty_repo_means_organization_scope() {
        let settings = Settings {
            github_repo: Some(String::new()),
            ..complete()
        };
        let config = Config::from_settings(settings).unwrap();

        assert!(matches!(config.github.scope, SecretScope::Organization { .. }));
    }

    #[test]
    fn port_must_be_numeric() {
        let settings = Settings {
            port: Some("http".to_string()),
            ..complete()
        };
        assert!(matches!(
            Config::from_settings(settings),
            Err(Error::Config(_))
        ));

        let settings = Settings {
            port: Some("8123".to_string()),
            ..complete()
        };
        assert_eq!(Config::from_settings(settings).unwrap().port, 8123);
    }

    #[test]
    fn zero_timeout_means_wait_forever() {
        let settings = Settings {
            callback_timeout: Some("0".to_string()),
            ..complete()
        };
        assert!(Config::from_settings(settings).unwrap().callback_timeout.is_none());

        let settings = Settings {
            callback_timeout: Some("90".to_string()),
            ..complete()
        };
        assert_eq!(
            Config::from_settings(settings).unwrap().callback_timeout,
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn timeout_must_be_numeric() {
        let settings = Settings {
            callback_timeout: Some("soon".to_string()),
            ..complete()
        };
        match Config::from_settings(settings) {
            Err(Error::Config(msg)) => assert!(msg.contains("CALLBACK_TIMEOUT")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let config = Config::from_settings(complete()).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("client-secret"));
        assert!(!debug.contains("ghp_token"));
        assert!(debug.contains("client-id"));
    }
}

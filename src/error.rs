//! Error types for the token refresh flow

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for the token refresh flow
pub type Result<T> = std::result::Result<T, Error>;

/// Token refresh errors
///
/// Every variant is fatal to the run. Messages never include the client
/// secret, the GitHub token or the LinkedIn access token.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required environment variables are unset or empty
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    /// A setting is present but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The redirect listener could not bind its port
    #[error("Failed to bind callback server on port {port}: {source}")]
    ListenerBind {
        /// Requested port
        port: u16,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// The redirect listener stopped before producing an outcome
    #[error("Callback server error: {0}")]
    Listener(String),

    /// No redirect arrived within the configured wait
    #[error("Timed out after {}s waiting for the OAuth redirect", .0.as_secs())]
    CallbackTimeout(Duration),

    /// LinkedIn redirected back with an OAuth error
    #[error("LinkedIn OAuth error: {error} - {description}")]
    AuthorizationDenied {
        /// OAuth error code
        error: String,
        /// Human readable description
        description: String,
    },

    /// The token endpoint answered with an OAuth error
    #[error("LinkedIn token error: {error} - {description}")]
    ProviderToken {
        /// OAuth error code
        error: String,
        /// Human readable description
        description: String,
    },

    /// A response body could not be parsed
    #[error("Failed to parse {context}: {body}")]
    ResponseParse {
        /// What was being parsed
        context: &'static str,
        /// Raw response body
        body: String,
    },

    /// The GitHub API answered with a status >= 400
    #[error("GitHub API error ({status}): {body}")]
    StoreApi {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The secret could not be sealed against the repository key
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Short machine-friendly kind, used as a structured log field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingConfig(_) | Self::Config(_) => "config",
            Self::ListenerBind { .. } => "listener_bind",
            Self::Listener(_) | Self::CallbackTimeout(_) => "listener",
            Self::AuthorizationDenied { .. } => "provider_redirect",
            Self::ProviderToken { .. } => "provider_token",
            Self::ResponseParse { .. } => "response_parse",
            Self::StoreApi { .. } => "store_api",
            Self::Encryption(_) => "encryption",
            Self::Http(_) => "http",
        }
    }
}

//! LinkedIn Token Refresh
//!
//! Runs the LinkedIn OAuth 2.0 authorization code flow once and stores the
//! resulting access token as an encrypted GitHub Actions secret.
//!
//! # Flow
//!
//! 1. Bind a local callback server on `http://localhost:<port>/callback`
//! 2. Open the browser at LinkedIn's authorization page
//! 3. Receive the authorization code from the redirect
//! 4. Exchange the code for an access token
//! 5. Seal the token with the org or repo public key and upsert the secret

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod oauth;
pub mod refresh;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` takes precedence over `level`. Logs go to stderr so stdout
/// stays reserved for the operator-facing progress messages.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        Some("text") | None => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        Some(other) => {
            return Err(Error::Config(format!(
                "unknown log format {other:?} (expected text or json)"
            )));
        }
    }

    Ok(())
}

//! Token refresh flow
//!
//! Runs the whole exchange once, strictly in order:
//! bind the callback server, open the browser, wait for the code, exchange
//! it for a token, fetch the GitHub public key, seal the token and upsert the
//! secret. Any failure aborts the run; nothing is retried.

use std::fmt;
use std::io;
use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::github::{GitHubClient, SealedSecret, SecretScope};
use crate::oauth::{CallbackListener, LinkedInClient};
use crate::{Error, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Step of the refresh flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing started yet
    Idle,
    /// Binding the callback server
    Listening,
    /// Browser opened, waiting for LinkedIn's redirect
    AwaitingRedirect,
    /// Trading the code for a token
    ExchangingCode,
    /// Fetching the GitHub public key
    FetchingKey,
    /// Sealing the token
    Encrypting,
    /// Writing the secret
    UpdatingSecret,
    /// Finished
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::AwaitingRedirect => "awaiting-browser-redirect",
            Self::ExchangingCode => "exchanging-code",
            Self::FetchingKey => "fetching-key",
            Self::Encrypting => "encrypting",
            Self::UpdatingSecret => "updating-secret",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Opens the authorization URL for the user
pub trait BrowserLauncher: Send + Sync {
    /// Launch `url`; returning quickly, without waiting for the user
    fn launch(&self, url: &str) -> io::Result<()>;
}

/// Opens the system default browser
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn launch(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

/// Leaves opening the URL to the user
#[derive(Debug, Default)]
pub struct ManualBrowser;

impl BrowserLauncher for ManualBrowser {
    fn launch(&self, _url: &str) -> io::Result<()> {
        Ok(())
    }
}

/// What a successful run changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Secret that was written
    pub secret_name: String,
    /// Where it was written
    pub scope: SecretScope,
    /// Token lifetime in seconds
    pub expires_in: u64,
    /// Token lifetime rounded to days
    pub expires_in_days: u64,
}

/// Tracks the current stage for progress and failure reporting
#[derive(Debug)]
struct Progress {
    stage: Stage,
}

impl Progress {
    fn enter(&mut self, stage: Stage) {
        info!(from = %self.stage, to = %stage, "Stage transition");
        self.stage = stage;
    }
}

/// Run the refresh flow once
pub async fn run(config: &Config, browser: &dyn BrowserLauncher) -> Result<RefreshOutcome> {
    let mut progress = Progress { stage: Stage::Idle };

    match drive(config, browser, &mut progress).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            debug!(stage = %progress.stage, kind = e.kind(), "Token refresh failed");
            Err(e)
        }
    }
}

async fn drive(
    config: &Config,
    browser: &dyn BrowserLauncher,
    progress: &mut Progress,
) -> Result<RefreshOutcome> {
    let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

    progress.enter(Stage::Listening);
    let listener = CallbackListener::bind(config.port).await?;

    let linkedin = LinkedInClient::new(http.clone(), &config.linkedin, listener.port());
    let auth_url = linkedin.authorization_url()?;

    progress.enter(Stage::AwaitingRedirect);
    println!("\nOpening browser for LinkedIn authorization...");
    println!("URL: {auth_url}\n");
    if let Err(e) = browser.launch(auth_url.as_str()) {
        warn!(error = %e, "Failed to open browser automatically; open the URL above manually");
    }

    println!("Waiting for authorization...");
    let code = listener.wait(config.callback_timeout).await?;
    info!("Authorization code received");

    progress.enter(Stage::ExchangingCode);
    let token = linkedin.exchange_code(&code).await?;
    info!(
        expires_in = token.expires_in,
        expires_in_days = token.expires_in_days(),
        "Access token received"
    );

    let github = GitHubClient::new(http, &config.github);
    let scope = &config.github.scope;

    progress.enter(Stage::FetchingKey);
    let key = github.public_key(scope).await?;

    progress.enter(Stage::Encrypting);
    let sealed = SealedSecret::seal(&key, token.access_token.expose_secret())?;

    progress.enter(Stage::UpdatingSecret);
    github.put_secret(scope, &config.secret_name, &sealed).await?;
    info!(secret = %config.secret_name, scope = %scope, "Secret updated");

    progress.enter(Stage::Done);
    Ok(RefreshOutcome {
        secret_name: config.secret_name.clone(),
        scope: scope.clone(),
        expires_in: token.expires_in,
        expires_in_days: token.expires_in_days(),
    })
}

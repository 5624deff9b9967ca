//! OAuth Callback Server
//!
//! A minimal HTTP server that captures the authorization code from
//! LinkedIn's redirect. It resolves exactly once: the first request to
//! `/callback` carrying either `code` or `error` settles the outcome, after
//! which the server shuts down and releases its port.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Path LinkedIn redirects back to
pub const CALLBACK_PATH: &str = "/callback";

/// Upper bound on draining in-flight responses during shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// OAuth callback query parameters
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,

    /// Error code
    pub error: Option<String>,

    /// Error description
    pub error_description: Option<String>,
}

type Outcome = Result<String>;

/// Single-slot completion shared with the handler
#[derive(Clone)]
struct CallbackState {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl CallbackState {
    /// Settle the outcome. Returns false if it was already settled.
    fn resolve(&self, outcome: Outcome) -> bool {
        match self.slot.lock().take() {
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

/// A bound, running callback server
pub struct CallbackListener {
    addr: SocketAddr,
    outcome: oneshot::Receiver<Outcome>,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl CallbackListener {
    /// Bind `127.0.0.1:<port>` and start serving
    ///
    /// Port 0 binds an ephemeral port; see [`Self::port`].
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .map_err(|source| Error::ListenerBind { port, source })?;

        let addr = listener
            .local_addr()
            .map_err(|source| Error::ListenerBind { port, source })?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = CallbackState {
            slot: Arc::new(Mutex::new(Some(outcome_tx))),
        };

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, "Callback server stopped with an error");
            }
        });

        info!(url = %format!("http://localhost:{}{CALLBACK_PATH}", addr.port()), "Local server listening");

        Ok(Self {
            addr,
            outcome: outcome_rx,
            shutdown: Some(shutdown_tx),
            server,
        })
    }

    /// Port actually bound
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the redirect, then shut the server down
    ///
    /// With `timeout` of `None` this waits until a terminal callback arrives.
    /// The port is released before this returns, on every path.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<String> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, &mut self.outcome)
                .await
                .map_err(|_| Error::CallbackTimeout(limit)),
            None => Ok((&mut self.outcome).await),
        };

        self.close().await;

        received?.map_err(|_| Error::Listener("callback channel closed unexpectedly".to_string()))?
    }

    async fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.server)
            .await
            .is_err()
        {
            debug!("Callback server did not drain in time, aborting");
            self.server.abort();
        }
        debug!(addr = %self.addr, "Callback server closed");
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Handle the OAuth callback
async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    debug!(
        has_code = params.code.is_some(),
        error = ?params.error,
        "Received OAuth callback"
    );

    let code = params.code.filter(|c| !c.is_empty());
    let error = params.error.filter(|e| !e.is_empty());

    if let Some(error) = error {
        let description = params.error_description.unwrap_or_default();
        let page = error_page(&error, &description);
        if !state.resolve(Err(Error::AuthorizationDenied { error, description })) {
            return already_completed();
        }
        return (StatusCode::BAD_REQUEST, Html(page)).into_response();
    }

    if let Some(code) = code {
        if !state.resolve(Ok(code)) {
            return already_completed();
        }
        return (StatusCode::OK, Html(SUCCESS_PAGE)).into_response();
    }

    (StatusCode::BAD_REQUEST, Html(MISSING_CODE_PAGE)).into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

fn already_completed() -> Response {
    (StatusCode::GONE, Html(ALREADY_COMPLETED_PAGE)).into_response()
}

const SUCCESS_PAGE: &str = "<html><body><h1>Success!</h1><p>Authorization code received. You can close this window.</p></body></html>";

const MISSING_CODE_PAGE: &str =
    "<html><body><h1>Error</h1><p>No authorization code received.</p></body></html>";

const ALREADY_COMPLETED_PAGE: &str =
    "<html><body><h1>Error</h1><p>Authorization already completed.</p></body></html>";

fn error_page(error: &str, description: &str) -> String {
    format!(
        "<html><body><h1>Error</h1><p>{}: {}</p></body></html>",
        escape_html(error),
        escape_html(description)
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_params_deserialize() {
        let params: CallbackParams = serde_urlencoded::from_str(
            "error=user_cancelled_login&error_description=The+user+cancelled+LinkedIn+login",
        )
        .unwrap();

        assert_eq!(params.code, None);
        assert_eq!(params.error.as_deref(), Some("user_cancelled_login"));
        assert_eq!(
            params.error_description.as_deref(),
            Some("The user cancelled LinkedIn login")
        );
    }

    #[test]
    fn error_page_escapes_markup() {
        let page = error_page("bad<request>", "x & \"y\"");
        assert!(page.contains("bad&lt;request&gt;: x &amp; &quot;y&quot;"));
        assert!(!page.contains("<request>"));
    }

    #[test]
    fn state_resolves_at_most_once() {
        let (tx, mut rx) = oneshot::channel();
        let state = CallbackState {
            slot: Arc::new(Mutex::new(Some(tx))),
        };

        assert!(state.resolve(Ok("first".to_string())));
        assert!(!state.resolve(Ok("second".to_string())));
        assert_eq!(rx.try_recv().unwrap().unwrap(), "first");
    }

    #[tokio::test]
    async fn bind_conflict_fails_immediately() {
        let taken = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        match CallbackListener::bind(port).await {
            Err(Error::ListenerBind { port: p, .. }) => assert_eq!(p, port),
            Err(other) => panic!("expected ListenerBind, got {other:?}"),
            Ok(_) => panic!("expected ListenerBind, got a listener"),
        }
    }

    #[tokio::test]
    async fn wait_times_out_and_releases_port() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.port();

        let err = listener
            .wait(Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CallbackTimeout(_)));

        // The port is free again
        let rebound = CallbackListener::bind(port).await.unwrap();
        assert_eq!(rebound.port(), port);
    }
}

//! LinkedIn OAuth 2.0 authorization code flow
//!
//! - Authorization URL construction
//! - Callback server for auth code reception
//! - Code-for-token exchange

pub mod callback;
mod client;

pub use callback::{CALLBACK_PATH, CallbackListener};
pub use client::{LinkedInClient, SCOPES, TokenResponse, redirect_uri};

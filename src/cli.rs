//! Command-line interface

use clap::Parser;

use crate::config::Settings;

/// Refresh the LinkedIn access token stored in a GitHub Actions secret
///
/// Every option can also be set through the environment variable shown in
/// its help; a `.env` file in the working directory is loaded first.
#[derive(Parser, Debug)]
#[command(name = "linkedin-token-refresh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// LinkedIn and GitHub settings
    #[command(flatten)]
    pub settings: Settings,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,
}

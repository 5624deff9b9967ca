//! LinkedIn Token Refresh - one-shot OAuth flow into a GitHub Actions secret

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};

use linkedin_token_refresh::{
    Error,
    cli::Cli,
    config::{Config, ENV_HELP},
    refresh::{self, BrowserLauncher, ManualBrowser, SystemBrowser},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Loaded before parsing so clap's env fallbacks see the file's values
    let env_file = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match env_file {
        Ok(path) => info!("Loaded env file: {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found (skipped)"),
        Err(e) => eprintln!("Warning: failed to load .env file: {e}"),
    }

    println!("LinkedIn Token Refresh Tool");

    let config = match Config::from_settings(cli.settings) {
        Ok(config) => config,
        Err(Error::MissingConfig(missing)) => {
            eprintln!("Missing required environment variables:");
            for name in missing {
                eprintln!("  - {name}");
            }
            eprintln!("\n{ENV_HELP}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("\nError: {e}");
            return ExitCode::FAILURE;
        }
    };

    let browser: Box<dyn BrowserLauncher> = if cli.no_browser {
        Box::new(ManualBrowser)
    } else {
        Box::new(SystemBrowser)
    };

    match refresh::run(&config, browser.as_ref()).await {
        Ok(outcome) => {
            println!(
                "\nAccess token expires in {} seconds (~{} days)",
                outcome.expires_in, outcome.expires_in_days
            );
            println!(
                "Secret {} updated for {}",
                outcome.secret_name, outcome.scope
            );
            println!("\nDone! Your LinkedIn access token has been refreshed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nError: {e}");
            ExitCode::FAILURE
        }
    }
}

//! Binary crate for the `chatbot` server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Serving the chat endpoint and its web page

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = load_dotenv(None);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatbot=info,chatbot_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let cmd = cli::Cli::parse();
    cmd.run().await
}

/// Load `.env` into the process environment without overriding variables
/// that are already set. `None` searches the working directory and its parents.
/// Returns the file that was read; a missing file is not an error.
fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|()| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chatbot_core::{ChatBot, Config};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use tracing::info;

use crate::http;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "chatbot", version, about = "Weather and calculator chat bot")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the chat page and the `/chat` endpoint.
    Serve {
        /// Overrides `[server] host`.
        #[arg(long)]
        host: Option<String>,

        /// Overrides `[server] port`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer a single message and exit.
    Ask {
        /// The message, e.g. "weather in Paris" or "calc 2 + 2".
        message: String,
    },

    /// Configure the language-model fallback interactively.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port } => {
                let mut config = load_config(self.config.as_deref())?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }

                let bot = ChatBot::from_config(&config)?;
                info!(completion = bot.completion_enabled(), "Chat bot ready");
                http::serve(&config.server, Arc::new(bot)).await
            }
            Command::Ask { message } => {
                let config = load_config(self.config.as_deref())?;
                let bot = ChatBot::from_config(&config)?;
                println!("{}", bot.reply(&message).await);
                Ok(())
            }
            Command::Configure => configure(self.config),
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn configure(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::config_file_path()?,
    };
    // file contents only, environment overrides must not end up on disk
    let mut config = Config::load_file(&path)?;

    let enabled = Confirm::new("Enable the language-model fallback?")
        .with_default(config.completion.enabled)
        .prompt()
        .context("Configuration aborted")?;

    if enabled {
        let api_key = Password::new("API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Configuration aborted")?;

        let model = Text::new("Model:")
            .with_default(&config.completion.model)
            .prompt()
            .context("Configuration aborted")?;

        config.enable_completion(api_key);
        config.completion.model = model;
    } else {
        config.completion.enabled = false;
    }

    config.save_to(&path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

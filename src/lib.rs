pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Currencies,
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Interactive {
        from: Option<String>,
        to: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = providers::rate_provider(&config)?;
    let mut settings = config.converter.settings();

    match command {
        AppCommand::Currencies => cli::currencies::run(provider.as_ref()).await,
        AppCommand::Convert { amount, from, to } => {
            settings.first_currency = from.to_uppercase();
            settings.second_currency = to.to_uppercase();
            cli::convert::run(settings, provider, &amount).await
        }
        AppCommand::Interactive { from, to } => {
            if let Some(from) = from {
                settings.first_currency = from.to_uppercase();
            }
            if let Some(to) = to {
                settings.second_currency = to.to_uppercase();
            }
            cli::interactive::run(settings, provider).await
        }
    }
}

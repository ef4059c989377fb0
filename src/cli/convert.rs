use super::ui;
use crate::core::converter::{Converter, ConverterSettings, ConverterView};
use crate::core::currency::CurrencyRateProvider;
use crate::core::state::{Side, is_negative};
use anyhow::{Result, bail};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Drives a converter through a single edit of the first field and returns
/// the settled view.
pub async fn convert_once(
    settings: ConverterSettings,
    provider: Arc<dyn CurrencyRateProvider>,
    amount: &str,
    timeout: Duration,
) -> Result<ConverterView> {
    if is_negative(amount) {
        bail!("Amount must not be negative: {amount}");
    }

    let first = settings.first_currency.clone();
    let second = settings.second_currency.clone();
    let mut handle = Converter::spawn(
        ConverterSettings {
            first_amount: String::new(),
            ..settings
        },
        provider,
    );

    let loaded = handle.loaded(timeout).await?;
    if !loaded.inputs_enabled {
        let reason = loaded.error.unwrap_or_else(|| "no currencies".to_string());
        bail!("Currency list unavailable: {reason}");
    }
    for code in [&first, &second] {
        if !loaded.currencies.iter().any(|c| &c.short_code == code) {
            bail!("Unknown currency: {code}");
        }
    }

    handle.on_amount_change(Side::First, amount);
    let view = handle.settled(timeout).await?;
    debug!(?view, "Conversion settled");
    handle.shutdown().await;

    if let Some(error) = view.error {
        bail!(error);
    }
    Ok(view)
}

pub async fn run(
    settings: ConverterSettings,
    provider: Arc<dyn CurrencyRateProvider>,
    amount: &str,
) -> Result<()> {
    let spinner = ui::new_spinner("Converting...");
    let result = convert_once(settings, provider, amount, Duration::from_secs(30)).await;
    spinner.finish_and_clear();

    let view = result?;
    println!("{}", ui::render_view(&view));
    Ok(())
}

pub mod caching;
pub mod currency_beacon;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::currency::CurrencyRateProvider;
use anyhow::Result;
use caching::CachingRateProvider;
use currency_beacon::CurrencyBeaconProvider;
use std::sync::Arc;

/// Builds the rate provider stack described by `config`.
pub fn rate_provider(config: &AppConfig) -> Result<Arc<dyn CurrencyRateProvider>> {
    let beacon = CurrencyBeaconProvider::from_config(&config.provider)?;
    let provider: Arc<dyn CurrencyRateProvider> =
        Arc::new(CachingRateProvider::new(beacon, config.cache.policy()));
    Ok(provider)
}

use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use log::info;
use serde::Deserialize;

use crate::DEFAULT_TIMEOUT;

/// Runtime settings. Every provider key is optional; a missing key turns the
/// provider off instead of failing startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub exchange_rate_api_key: Option<String>,
    pub cryptocompare_api_key: Option<String>,
    pub coinmarketcap_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub crypto_panic_key: Option<String>,
    pub teloxide_token: Option<String>,
    pub bot_name: Option<String>,
    pub default_base_currency: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

impl Settings {
    /// Reads an optional `valutabot.{toml,json}` file, then the environment.
    pub fn load() -> Result<Self> {
        let mut source = Config::new();
        source
            .merge(File::with_name("valutabot").required(false))
            .context("Reading settings file")?
            .merge(Environment::new())
            .context("Reading environment")?;
        Self::from_sources(source)
    }

    pub fn from_sources(source: Config) -> Result<Self> {
        source.try_into().context("Parsing settings")
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn default_base_currency(&self) -> String {
        self.default_base_currency
            .as_deref()
            .map(crate::registry::normalize)
            .unwrap_or_else(|| "RUB".to_owned())
    }

    pub fn log_providers(&self) {
        let state = |key: &Option<String>| if configured(key) { "set" } else { "missing" };
        info!("ExchangeRate-API key: {}", state(&self.exchange_rate_api_key));
        info!("CryptoCompare key: {}", state(&self.cryptocompare_api_key));
        info!("CoinMarketCap key: {}", state(&self.coinmarketcap_api_key));
        info!("NewsAPI key: {}", state(&self.news_api_key));
        info!("CryptoPanic key: {}", state(&self.crypto_panic_key));
    }
}

/// Mirrors what the adapters accept: a present, non-empty key.
fn configured(key: &Option<String>) -> bool {
    crate::require_key(key, "").is_ok()
}

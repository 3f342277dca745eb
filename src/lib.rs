pub mod cg;
pub mod cmc;
pub mod cryptocompare;
pub mod exchangerate;
pub mod format;
pub mod news;
pub mod rates;
pub mod registry;
pub mod session;
pub mod settings;
pub mod strategy;

use std::{collections::HashMap, time::Duration};

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub trait NamedAPI {
    fn get_name(&self) -> String;
}

/// Fiat exchange rates, pairwise and "everything from one base".
#[async_trait]
pub trait FiatRateAPI {
    async fn get_pair_rate(&self, base: &str, target: &str) -> Result<f64>;

    async fn get_latest_rates(&self, base: &str) -> Result<HashMap<String, f64>>;
}

/// Spot prices for arbitrary symbol pairs where at least one side is a crypto asset.
#[async_trait]
pub trait SpotPriceAPI {
    async fn get_spot_price(&self, base: &str, target: &str) -> Result<f64>;
}

/// Market listings ordered by capitalization.
#[async_trait]
pub trait ListingAPI {
    async fn get_top_assets(&self, limit: usize) -> Result<Vec<AssetListing>>;
}

pub struct UnsupportedAPI {}

#[async_trait]
impl FiatRateAPI for UnsupportedAPI {
    async fn get_pair_rate(&self, _: &str, _: &str) -> Result<f64> {
        bail!("Unsupported API")
    }

    async fn get_latest_rates(&self, _: &str) -> Result<HashMap<String, f64>> {
        bail!("Unsupported API")
    }
}

#[async_trait]
impl SpotPriceAPI for UnsupportedAPI {
    async fn get_spot_price(&self, _: &str, _: &str) -> Result<f64> {
        bail!("Unsupported API")
    }
}

#[async_trait]
impl ListingAPI for UnsupportedAPI {
    async fn get_top_assets(&self, _: usize) -> Result<Vec<AssetListing>> {
        bail!("Unsupported API")
    }
}

impl NamedAPI for UnsupportedAPI {
    fn get_name(&self) -> String {
        "Unsupported".to_owned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetListing {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
    pub market_cap: f64,
}

/// Reads a wire number leniently: numeric strings are parsed, anything else
/// that is not a finite number becomes `0.0`.
pub(crate) fn number_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// A rate is only usable when it is a positive finite number.
pub(crate) fn positive_rate(value: &Value) -> Option<f64> {
    value.as_f64().filter(|r| r.is_finite() && *r > 0.0)
}

pub(crate) fn require_key<'a>(key: &'a Option<String>, provider: &str) -> Result<&'a str> {
    match key.as_deref() {
        Some(k) if !k.is_empty() => Ok(k),
        _ => bail!("{} is not configured", provider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_or_zero_coerces_junk() {
        assert_eq!(number_or_zero(&json!(12.5)), 12.5);
        assert_eq!(number_or_zero(&json!("3.25")), 3.25);
        assert_eq!(number_or_zero(&json!(null)), 0.0);
        assert_eq!(number_or_zero(&json!(false)), 0.0);
        assert_eq!(number_or_zero(&json!("n/a")), 0.0);
        assert_eq!(number_or_zero(&json!({"x": 1})), 0.0);
    }

    #[test]
    fn positive_rate_rejects_non_positive() {
        assert_eq!(positive_rate(&json!(0.9)), Some(0.9));
        assert_eq!(positive_rate(&json!(0)), None);
        assert_eq!(positive_rate(&json!(-1.0)), None);
        assert_eq!(positive_rate(&json!("1.0")), None);
    }

    #[test]
    fn require_key_rejects_blank() {
        assert!(require_key(&None, "X").is_err());
        assert!(require_key(&Some(String::new()), "X").is_err());
        assert_eq!(require_key(&Some("k".into()), "X").unwrap(), "k");
    }
}

//! Rate aggregation and conversion.
//!
//! Fiat pairs go to the fiat provider, anything involving a crypto asset goes
//! to the spot-price provider, and full tables for a crypto base are derived
//! from its USD price and the USD fiat table.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use log::{error, warn};

use crate::{
    registry::{self, AssetKind},
    FiatRateAPI, NamedAPI, SpotPriceAPI,
};

pub const BRIDGE_CURRENCY: &str = "USD";

pub trait NamedFiatRateAPI: NamedAPI + FiatRateAPI + Send + Sync {}
impl<T: NamedAPI + FiatRateAPI + Send + Sync> NamedFiatRateAPI for T {}

pub trait NamedSpotPriceAPI: NamedAPI + SpotPriceAPI + Send + Sync {}
impl<T: NamedAPI + SpotPriceAPI + Send + Sync> NamedSpotPriceAPI for T {}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub base: String,
    pub target: String,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub amount: f64,
    pub rate: ExchangeRate,
    pub converted: f64,
}

impl ConversionResult {
    pub fn base(&self) -> &str {
        &self.rate.base
    }

    pub fn target(&self) -> &str {
        &self.rate.target
    }
}

/// Rates from one base to every known target. An empty table means the
/// rates are unavailable; a non-empty one always maps the base to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: String,
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn unavailable(base: &str) -> Self {
        Self {
            base: base.to_owned(),
            rates: HashMap::new(),
        }
    }

    /// Drops every entry that is not a positive finite number, then pins the base to 1.0.
    fn from_rates(base: &str, mut rates: HashMap<String, f64>) -> Self {
        rates.retain(|code, rate| {
            let usable = rate.is_finite() && *rate > 0.0;
            if !usable {
                warn!("Dropping unusable {}->{} rate {}", base, code, rate);
            }
            usable
        });
        rates.insert(base.to_owned(), 1.0);
        Self {
            base: base.to_owned(),
            rates,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(&registry::normalize(code)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Registered targets other than the base, highest rate first.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .iter()
            .filter(|(code, _)| *code != self.base && registry::is_known(code))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(b.0)));
        ranked
    }
}

pub struct RateService {
    fiat: Box<dyn NamedFiatRateAPI>,
    spot: Box<dyn NamedSpotPriceAPI>,
}

impl RateService {
    pub fn new(fiat: Box<dyn NamedFiatRateAPI>, spot: Box<dyn NamedSpotPriceAPI>) -> Self {
        Self { fiat, spot }
    }

    pub async fn get_rate(&self, base: &str, target: &str) -> Option<f64> {
        let base = registry::normalize(base);
        let target = registry::normalize(target);
        if base == target {
            return Some(1.0);
        }
        let (source, result) = if registry::is_crypto(&base) || registry::is_crypto(&target) {
            (self.spot.get_name(), self.spot.get_spot_price(&base, &target).await)
        } else {
            (self.fiat.get_name(), self.fiat.get_pair_rate(&base, &target).await)
        };
        match result {
            Ok(rate) if rate.is_finite() && rate > 0.0 => Some(rate),
            Ok(rate) => {
                warn!("{} returned unusable {}/{} rate {}", source, base, target, rate);
                None
            }
            Err(error) => {
                warn!("{}/{} rate unavailable from {}: {:#}", base, target, source, error);
                None
            }
        }
    }

    pub async fn quote(&self, base: &str, target: &str) -> Option<ExchangeRate> {
        let rate = self.get_rate(base, target).await?;
        Some(ExchangeRate {
            base: registry::normalize(base),
            target: registry::normalize(target),
            rate,
            observed_at: Utc::now(),
        })
    }

    pub async fn get_all_rates(&self, base: &str) -> RateTable {
        let base = registry::normalize(base);
        match registry::classify(&base) {
            AssetKind::Fiat => self.fiat_table(&base).await,
            AssetKind::Crypto => self.crypto_table(&base).await,
        }
    }

    async fn fiat_table(&self, base: &str) -> RateTable {
        match self.fiat.get_latest_rates(base).await {
            Ok(rates) => RateTable::from_rates(base, rates),
            Err(error) => {
                warn!("Rate table for {} unavailable from {}: {:#}", base, self.fiat.get_name(), error);
                RateTable::unavailable(base)
            }
        }
    }

    async fn crypto_table(&self, base: &str) -> RateTable {
        let base_to_usd = match self.get_rate(base, BRIDGE_CURRENCY).await {
            Some(rate) => rate,
            None => {
                warn!("Cannot price {} in {}", base, BRIDGE_CURRENCY);
                return RateTable::unavailable(base);
            }
        };
        let usd_table = self.fiat_table(BRIDGE_CURRENCY).await;
        if usd_table.is_empty() {
            return RateTable::unavailable(base);
        }
        Self::bridge(base, base_to_usd, &usd_table)
    }

    /// One unit of `base` buys `(base -> USD) * (USD -> code)` units of `code`.
    fn bridge(base: &str, base_to_usd: f64, usd_table: &RateTable) -> RateTable {
        let rates = usd_table
            .iter()
            .map(|(code, usd_to_code)| {
                let rate = if code == base {
                    1.0
                } else {
                    base_to_usd * usd_to_code
                };
                (code.to_owned(), rate)
            })
            .collect();
        RateTable::from_rates(base, rates)
    }

    pub async fn convert(&self, amount: f64, base: &str, target: &str) -> Option<f64> {
        self.conversion(amount, base, target)
            .await
            .map(|result| result.converted)
    }

    pub async fn conversion(&self, amount: f64, base: &str, target: &str) -> Option<ConversionResult> {
        if !amount.is_finite() || amount <= 0.0 {
            error!("convert called with invalid amount {}", amount);
            return None;
        }
        let rate = self.quote(base, target).await?;
        Some(ConversionResult {
            amount,
            converted: amount * rate.rate,
            rate,
        })
    }
}

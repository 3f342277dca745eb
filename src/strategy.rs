use crate::{AssetListing, ListingAPI, NamedAPI};
use anyhow::{bail, Result};
use log::{info, warn};

pub trait NamedListingAPI: NamedAPI + ListingAPI + Send + Sync {}
impl<T: NamedAPI + ListingAPI + Send + Sync> NamedListingAPI for T {}

/// Where a listing came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingSource {
    /// The first provider in priority order answered.
    Primary { provider: String },
    /// A lower-priority provider answered after the ones in `failed` did not.
    Fallback { provider: String, failed: Vec<String> },
    /// Every provider failed; the assets are the built-in sample dataset.
    Static { failed: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopAssets {
    pub assets: Vec<AssetListing>,
    pub source: ListingSource,
}

impl TopAssets {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ListingSource::Static { .. })
    }

    pub fn provider_name(&self) -> &str {
        match &self.source {
            ListingSource::Primary { provider } | ListingSource::Fallback { provider, .. } => {
                provider
            }
            ListingSource::Static { .. } => "offline sample data",
        }
    }
}

pub struct FallbackListingStrategy {
    apis: Vec<Box<dyn NamedListingAPI>>,
}

impl FallbackListingStrategy {
    pub fn new(apis: Vec<Box<dyn NamedListingAPI>>) -> Self {
        Self { apis }
    }

    /// Tries each provider in order and returns the first non-empty answer as is.
    pub async fn get_top_assets(&self, limit: usize) -> TopAssets {
        let mut failed = Vec::new();
        for (i, api) in self.apis.iter().enumerate() {
            let name = api.get_name();
            match non_empty(api.get_top_assets(limit).await) {
                Ok(assets) => {
                    info!("Top {} assets served by {}", assets.len(), name);
                    let source = if i == 0 {
                        ListingSource::Primary { provider: name }
                    } else {
                        ListingSource::Fallback {
                            provider: name,
                            failed,
                        }
                    };
                    return TopAssets { assets, source };
                }
                Err(error) => {
                    warn!("Listing provider {} failed: {:#}", name, error);
                    failed.push(name);
                }
            }
        }
        warn!("All listing providers failed, serving static dataset");
        TopAssets {
            assets: static_listings(limit),
            source: ListingSource::Static { failed },
        }
    }
}

fn non_empty(result: Result<Vec<AssetListing>>) -> Result<Vec<AssetListing>> {
    match result {
        Ok(assets) if assets.is_empty() => bail!("empty listing"),
        other => other,
    }
}

const STATIC_LISTINGS: [(&str, &str, f64, f64); 10] = [
    ("BTC", "Bitcoin", 68000.00, 2.5),
    ("ETH", "Ethereum", 3500.00, 1.8),
    ("BNB", "BNB", 580.00, 0.5),
    ("XRP", "Ripple", 0.62, -0.3),
    ("SOL", "Solana", 185.00, 5.2),
    ("ADA", "Cardano", 0.68, 1.2),
    ("DOGE", "Dogecoin", 0.15, 3.1),
    ("DOT", "Polkadot", 9.50, -1.2),
    ("MATIC", "Polygon", 1.05, 2.3),
    ("SHIB", "Shiba Inu", 0.000028, 15.7),
];

pub fn static_listings(limit: usize) -> Vec<AssetListing> {
    STATIC_LISTINGS
        .iter()
        .take(limit)
        .map(|&(symbol, name, price, change_24h)| AssetListing {
            symbol: symbol.to_owned(),
            name: name.to_owned(),
            price,
            change_24h,
            market_cap: 0.0,
        })
        .collect()
}

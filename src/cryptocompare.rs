use std::time::Duration;

use crate::{number_or_zero, positive_rate, require_key, AssetListing, ListingAPI, NamedAPI, SpotPriceAPI};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

const BASE_URL: &str = "https://min-api.cryptocompare.com";

pub struct CryptoCompareAPI {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CryptoCompareAPI {
    pub fn build(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, timeout, BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, timeout: Duration, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl NamedAPI for CryptoCompareAPI {
    fn get_name(&self) -> String {
        "CryptoCompare".to_owned()
    }
}

#[async_trait]
impl SpotPriceAPI for CryptoCompareAPI {
    async fn get_spot_price(&self, base: &str, target: &str) -> Result<f64> {
        // Key is optional for spot prices; an empty value is sent when absent.
        let api_key = self.api_key.as_deref().unwrap_or("");
        let res = self
            .client
            .get(format!("{}/data/price", self.base_url))
            .query(&[("fsym", base), ("tsyms", target), ("api_key", api_key)])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .with_context(|| format!("Fetching {}/{} spot price", base, target))?;
        let res: Value = res.json().await?;
        debug!("CryptoCompare response {:?}", res);
        positive_rate(&res[target]).ok_or(anyhow!("Can't parse CryptoCompare price for {}/{}", base, target))
    }
}

#[async_trait]
impl ListingAPI for CryptoCompareAPI {
    async fn get_top_assets(&self, limit: usize) -> Result<Vec<AssetListing>> {
        let api_key = require_key(&self.api_key, "CryptoCompare")?;
        let res = self
            .client
            .get(format!("{}/data/top/mktcapfull", self.base_url))
            .query(&[
                ("limit", limit.to_string().as_str()),
                ("tsym", "USD"),
                ("api_key", api_key),
            ])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .context("Fetching CryptoCompare top list")?;
        let res: Value = res.json().await?;
        let data = res["Data"]
            .as_array()
            .ok_or(anyhow!("Can't parse CryptoCompare top list"))?;
        let listings: Vec<AssetListing> = data
            .iter()
            .take(limit)
            .map(|coin| {
                let info = &coin["CoinInfo"];
                let raw = &coin["RAW"]["USD"];
                AssetListing {
                    symbol: info["Name"].as_str().unwrap_or_default().to_uppercase(),
                    name: info["FullName"].as_str().unwrap_or_default().to_owned(),
                    price: number_or_zero(&raw["PRICE"]),
                    change_24h: number_or_zero(&raw["CHANGEPCT24HOUR"]),
                    market_cap: number_or_zero(&raw["MKTCAP"]),
                }
            })
            .collect();
        info!("CryptoCompare returned {} listings", listings.len());
        Ok(listings)
    }
}

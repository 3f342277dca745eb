use std::time::Duration;

use crate::{number_or_zero, require_key, AssetListing, ListingAPI, NamedAPI};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::Value;

const BASE_URL: &str = "https://pro-api.coinmarketcap.com";

pub struct CoinMarketCapAPI {
    client: Client,
    configured: bool,
    base_url: String,
}

impl CoinMarketCapAPI {
    pub fn with_token(token: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(token, timeout, BASE_URL)
    }

    pub fn with_base_url(token: Option<String>, timeout: Duration, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let configured = match require_key(&token, "CoinMarketCap") {
            Ok(token) => {
                let mut token_value = HeaderValue::from_str(token)?;
                token_value.set_sensitive(true);
                headers.insert("X-CMC_PRO_API_KEY", token_value);
                true
            }
            Err(_) => false,
        };
        headers.insert("Accepts", HeaderValue::from_static("application/json"));
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
            configured,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl NamedAPI for CoinMarketCapAPI {
    fn get_name(&self) -> String {
        "CoinMarketCap".to_owned()
    }
}

#[async_trait]
impl ListingAPI for CoinMarketCapAPI {
    async fn get_top_assets(&self, limit: usize) -> Result<Vec<AssetListing>> {
        if !self.configured {
            return Err(anyhow!("CoinMarketCap is not configured"));
        }
        let builder = self
            .client
            .get(format!("{}/v1/cryptocurrency/listings/latest", self.base_url));
        let res = builder
            .query(&[
                ("start", "1"),
                ("limit", limit.to_string().as_str()),
                ("convert", "USD"),
            ])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .context("Fetching CoinMarketCap listings")?;
        let res: Value = res.json().await?;
        debug!("CMC response {:?}", res);
        let data = res["data"]
            .as_array()
            .ok_or(anyhow!("Can't parse CoinMarketCap response"))?;
        let listings: Vec<AssetListing> = data
            .iter()
            .take(limit)
            .map(|entry| {
                let quote = &entry["quote"]["USD"];
                AssetListing {
                    symbol: entry["symbol"].as_str().unwrap_or_default().to_uppercase(),
                    name: entry["name"].as_str().unwrap_or_default().to_owned(),
                    price: number_or_zero(&quote["price"]),
                    change_24h: number_or_zero(&quote["percent_change_24h"]),
                    market_cap: number_or_zero(&quote["market_cap"]),
                }
            })
            .collect();
        info!("CMC returned {} listings", listings.len());
        Ok(listings)
    }
}

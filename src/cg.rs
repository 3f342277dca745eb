use std::time::Duration;

use crate::{number_or_zero, AssetListing, ListingAPI, NamedAPI};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use serde_json::Value;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub struct CoinGeckoAPI {
    client: Client,
    base_url: String,
}

impl CoinGeckoAPI {
    pub fn build(timeout: Duration) -> Result<Self> {
        Self::with_base_url(timeout, BASE_URL)
    }

    pub fn with_base_url(timeout: Duration, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

/*
[
  {
    "id": "bitcoin",
    "symbol": "btc",
    "name": "Bitcoin",
    "current_price": 67187.12,
    "market_cap": 1323478711352,
    "price_change_percentage_24h": 1.93381,
    ...
  },
*/
fn parse_market(coin: &Value) -> AssetListing {
    let change = number_or_zero(&coin["price_change_percentage_24h"]);
    AssetListing {
        symbol: coin["symbol"].as_str().unwrap_or_default().to_uppercase(),
        name: coin["name"].as_str().unwrap_or_default().to_owned(),
        price: number_or_zero(&coin["current_price"]),
        change_24h: (change * 100.0).round() / 100.0,
        market_cap: number_or_zero(&coin["market_cap"]),
    }
}

#[async_trait]
impl ListingAPI for CoinGeckoAPI {
    async fn get_top_assets(&self, limit: usize) -> Result<Vec<AssetListing>> {
        let builder = self.client.get(format!("{}/coins/markets", self.base_url));
        let res = builder
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", limit.to_string().as_str()),
                ("page", "1"),
                ("sparkline", "false"),
                ("price_change_percentage", "24h"),
            ])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .context("Fetching CoinGecko markets")?;
        let res: Value = res.json().await?;
        debug!("CoinGecko response {:?}", res);
        let coins = res
            .as_array()
            .ok_or(anyhow!("Cannot parse CoinGecko response"))?;
        let listings: Vec<AssetListing> = coins.iter().take(limit).map(parse_market).collect();
        info!("CoinGecko returned {} listings", listings.len());
        Ok(listings)
    }
}

impl NamedAPI for CoinGeckoAPI {
    fn get_name(&self) -> String {
        "CoinGecko".to_owned()
    }
}

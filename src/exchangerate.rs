use std::{collections::HashMap, time::Duration};

use crate::{positive_rate, require_key, FiatRateAPI, NamedAPI};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

const BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

pub struct ExchangeRateAPI {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ExchangeRateAPI {
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

    async fn call(&self, path: &str) -> Result<Value> {
        let key = require_key(&self.api_key, "ExchangeRate-API")?;
        let res = self
            .client
            .get(format!("{}/{}/{}", self.base_url, key, path))
            .send()
            .await?
            .error_for_status()?;
        let res: Value = res.json().await?;
        debug!("ExchangeRate-API response {:?}", res);
        if res["result"].as_str() != Some("success") {
            bail!(
                "ExchangeRate-API error: {}",
                res["error-type"].as_str().unwrap_or("unknown error")
            );
        }
        Ok(res)
    }
}

impl NamedAPI for ExchangeRateAPI {
    fn get_name(&self) -> String {
        "ExchangeRate-API".to_owned()
    }
}

#[async_trait]
impl FiatRateAPI for ExchangeRateAPI {
    async fn get_pair_rate(&self, base: &str, target: &str) -> Result<f64> {
        let res = self
            .call(&format!("pair/{}/{}", base, target))
            .await
            .with_context(|| format!("Fetching {}/{} pair", base, target))?;
        positive_rate(&res["conversion_rate"]).ok_or(anyhow!("Can't parse ExchangeRate-API pair response"))
    }

    async fn get_latest_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let res = self
            .call(&format!("latest/{}", base))
            .await
            .with_context(|| format!("Fetching latest rates from {}", base))?;
        let rates = res["conversion_rates"]
            .as_object()
            .ok_or(anyhow!("Can't parse ExchangeRate-API latest response"))?;
        let mut result = HashMap::with_capacity(rates.len());
        for (code, value) in rates {
            match positive_rate(value) {
                Some(rate) => {
                    result.insert(code.to_uppercase(), rate);
                }
                None => warn!("Dropping unusable {}->{} rate {:?}", base, code, value),
            }
        }
        Ok(result)
    }
}

#![allow(dead_code)]

use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use valutabot::{FiatRateAPI, NamedAPI, SpotPriceAPI};
use warp::{http::StatusCode, path::FullPath, Filter};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const TIMEOUT: Duration = Duration::from_secs(5);

struct Route {
    status: u16,
    body: String,
    delay: Duration,
}

/// Canned HTTP upstream keyed by request path; query strings are ignored.
#[derive(Default)]
pub struct MockUpstream {
    routes: HashMap<String, Route>,
}

pub struct RunningUpstream {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl RunningUpstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, path: &str, body: Value) -> Self {
        self.raw(path, 200, &body.to_string())
    }

    pub fn status(self, path: &str, status: u16) -> Self {
        self.raw(path, status, r#"{"error": "upstream says no"}"#)
    }

    pub fn raw(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            path.to_owned(),
            Route {
                status,
                body: body.to_owned(),
                delay: Duration::from_millis(0),
            },
        );
        self
    }

    pub fn slow(mut self, path: &str, body: Value, delay: Duration) -> Self {
        self.routes.insert(
            path.to_owned(),
            Route {
                status: 200,
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    pub fn start(self) -> RunningUpstream {
        let routes = Arc::new(self.routes);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let filter = warp::path::full().and_then(move |path: FullPath| {
            let routes = routes.clone();
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let (status, body, delay) = match routes.get(path.as_str()) {
                    Some(route) => (route.status, route.body.clone(), route.delay),
                    None => (404, r#"{"error": "no route"}"#.to_owned(), Duration::from_millis(0)),
                };
                tokio::time::sleep(delay).await;
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Ok::<_, Infallible>(warp::reply::with_status(
                    warp::reply::with_header(body, "content-type", "application/json"),
                    status,
                ))
            }
        });
        let (addr, server) = warp::serve(filter).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        RunningUpstream {
            url: format!("http://{}", addr),
            hits,
        }
    }
}

/// In-memory fiat provider.
#[derive(Default)]
pub struct FakeFiat {
    pub pairs: HashMap<(String, String), f64>,
    pub tables: HashMap<String, HashMap<String, f64>>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeFiat {
    pub fn with_pair(mut self, base: &str, target: &str, rate: f64) -> Self {
        self.pairs.insert((base.to_owned(), target.to_owned()), rate);
        self
    }

    pub fn with_table(mut self, base: &str, rates: &[(&str, f64)]) -> Self {
        self.tables.insert(
            base.to_owned(),
            rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
        );
        self
    }
}

impl NamedAPI for FakeFiat {
    fn get_name(&self) -> String {
        "FakeFiat".to_owned()
    }
}

#[async_trait]
impl FiatRateAPI for FakeFiat {
    async fn get_pair_rate(&self, base: &str, target: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pairs
            .get(&(base.to_owned(), target.to_owned()))
            .copied()
            .ok_or(anyhow!("unsupported-code"))
    }

    async fn get_latest_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables.get(base).cloned().ok_or(anyhow!("unsupported-code"))
    }
}

/// In-memory crypto spot-price provider.
#[derive(Default)]
pub struct FakeSpot {
    pub prices: HashMap<(String, String), f64>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSpot {
    pub fn with_price(mut self, base: &str, target: &str, price: f64) -> Self {
        self.prices.insert((base.to_owned(), target.to_owned()), price);
        self
    }
}

impl NamedAPI for FakeSpot {
    fn get_name(&self) -> String {
        "FakeSpot".to_owned()
    }
}

#[async_trait]
impl SpotPriceAPI for FakeSpot {
    async fn get_spot_price(&self, base: &str, target: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .get(&(base.to_owned(), target.to_owned()))
            .copied()
            .ok_or(anyhow!("no market for {}/{}", base, target))
    }
}

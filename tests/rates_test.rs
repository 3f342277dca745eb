mod common;

use std::sync::atomic::Ordering;

use common::{init_logging, FakeFiat, FakeSpot};
use valutabot::{rates::RateService, UnsupportedAPI};

fn usd_fiat() -> FakeFiat {
    FakeFiat::default()
        .with_pair("USD", "EUR", 0.9)
        .with_table("USD", &[("USD", 1.0), ("EUR", 0.9)])
        .with_table("EUR", &[("USD", 1.11), ("RUB", 100.0)])
}

#[tokio::test]
async fn fiat_pair_and_conversion() {
    init_logging();
    let service = RateService::new(Box::new(usd_fiat()), Box::new(FakeSpot::default()));
    let rate = service.get_rate("USD", "EUR").await.unwrap();
    assert_eq!(rate, 0.9);
    assert_eq!(service.convert(100.0, "USD", "EUR").await, Some(100.0 * rate));
    assert_eq!(service.convert(100.0, "usd", "eur").await, Some(100.0 * rate));
}

#[tokio::test]
async fn crypto_table_is_bridged_through_usd() {
    init_logging();
    let spot = FakeSpot::default().with_price("BTC", "USD", 65000.0);
    let service = RateService::new(Box::new(usd_fiat()), Box::new(spot));
    let table = service.get_all_rates("BTC").await;
    let mut rates: Vec<(String, f64)> = table.iter().map(|(c, r)| (c.to_owned(), r)).collect();
    rates.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        rates,
        vec![
            ("BTC".to_owned(), 1.0),
            ("EUR".to_owned(), 58500.0),
            ("USD".to_owned(), 65000.0)
        ]
    );
}

#[tokio::test]
async fn crypto_cross_rate_matches_product_for_every_fiat() {
    let fiat = FakeFiat::default().with_table(
        "USD",
        &[("USD", 1.0), ("EUR", 0.92), ("RUB", 92.37), ("JPY", 151.2), ("GBP", 0.79)],
    );
    let spot = FakeSpot::default().with_price("ETH", "USD", 3123.45);
    let service = RateService::new(Box::new(fiat), Box::new(spot));
    let table = service.get_all_rates("eth").await;
    assert_eq!(table.base(), "ETH");
    for (code, usd_rate) in &[("EUR", 0.92), ("RUB", 92.37), ("JPY", 151.2), ("GBP", 0.79)] {
        let derived = table.get(code).unwrap();
        assert!((derived - 3123.45 * usd_rate).abs() < 1e-9, "{}", code);
    }
    assert_eq!(table.get("ETH"), Some(1.0));
}

#[tokio::test]
async fn identity_entry_is_injected_for_fiat_tables() {
    let service = RateService::new(Box::new(usd_fiat()), Box::new(FakeSpot::default()));
    let table = service.get_all_rates("EUR").await;
    assert_eq!(table.get("EUR"), Some(1.0));
    assert_eq!(table.get("RUB"), Some(100.0));
    assert_eq!(table.len(), 3);
}

#[tokio::test]
async fn crypto_table_fails_without_usd_price() {
    init_logging();
    let service = RateService::new(Box::new(usd_fiat()), Box::new(FakeSpot::default()));
    assert!(service.get_all_rates("BTC").await.is_empty());
}

#[tokio::test]
async fn crypto_table_fails_without_usd_table() {
    let fiat = FakeFiat::default();
    let spot = FakeSpot::default().with_price("BTC", "USD", 65000.0);
    let service = RateService::new(Box::new(fiat), Box::new(spot));
    assert!(service.get_all_rates("BTC").await.is_empty());
}

#[tokio::test]
async fn unknown_code_goes_to_fiat_and_comes_back_empty() {
    init_logging();
    let fiat = usd_fiat();
    let fiat_calls = fiat.calls.clone();
    let spot = FakeSpot::default();
    let spot_calls = spot.calls.clone();
    let service = RateService::new(Box::new(fiat), Box::new(spot));
    assert_eq!(service.get_rate("XYZ", "USD").await, None);
    assert_eq!(service.convert(10.0, "XYZ", "USD").await, None);
    assert_eq!(fiat_calls.load(Ordering::SeqCst), 2);
    assert_eq!(spot_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pairs_with_a_crypto_side_use_spot_prices() {
    let fiat = usd_fiat();
    let fiat_calls = fiat.calls.clone();
    let spot = FakeSpot::default()
        .with_price("RUB", "BTC", 0.00000017)
        .with_price("ETH", "BTC", 0.05);
    let service = RateService::new(Box::new(fiat), Box::new(spot));
    assert_eq!(service.get_rate("RUB", "BTC").await, Some(0.00000017));
    assert_eq!(service.get_rate("ETH", "BTC").await, Some(0.05));
    assert_eq!(service.convert(2.0, "ETH", "BTC").await, Some(0.1));
    assert_eq!(fiat_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn same_asset_needs_no_provider() {
    let service = RateService::new(Box::new(UnsupportedAPI {}), Box::new(UnsupportedAPI {}));
    assert_eq!(service.get_rate("BTC", "btc").await, Some(1.0));
    assert_eq!(service.convert(3.5, "EUR", "EUR").await, Some(3.5));
}

#[tokio::test]
async fn unusable_provider_values_are_unavailable() {
    let fiat = FakeFiat::default().with_pair("USD", "EUR", 0.0);
    let service = RateService::new(Box::new(fiat), Box::new(FakeSpot::default()));
    assert_eq!(service.get_rate("USD", "EUR").await, None);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let service = RateService::new(Box::new(usd_fiat()), Box::new(FakeSpot::default()));
    assert_eq!(service.convert(0.0, "USD", "EUR").await, None);
    assert_eq!(service.convert(-5.0, "USD", "EUR").await, None);
    assert_eq!(service.convert(f64::NAN, "USD", "EUR").await, None);
}

#[tokio::test]
async fn conversion_carries_the_quote() {
    let service = RateService::new(Box::new(usd_fiat()), Box::new(FakeSpot::default()));
    let result = service.conversion(250.0, "usd", "eur").await.unwrap();
    assert_eq!(result.base(), "USD");
    assert_eq!(result.target(), "EUR");
    assert_eq!(result.rate.rate, 0.9);
    assert_eq!(result.converted, 225.0);
}

#[tokio::test]
async fn fiat_table_drops_unusable_provider_rates() {
    init_logging();
    let fiat = FakeFiat::default().with_table(
        "USD",
        &[("EUR", 0.0), ("RUB", -3.0), ("JPY", f64::NAN), ("GBP", 0.79)],
    );
    let service = RateService::new(Box::new(fiat), Box::new(FakeSpot::default()));
    let table = service.get_all_rates("USD").await;
    assert_eq!(table.get("EUR"), None);
    assert_eq!(table.get("RUB"), None);
    assert_eq!(table.get("JPY"), None);
    assert_eq!(table.get("GBP"), Some(0.79));
    assert_eq!(table.get("USD"), Some(1.0));
    assert!(table.iter().all(|(_, rate)| rate.is_finite() && rate > 0.0));
}

#[tokio::test]
async fn crypto_table_never_carries_unusable_usd_rates() {
    let fiat = FakeFiat::default().with_table("USD", &[("EUR", 0.9), ("RUB", f64::NAN), ("JPY", -1.0)]);
    let spot = FakeSpot::default().with_price("BTC", "USD", 65000.0);
    let service = RateService::new(Box::new(fiat), Box::new(spot));
    let table = service.get_all_rates("BTC").await;
    assert_eq!(table.get("EUR"), Some(65000.0 * 0.9));
    assert_eq!(table.get("RUB"), None);
    assert_eq!(table.get("JPY"), None);
    assert_eq!(table.len(), 3);
}

#[tokio::test]
async fn crypto_table_fails_on_non_positive_usd_price() {
    init_logging();
    for price in &[0.0, -65000.0, f64::NAN] {
        let fiat = usd_fiat();
        let fiat_calls = fiat.calls.clone();
        let spot = FakeSpot::default().with_price("BTC", "USD", *price);
        let service = RateService::new(Box::new(fiat), Box::new(spot));
        assert!(service.get_all_rates("BTC").await.is_empty(), "price {}", price);
        assert_eq!(fiat_calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn ranked_rates_exclude_the_base() {
    let fiat = FakeFiat::default().with_table(
        "EUR",
        &[("USD", 1.08), ("JPY", 163.0), ("GBP", 0.85), ("EUR", 1.0)],
    );
    let service = RateService::new(Box::new(fiat), Box::new(FakeSpot::default()));
    let table = service.get_all_rates("EUR").await;
    assert_eq!(table.ranked(), vec![("JPY", 163.0), ("USD", 1.08), ("GBP", 0.85)]);
}

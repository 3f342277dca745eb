use anyhow::{Context, Result};
use chrono::Local;
use itertools::Itertools;
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommand};
use valutabot::{
    cg::CoinGeckoAPI,
    cmc::CoinMarketCapAPI,
    cryptocompare::CryptoCompareAPI,
    exchangerate::ExchangeRateAPI,
    format::{format_amount, format_change, format_price, format_rate},
    news::{format_news, CryptoPanicAPI, NewsApiOrg, NewsCategory, NewsService},
    rates::RateService,
    registry::{self, AssetKind},
    session::SessionStore,
    settings::Settings,
    strategy::FallbackListingStrategy,
};

const TOP_LIMIT: usize = 10;
const NEWS_LIMIT: usize = 10;
const RATES_SHOWN: usize = 10;
const HISTORY_SHOWN: usize = 10;
const EXTREMES_SHOWN: usize = 5;
const DETAIL_CURRENCIES: [&str; 5] = ["USD", "EUR", "RUB", "GBP", "JPY"];
const RETRY_HINT: &str = "Sorry, the rates service is unavailable right now. Please try again in a minute.";

#[derive(BotCommand)]
#[command(rename = "lowercase", description = "ValutaBot commands:")]
enum Command {
    #[command(description = "display this text.")]
    Help,
    #[command(description = "show your base currency and the main commands.")]
    Start,
    #[command(description = "show rates of popular currencies in your base currency.")]
    Rates,
    #[command(description = "convert an amount, e.g. /convert 100 USD EUR.", parse_with = "split")]
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    #[command(description = "set your base currency, e.g. /base EUR.")]
    Base(String),
    #[command(description = "top 10 crypto assets by market cap.")]
    Top,
    #[command(description = "rates of one crypto asset, e.g. /crypto BTC.")]
    Crypto(String),
    #[command(description = "news: latest, us, crypto, economy, banking, ru, ru-finance.")]
    News(String),
    #[command(description = "your recent conversions.")]
    History,
    #[command(description = "list all supported currencies.")]
    Currencies,
    #[command(description = "strongest and weakest currencies against your base.")]
    TopRates,
}

struct Services {
    rates: RateService,
    listings: FallbackListingStrategy,
    news: NewsService,
    sessions: SessionStore,
}

impl Services {
    fn build(settings: &Settings) -> Result<Self> {
        let timeout = settings.http_timeout();
        let fiat = ExchangeRateAPI::build(settings.exchange_rate_api_key.clone(), timeout)?;
        let spot = CryptoCompareAPI::build(settings.cryptocompare_api_key.clone(), timeout)?;
        Ok(Self {
            rates: RateService::new(Box::new(fiat), Box::new(spot)),
            listings: FallbackListingStrategy::new(vec![
                Box::new(CoinGeckoAPI::build(timeout)?),
                Box::new(CoinMarketCapAPI::with_token(
                    settings.coinmarketcap_api_key.clone(),
                    timeout,
                )?),
                Box::new(CryptoCompareAPI::build(
                    settings.cryptocompare_api_key.clone(),
                    timeout,
                )?),
            ]),
            news: NewsService::new(
                NewsApiOrg::build(settings.news_api_key.clone(), timeout)?,
                CryptoPanicAPI::build(settings.crypto_panic_key.clone(), timeout)?,
            ),
            sessions: SessionStore::new(&settings.default_base_currency()),
        })
    }
}

fn updated_line() -> String {
    format!("Updated: {}", Local::now().format("%d.%m.%Y %H:%M"))
}

fn display_name(code: &str) -> String {
    registry::lookup(code)
        .map(|asset| asset.label())
        .unwrap_or_else(|| code.to_owned())
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

async fn rates_text(services: &Services, user: i64) -> String {
    let base = services.sessions.base_currency(user);
    let table = services.rates.get_all_rates(&base).await;
    if table.is_empty() {
        return RETRY_HINT.to_owned();
    }
    let mut text = format!("Rates in {}:\n\n", base);
    registry::popular_fiat()
        .filter(|asset| asset.code != base)
        .filter_map(|asset| table.get(asset.code).map(|rate| (asset, rate)))
        .take(RATES_SHOWN)
        .for_each(|(asset, base_to_target)| {
            text.push_str(&format!(
                "{} 1 {} = {} {}\n",
                asset.glyph.unwrap_or(""),
                asset.code,
                format_rate(1.0 / base_to_target),
                base
            ));
        });
    text.push('\n');
    text.push_str(&updated_line());
    text
}

async fn convert_text(services: &Services, user: i64, amount: &str, from: &str, to: &str) -> String {
    let amount = match parse_amount(amount) {
        Some(amount) => amount,
        None => return "The amount must be a positive number.".to_owned(),
    };
    let (from, to) = (registry::normalize(from), registry::normalize(to));
    for code in [&from, &to].iter() {
        if !registry::is_known(code) {
            return format!("Unknown currency: {}", code);
        }
    }
    if from == to {
        return "Pick two different currencies.".to_owned();
    }
    match services.rates.conversion(amount, &from, &to).await {
        Some(result) => {
            let rate = result.rate.rate;
            let text = format!(
                "{} -> {}\n\n{} {} = {} {}\n\nRate: 1 {} = {:.8} {}\nInverse: 1 {} = {:.8} {}",
                display_name(&from),
                display_name(&to),
                amount,
                from,
                format_amount(result.converted),
                to,
                from,
                rate,
                to,
                to,
                1.0 / rate,
                from
            );
            services.sessions.record_conversion(user, result);
            text
        }
        None => RETRY_HINT.to_owned(),
    }
}

fn currencies_text() -> String {
    let assets = registry::all_sorted();
    let mut text = String::from("Supported currencies:\n\n");
    for asset in assets.iter() {
        let kind = match asset.kind {
            AssetKind::Fiat => "fiat",
            AssetKind::Crypto => "crypto",
        };
        text.push_str(&format!("{} {} ({})\n", asset.code, asset.label(), kind));
    }
    text.push_str(&format!("\nTotal: {}", assets.len()));
    text
}

/// `ranked` holds units of each currency per one unit of `base`, highest first.
fn extremes_text(base: &str, ranked: &[(&str, f64)]) -> Option<String> {
    let (highest, lowest) = match (ranked.first(), ranked.last()) {
        (Some(highest), Some(lowest)) if ranked.len() > 1 => (highest, lowest),
        _ => return None,
    };
    let mut text = format!("Highest rates against 1 {}:\n", base);
    for (code, rate) in ranked.iter().take(EXTREMES_SHOWN) {
        text.push_str(&format!("{} {:.4}\n", code, rate));
    }
    text.push_str(&format!("\nLowest rates against 1 {}:\n", base));
    for (code, rate) in ranked.iter().rev().take(EXTREMES_SHOWN) {
        text.push_str(&format!("{} {:.6}\n", code, rate));
    }
    text.push_str(&format!(
        "\n1 {} buys {:.0} times more {} than {}",
        base,
        highest.1 / lowest.1,
        highest.0,
        lowest.0
    ));
    Some(text)
}

async fn toprates_text(services: &Services, user: i64) -> String {
    let base = services.sessions.base_currency(user);
    let table = services.rates.get_all_rates(&base).await;
    match extremes_text(table.base(), &table.ranked()) {
        Some(mut text) => {
            text.push_str("\n\n");
            text.push_str(&updated_line());
            text
        }
        None => RETRY_HINT.to_owned(),
    }
}

async fn top_text(services: &Services) -> String {
    let top = services.listings.get_top_assets(TOP_LIMIT).await;
    let mut text = format!("Top {} crypto assets by market cap\n\n", top.assets.len());
    for (i, asset) in top.assets.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} ({})\n   Price: {}\n   24h: {}\n\n",
            i + 1,
            asset.name,
            asset.symbol,
            format_price(asset.price),
            format_change(asset.change_24h)
        ));
    }
    if top.is_fallback() {
        text.push_str("Live market data is unavailable; showing sample values.\n");
    } else {
        text.push_str(&format!("Source: {}\n", top.provider_name()));
    }
    text.push_str(&updated_line());
    text
}

async fn crypto_text(services: &Services, code: &str) -> String {
    let code = registry::normalize(code);
    if registry::classify(&code) != AssetKind::Crypto {
        let known = registry::top_crypto().map(|asset| asset.code).join(", ");
        return format!("{} is not a supported crypto asset. Try one of: {}", code, known);
    }
    let table = services.rates.get_all_rates(&code).await;
    if table.is_empty() {
        return RETRY_HINT.to_owned();
    }
    let mut text = format!("{}\n\n", display_name(&code));
    for currency in DETAIL_CURRENCIES.iter() {
        if let Some(rate) = table.get(currency) {
            text.push_str(&format!("1 {} = {:.2} {}\n", code, rate, currency));
        }
    }
    text.push('\n');
    text.push_str(&updated_line());
    text
}

fn history_text(services: &Services, user: i64) -> String {
    let history = services.sessions.history(user, HISTORY_SHOWN);
    if history.is_empty() {
        return "No conversions yet.".to_owned();
    }
    history
        .iter()
        .map(|c| {
            format!(
                "{} {} = {} {} ({})",
                c.amount,
                c.base(),
                format_amount(c.converted),
                c.target(),
                c.rate.observed_at.with_timezone(&Local).format("%d.%m %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn answer(cx: UpdateWithCx<Bot, Message>, command: Command, services: &Services) -> Result<()> {
    let user = cx.update.chat.id;
    let reply = match command {
        Command::Help => Command::descriptions(),
        Command::Start => {
            services.sessions.reset(user);
            format!(
                "Welcome! Your base currency is {}.\nUse /rates, /convert, /top, /crypto and /news.\n\n{}",
                services.sessions.base_currency(user),
                Command::descriptions()
            )
        }
        Command::Rates => rates_text(services, user).await,
        Command::Convert { amount, from, to } => {
            convert_text(services, user, &amount, &from, &to).await
        }
        Command::Base(ref code) => {
            let code = registry::normalize(code);
            if registry::is_known(&code) {
                services.sessions.set_base_currency(user, &code);
                format!("Base currency set to {}", display_name(&code))
            } else {
                format!("Unknown currency: {}", code)
            }
        }
        Command::Top => top_text(services).await,
        Command::Crypto(ref code) => crypto_text(services, code).await,
        Command::News(ref slug) => match NewsCategory::from_slug(slug) {
            Some(category) => {
                let news = services.news.get_news(category, NEWS_LIMIT).await;
                format_news(&news, category.title())
            }
            None => "Categories: latest, us, crypto, economy, banking, ru, ru-finance".to_owned(),
        },
        Command::History => history_text(services, user),
        Command::Currencies => currencies_text(),
        Command::TopRates => toprates_text(services, user).await,
    };
    cx.answer(reply)
        .send()
        .await
        .context("Replying to command")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::info!("Starting ValutaBot...");

    let settings = Settings::load()?;
    settings.log_providers();
    let token = settings
        .teloxide_token
        .clone()
        .context("Getting Telegram token")?;
    let bot_name = settings
        .bot_name
        .clone()
        .unwrap_or_else(|| "ValutaBot".to_owned());

    let bot = Bot::new(token);
    let container = Arc::new(Services::build(&settings)?);
    teloxide::commands_repl(bot, bot_name, move |cx, cmd| {
        let services = container.clone();
        async move { answer(cx, cmd, &services).await }
    })
    .await;
    Ok(())
}

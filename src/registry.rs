//! Static asset registry. Both tables are fixed at compile time and shared by
//! the classifier and every adapter that branches on asset kind.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Fiat,
    Crypto,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Asset {
    pub code: &'static str,
    pub name: &'static str,
    pub glyph: Option<&'static str>,
    pub kind: AssetKind,
}

const fn fiat_asset(code: &'static str, glyph: &'static str, name: &'static str) -> Asset {
    Asset {
        code,
        name,
        glyph: Some(glyph),
        kind: AssetKind::Fiat,
    }
}

const fn crypto_asset(code: &'static str, glyph: &'static str, name: &'static str) -> Asset {
    Asset {
        code,
        name,
        glyph: Some(glyph),
        kind: AssetKind::Crypto,
    }
}

static FIAT: [Asset; 48] = [
    fiat_asset("USD", "🇺🇸", "US Dollar"),
    fiat_asset("EUR", "🇪🇺", "Euro"),
    fiat_asset("RUB", "🇷🇺", "Russian Ruble"),
    fiat_asset("GBP", "🇬🇧", "Pound Sterling"),
    fiat_asset("JPY", "🇯🇵", "Japanese Yen"),
    fiat_asset("CNY", "🇨🇳", "Chinese Yuan"),
    fiat_asset("CHF", "🇨🇭", "Swiss Franc"),
    fiat_asset("CAD", "🇨🇦", "Canadian Dollar"),
    fiat_asset("AUD", "🇦🇺", "Australian Dollar"),
    fiat_asset("NZD", "🇳🇿", "New Zealand Dollar"),
    fiat_asset("SGD", "🇸🇬", "Singapore Dollar"),
    fiat_asset("HKD", "🇭🇰", "Hong Kong Dollar"),
    fiat_asset("KRW", "🇰🇷", "South Korean Won"),
    fiat_asset("INR", "🇮🇳", "Indian Rupee"),
    fiat_asset("BRL", "🇧🇷", "Brazilian Real"),
    fiat_asset("MXN", "🇲🇽", "Mexican Peso"),
    fiat_asset("TRY", "🇹🇷", "Turkish Lira"),
    fiat_asset("ZAR", "🇿🇦", "South African Rand"),
    fiat_asset("SEK", "🇸🇪", "Swedish Krona"),
    fiat_asset("NOK", "🇳🇴", "Norwegian Krone"),
    fiat_asset("DKK", "🇩🇰", "Danish Krone"),
    fiat_asset("PLN", "🇵🇱", "Polish Zloty"),
    fiat_asset("CZK", "🇨🇿", "Czech Koruna"),
    fiat_asset("HUF", "🇭🇺", "Hungarian Forint"),
    fiat_asset("RON", "🇷🇴", "Romanian Leu"),
    fiat_asset("ILS", "🇮🇱", "Israeli Shekel"),
    fiat_asset("AED", "🇦🇪", "UAE Dirham"),
    fiat_asset("SAR", "🇸🇦", "Saudi Riyal"),
    fiat_asset("THB", "🇹🇭", "Thai Baht"),
    fiat_asset("MYR", "🇲🇾", "Malaysian Ringgit"),
    fiat_asset("IDR", "🇮🇩", "Indonesian Rupiah"),
    fiat_asset("PHP", "🇵🇭", "Philippine Peso"),
    fiat_asset("VND", "🇻🇳", "Vietnamese Dong"),
    fiat_asset("KZT", "🇰🇿", "Kazakhstani Tenge"),
    fiat_asset("UAH", "🇺🇦", "Ukrainian Hryvnia"),
    fiat_asset("BYN", "🇧🇾", "Belarusian Ruble"),
    fiat_asset("AMD", "🇦🇲", "Armenian Dram"),
    fiat_asset("GEL", "🇬🇪", "Georgian Lari"),
    fiat_asset("AZN", "🇦🇿", "Azerbaijani Manat"),
    fiat_asset("KGS", "🇰🇬", "Kyrgyzstani Som"),
    fiat_asset("UZS", "🇺🇿", "Uzbekistani Som"),
    fiat_asset("TJS", "🇹🇯", "Tajikistani Somoni"),
    fiat_asset("MDL", "🇲🇩", "Moldovan Leu"),
    fiat_asset("BGN", "🇧🇬", "Bulgarian Lev"),
    fiat_asset("RSD", "🇷🇸", "Serbian Dinar"),
    fiat_asset("HRK", "🇭🇷", "Croatian Kuna"),
    fiat_asset("ISK", "🇮🇸", "Icelandic Krona"),
    fiat_asset("EGP", "🇪🇬", "Egyptian Pound"),
];

static CRYPTO: [Asset; 29] = [
    crypto_asset("BTC", "₿", "Bitcoin"),
    crypto_asset("ETH", "Ξ", "Ethereum"),
    crypto_asset("BNB", "⛓️", "BNB"),
    crypto_asset("XRP", "✖️", "Ripple"),
    crypto_asset("SOL", "◎", "Solana"),
    crypto_asset("ADA", "🅰️", "Cardano"),
    crypto_asset("DOGE", "🐕", "Dogecoin"),
    crypto_asset("DOT", "●", "Polkadot"),
    crypto_asset("MATIC", "⬢", "Polygon"),
    crypto_asset("SHIB", "🐕", "Shiba Inu"),
    crypto_asset("AVAX", "❄️", "Avalanche"),
    crypto_asset("LTC", "Ł", "Litecoin"),
    crypto_asset("LINK", "🔗", "Chainlink"),
    crypto_asset("UNI", "🦄", "Uniswap"),
    crypto_asset("ATOM", "⚛️", "Cosmos"),
    crypto_asset("USDT", "💵", "Tether"),
    crypto_asset("USDC", "💵", "USD Coin"),
    crypto_asset("DAI", "💵", "DAI"),
    crypto_asset("TRX", "🚀", "Tron"),
    crypto_asset("XLM", "🌟", "Stellar"),
    crypto_asset("ALGO", "🔺", "Algorand"),
    crypto_asset("VET", "🔷", "VeChain"),
    crypto_asset("XTZ", "🍃", "Tezos"),
    crypto_asset("FIL", "📁", "Filecoin"),
    crypto_asset("EOS", "ε", "EOS"),
    crypto_asset("AAVE", "👻", "Aave"),
    crypto_asset("SAND", "🏖️", "The Sandbox"),
    crypto_asset("MANA", "🧙", "Decentraland"),
    crypto_asset("AXS", "🪙", "Axie Infinity"),
];

const POPULAR_FIAT: [&str; 17] = [
    "USD", "EUR", "RUB", "GBP", "JPY", "CNY", "CHF", "CAD", "AUD", "TRY", "KZT", "UAH", "BYN",
    "AED", "INR", "KRW", "SGD",
];

const TOP_CRYPTO: [&str; 10] = [
    "BTC", "ETH", "BNB", "XRP", "SOL", "ADA", "DOGE", "USDT", "USDC", "DOT",
];

pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

fn find(table: &'static [Asset], code: &str) -> Option<&'static Asset> {
    table.iter().find(|asset| asset.code == code)
}

/// Unregistered codes are classified as fiat and left for the fiat provider to reject.
pub fn classify(code: &str) -> AssetKind {
    if find(&CRYPTO, &normalize(code)).is_some() {
        AssetKind::Crypto
    } else {
        AssetKind::Fiat
    }
}

pub fn is_crypto(code: &str) -> bool {
    classify(code) == AssetKind::Crypto
}

/// Crypto entries shadow fiat entries with the same code.
pub fn lookup(code: &str) -> Option<&'static Asset> {
    let code = normalize(code);
    find(&CRYPTO, &code).or_else(|| find(&FIAT, &code))
}

pub fn is_known(code: &str) -> bool {
    lookup(code).is_some()
}

pub fn fiat() -> &'static [Asset] {
    &FIAT
}

pub fn crypto_assets() -> &'static [Asset] {
    &CRYPTO
}

/// Every registered asset ordered by code.
pub fn all_sorted() -> Vec<&'static Asset> {
    let mut assets: Vec<&'static Asset> = fiat().iter().chain(crypto_assets()).collect();
    assets.sort_by_key(|asset| asset.code);
    assets
}

pub fn popular_fiat() -> impl Iterator<Item = &'static Asset> {
    POPULAR_FIAT.iter().filter_map(|code| find(&FIAT, code))
}

pub fn top_crypto() -> impl Iterator<Item = &'static Asset> {
    TOP_CRYPTO.iter().filter_map(|code| find(&CRYPTO, code))
}

impl Asset {
    pub fn label(&self) -> String {
        match self.glyph {
            Some(glyph) => format!("{} {}", glyph, self.name),
            None => self.name.to_owned(),
        }
    }
}

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use log::{debug, info, warn};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::{require_key, NamedAPI};

const NEWSAPI_URL: &str = "https://newsapi.org/v2";
const CRYPTOPANIC_URL: &str = "https://cryptopanic.com/api/v1";

const CRYPTO_QUERY: &str = "bitcoin OR ethereum OR crypto OR blockchain";
const CRYPTO_FALLBACK_QUERY: &str = "bitcoin OR ethereum OR crypto";
const LATEST_QUERY: &str =
    r#"business OR finance OR stock OR market OR economy OR "wall street" OR fed OR "interest rates""#;
const US_QUERY: &str = r#"(business OR finance OR economy OR market OR fed OR "interest rates") AND (us OR "united states" OR usa)"#;
const ECONOMY_QUERY: &str =
    r#"economy OR GDP OR inflation OR "interest rates" OR unemployment -sports -football"#;
const BANKING_QUERY: &str =
    r#""central bank" OR "federal reserve" OR ECB OR "monetary policy" OR banks -sports -river"#;
const RU_BROAD_QUERY: &str = "россия OR москва OR рубль OR новости";
const RU_FINANCE_QUERY: &str = r#"(финансы OR экономика OR рубль OR доллар OR евро OR "курс рубля" OR биржа OR Мосбиржа OR "центральный банк" OR ЦБ OR "ключевая ставка" OR нефть OR инфляция OR ВВП OR бюджет OR "курс доллара" OR "курс евро")"#;

const TITLE_LIMIT: usize = 100;
const SHOWN_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub currencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsCategory {
    Latest,
    UnitedStates,
    Crypto,
    Economy,
    Banking,
    RussiaTop,
    RussiaFinance,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 7] = [
        NewsCategory::Latest,
        NewsCategory::UnitedStates,
        NewsCategory::Crypto,
        NewsCategory::Economy,
        NewsCategory::Banking,
        NewsCategory::RussiaTop,
        NewsCategory::RussiaFinance,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            NewsCategory::Latest => "latest",
            NewsCategory::UnitedStates => "us",
            NewsCategory::Crypto => "crypto",
            NewsCategory::Economy => "economy",
            NewsCategory::Banking => "banking",
            NewsCategory::RussiaTop => "ru",
            NewsCategory::RussiaFinance => "ru-finance",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            NewsCategory::Latest => "Latest financial news",
            NewsCategory::UnitedStates => "US financial news",
            NewsCategory::Crypto => "Crypto news",
            NewsCategory::Economy => "Economy",
            NewsCategory::Banking => "Banking and central banks",
            NewsCategory::RussiaTop => "Russia: top stories",
            NewsCategory::RussiaFinance => "Russia: finance and markets",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim().to_lowercase();
        Self::ALL.iter().copied().find(|c| c.slug() == slug)
    }
}

/// What to ask NewsAPI for.
#[derive(Debug, Clone, PartialEq)]
pub enum NewsRequest<'a> {
    /// Business top headlines for one country.
    Headlines { country: &'a str, language: &'a str },
    /// Full-text search sorted by publication date.
    Search { query: &'a str, language: &'a str },
}

#[async_trait]
pub trait NewsAPI {
    async fn get_articles(&self, request: NewsRequest<'_>, limit: usize) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait HotPostsAPI {
    async fn get_hot_posts(&self, limit: usize) -> Result<Vec<Article>>;
}

pub struct NewsApiOrg {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsApiOrg {
    pub fn build(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, timeout, NEWSAPI_URL)
    }

    pub fn with_base_url(api_key: Option<String>, timeout: Duration, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl NamedAPI for NewsApiOrg {
    fn get_name(&self) -> String {
        "NewsAPI".to_owned()
    }
}

#[async_trait]
impl NewsAPI for NewsApiOrg {
    async fn get_articles(&self, request: NewsRequest<'_>, limit: usize) -> Result<Vec<Article>> {
        let api_key = require_key(&self.api_key, "NewsAPI")?;
        let page_size = limit.to_string();
        let builder = match request {
            NewsRequest::Headlines { country, language } => self
                .client
                .get(format!("{}/top-headlines", self.base_url))
                .query(&[
                    ("apiKey", api_key),
                    ("category", "business"),
                    ("country", country),
                    ("pageSize", page_size.as_str()),
                    ("language", language),
                ]),
            NewsRequest::Search { query, language } => self
                .client
                .get(format!("{}/everything", self.base_url))
                .query(&[
                    ("apiKey", api_key),
                    ("q", query),
                    ("language", language),
                    ("sortBy", "publishedAt"),
                    ("pageSize", page_size.as_str()),
                ]),
        };
        let res = builder
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .context("Fetching NewsAPI articles")?;
        let res: Value = res.json().await?;
        debug!("NewsAPI response {:?}", res);
        let articles = res["articles"]
            .as_array()
            .ok_or(anyhow!("Can't parse NewsAPI response"))?;
        Ok(articles
            .iter()
            .take(limit)
            .map(|a| Article {
                title: a["title"].as_str().unwrap_or("Untitled").to_owned(),
                url: a["url"].as_str().unwrap_or_default().to_owned(),
                source: a["source"]["name"].as_str().unwrap_or("Unknown").to_owned(),
                published_at: a["publishedAt"].as_str().unwrap_or_default().to_owned(),
                currencies: vec![],
            })
            .collect())
    }
}

pub struct CryptoPanicAPI {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl CryptoPanicAPI {
    pub fn build(token: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(token, timeout, CRYPTOPANIC_URL)
    }

    pub fn with_base_url(token: Option<String>, timeout: Duration, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            token,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn is_configured(&self) -> bool {
        require_key(&self.token, "CryptoPanic").is_ok()
    }
}

impl NamedAPI for CryptoPanicAPI {
    fn get_name(&self) -> String {
        "CryptoPanic".to_owned()
    }
}

fn domain_of(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_owned())
}

fn parse_post(item: &Value) -> Article {
    let url = item["url"].as_str().unwrap_or_default().to_owned();
    let source = item["source"]["title"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| domain_of(&url))
        .unwrap_or_else(|| "CryptoPanic".to_owned());
    let currencies = item["currencies"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|c| c["code"].as_str().map(str::to_owned))
                .take(3)
                .collect()
        })
        .unwrap_or_default();
    Article {
        title: item["title"].as_str().unwrap_or_default().to_owned(),
        url,
        source,
        published_at: item["published_at"].as_str().unwrap_or_default().to_owned(),
        currencies,
    }
}

#[async_trait]
impl HotPostsAPI for CryptoPanicAPI {
    async fn get_hot_posts(&self, limit: usize) -> Result<Vec<Article>> {
        let token = require_key(&self.token, "CryptoPanic")?;
        let res = self
            .client
            .get(format!("{}/posts/", self.base_url))
            .query(&[("auth_token", token), ("public", "true"), ("filter", "hot")])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .context("Fetching CryptoPanic posts")?;
        let res: Value = res.json().await?;
        let results = res["results"]
            .as_array()
            .ok_or(anyhow!("Can't parse CryptoPanic response"))?;
        Ok(results.iter().take(limit).map(parse_post).collect())
    }
}

pub struct NewsService {
    newsapi: NewsApiOrg,
    cryptopanic: CryptoPanicAPI,
}

impl NewsService {
    pub fn new(newsapi: NewsApiOrg, cryptopanic: CryptoPanicAPI) -> Self {
        Self {
            newsapi,
            cryptopanic,
        }
    }

    /// Articles for a category. Failures yield an empty list.
    pub async fn get_news(&self, category: NewsCategory, limit: usize) -> Vec<Article> {
        let search = |query| NewsRequest::Search {
            query,
            language: "en",
        };
        let news = match category {
            NewsCategory::Latest => self.fetch(search(LATEST_QUERY), limit).await,
            NewsCategory::UnitedStates => self.fetch(search(US_QUERY), limit).await,
            NewsCategory::Economy => self.fetch(search(ECONOMY_QUERY), limit).await,
            NewsCategory::Banking => self.fetch(search(BANKING_QUERY), limit).await,
            NewsCategory::Crypto => self.crypto_news(limit).await,
            NewsCategory::RussiaTop => self.russian_top(limit).await,
            NewsCategory::RussiaFinance => {
                let request = NewsRequest::Search {
                    query: RU_FINANCE_QUERY,
                    language: "ru",
                };
                self.fetch(request, limit).await
            }
        };
        info!("{} news items for {}", news.len(), category.slug());
        news
    }

    async fn fetch(&self, request: NewsRequest<'_>, limit: usize) -> Vec<Article> {
        self.newsapi
            .get_articles(request, limit)
            .await
            .unwrap_or_else(|error| {
                warn!("NewsAPI failed: {:#}", error);
                vec![]
            })
    }

    async fn crypto_news(&self, limit: usize) -> Vec<Article> {
        if !self.cryptopanic.is_configured() {
            let request = NewsRequest::Search {
                query: CRYPTO_QUERY,
                language: "en",
            };
            return self.fetch(request, limit).await;
        }
        match self.cryptopanic.get_hot_posts(limit).await {
            Ok(posts) => posts,
            Err(error) => {
                warn!("CryptoPanic failed, falling back to NewsAPI: {:#}", error);
                let request = NewsRequest::Search {
                    query: CRYPTO_FALLBACK_QUERY,
                    language: "en",
                };
                self.fetch(request, limit).await
            }
        }
    }

    async fn russian_top(&self, limit: usize) -> Vec<Article> {
        let headlines = NewsRequest::Headlines {
            country: "ru",
            language: "ru",
        };
        let news = self.fetch(headlines, limit).await;
        if news.len() >= 2 {
            return news;
        }
        let broad = NewsRequest::Search {
            query: RU_BROAD_QUERY,
            language: "ru",
        };
        self.fetch(broad, limit).await
    }
}

fn shorten(title: &str) -> String {
    if title.chars().count() > TITLE_LIMIT {
        let head: String = title.chars().take(TITLE_LIMIT - 3).collect();
        format!("{}...", head)
    } else {
        title.to_owned()
    }
}

pub fn format_news(items: &[Article], title: &str) -> String {
    if items.is_empty() {
        return format!("{}\n\nNo news found", title);
    }
    let mut message = format!("{}\n\n", title);
    for (i, item) in items.iter().take(SHOWN_ITEMS).enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, shorten(&item.title)));
        if !item.url.is_empty() {
            message.push_str(&format!("   {}\n", item.url));
        }
        message.push_str(&format!("   Source: {}\n", item.source));
        if !item.currencies.is_empty() {
            message.push_str(&format!("   Currencies: {}\n", item.currencies.join(", ")));
        }
        if !item.published_at.is_empty() {
            let date = item.published_at.get(..10).unwrap_or(&item.published_at);
            message.push_str(&format!("   Date: {}\n", date.replace('-', ".")));
        }
        message.push('\n');
    }
    message.push_str(&format!("Total articles: {}\n", items.len()));
    message.push_str(&format!("Updated: {}", Local::now().format("%d.%m.%Y %H:%M")));
    message
}

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub window: WindowConfig,
    pub collection: CollectionConfig,
    pub categorization: CategorizationConfig,
    pub correlation: CorrelationConfig,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub data_dir: String,
    pub results_dir: String,
}

/// Price window placed around every event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowConfig {
    pub hours_before: u32,
    pub hours_after: u32,
    /// Number of rows returned by the most-impactful query
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Events published before this instant are ignored
    pub start_date: DateTime<Utc>,
    /// Cached collections older than this are re-fetched
    pub freshness_hours: u32,
    /// How far back the social/news adapters look on a fresh fetch
    pub lookback_hours: u32,
    pub max_reddit_posts: usize,
    pub max_announcement_results: usize,
    pub max_articles: usize,
    pub bitcoin_keywords: Vec<String>,
    pub subreddits: Vec<String>,
    pub announcement_subreddits: Vec<String>,
    pub announcement_queries: Vec<String>,
    pub news_query: String,
    pub trends_bitcoin_keywords: Vec<String>,
    pub trends_trump_keywords: Vec<String>,
    pub trends_timeframe: String,
    pub price_symbol: String,
    pub price_interval: String,
    pub price_limit: usize,
}

/// Named keyword rule mapping a title to a content type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl ContentRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Rules used to tag announcements as direct/indirect and by content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationConfig {
    pub direct_indicators: Vec<String>,
    pub crypto_keywords: Vec<String>,
    /// Checked in order after the crypto check; first match wins
    pub content_rules: Vec<ContentRule>,
    pub direct_weight: f64,
    pub crypto_weight: f64,
    pub crypto_type_weight: f64,
    /// Indirect announcements below this confidence are dropped
    pub min_confidence: f64,
    /// Polarity magnitude treated as neutral when bucketing sentiment
    pub neutral_band: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CorrelationConfig {
    pub bucket_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub newsapi_key: Option<String>,
    pub user_agent: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                data_dir: "data".to_string(),
                results_dir: "results".to_string(),
            },
            window: WindowConfig::default(),
            collection: CollectionConfig::default(),
            categorization: CategorizationConfig::default(),
            correlation: CorrelationConfig { bucket_minutes: 60 },
            credentials: CredentialsConfig {
                newsapi_key: None,
                user_agent: "BitcoinSentimentAnalyzer/1.0".to_string(),
            },
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            hours_before: 6,
            hours_after: 6,
            top_n: 3,
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            start_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            freshness_hours: 24,
            lookback_hours: 24,
            max_reddit_posts: 100,
            max_announcement_results: 1000,
            max_articles: 100,
            bitcoin_keywords: strings(&[
                "bitcoin",
                "btc",
                "#bitcoin",
                "#btc",
                "crypto",
                "cryptocurrency",
                "digital gold",
            ]),
            subreddits: strings(&["Bitcoin", "CryptoCurrency", "BitcoinMarkets"]),
            announcement_subreddits: strings(&[
                "politics",
                "news",
                "worldnews",
                "conservative",
                "democrats",
                "Republican",
                "Trump",
                "AskTrumpSupporters",
                "CryptoCurrency",
                "Bitcoin",
                "CryptoMarkets",
            ]),
            announcement_queries: strings(&[
                "trump announcement OR trump statement OR trump tweet",
                "trump policy OR trump decision OR trump action",
                "trump trade OR trump tariff OR trump economy",
                "trump crypto OR trump bitcoin OR trump cryptocurrency",
                "trump digital currency OR trump blockchain",
                "trump crypto regulation OR trump crypto policy",
            ]),
            news_query: "bitcoin OR btc OR cryptocurrency".to_string(),
            trends_bitcoin_keywords: strings(&["bitcoin", "btc", "crypto"]),
            trends_trump_keywords: strings(&["donald trump", "trump", "president trump"]),
            trends_timeframe: "now 1-d".to_string(),
            price_symbol: "BTCUSDT".to_string(),
            price_interval: "1h".to_string(),
            price_limit: 24,
        }
    }
}

impl Default for CategorizationConfig {
    fn default() -> Self {
        Self {
            direct_indicators: strings(&[
                "trump says",
                "trump announces",
                "trump declares",
                "trump tweets",
                "trump statement",
                "trump:",
                "trump stated",
                "trump commented",
                "trump remarked",
                "trump made clear",
                "trump made it clear",
                "trump made the announcement",
                "trump made the statement",
                "trump made the comment",
                "trump made the remark",
                "trump made the declaration",
            ]),
            crypto_keywords: strings(&[
                "bitcoin",
                "btc",
                "crypto",
                "cryptocurrency",
                "digital currency",
                "blockchain",
                "digital asset",
                "digital gold",
                "crypto asset",
                "crypto currency",
                "crypto market",
                "crypto regulation",
                "crypto policy",
                "crypto ban",
                "crypto tax",
                "crypto mining",
            ]),
            content_rules: vec![
                ContentRule::new("trade", &["trade", "tariff", "economy", "market"]),
                ContentRule::new("policy", &["policy", "decision", "action", "order"]),
                ContentRule::new("political", &["election", "campaign", "president"]),
                ContentRule::new("legal", &["court", "trial", "investigation"]),
            ],
            direct_weight: 0.4,
            crypto_weight: 0.3,
            crypto_type_weight: 0.3,
            min_confidence: 0.6,
            neutral_band: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_six_hours_each_side() {
        let config = AppConfig::default();
        assert_eq!(config.window.hours_before, 6);
        assert_eq!(config.window.hours_after, 6);
        assert_eq!(config.window.top_n, 3);
    }

    #[test]
    fn test_default_start_date() {
        let config = AppConfig::default();
        assert_eq!(
            config.collection.start_date,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(config.collection.freshness_hours, 24);
    }

    #[test]
    fn test_default_confidence_weights_sum_to_one() {
        let c = CategorizationConfig::default();
        let total = c.direct_weight + c.crypto_weight + c.crypto_type_weight;
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(c.content_rules.first().map(|r| r.name.as_str()), Some("trade"));
    }

    #[test]
    fn test_config_serializes_to_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("hours_before"));
        assert!(json.contains("bucket_minutes"));
    }
}

//! Bitcoin price collector for Binance spot klines.
//!
//! Pages forward from the requested start in batches of `price_limit`
//! candles, retrying failed batches up to a bounded number of times.

use crate::collector::types::{CollectorStats, HttpSource};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nonzero_ext::nonzero;
use sentiment_core::{CollectionConfig, SourceAdapter};
use sentiment_data::{PriceSeries, PriceTick};
use std::str::FromStr;
use std::time::Duration;

/// Binance spot API base URL
pub const BINANCE_SPOT_API: &str = "https://api.binance.com";

/// Binance caps a kline request at 1000 candles on spot.
const MAX_CANDLES_PER_REQUEST: usize = 1000;

const DEFAULT_MAX_FAILURES: u64 = 5;

/// Candle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Interval {
    /// Returns the Binance API string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    /// Returns the interval length.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        match self {
            Interval::OneMinute => chrono::Duration::minutes(1),
            Interval::FiveMinutes => chrono::Duration::minutes(5),
            Interval::FifteenMinutes => chrono::Duration::minutes(15),
            Interval::ThirtyMinutes => chrono::Duration::minutes(30),
            Interval::OneHour => chrono::Duration::hours(1),
            Interval::FourHours => chrono::Duration::hours(4),
            Interval::OneDay => chrono::Duration::days(1),
        }
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            _ => Err(anyhow!(
                "Invalid interval: '{}'. Valid values: 1m, 5m, 15m, 30m, 1h, 4h, 1d",
                s
            )),
        }
    }
}

/// Fetches OHLCV candles for one symbol.
pub struct PriceCollector {
    http: HttpSource,
    symbol: String,
    interval: Interval,
    batch_size: usize,
    retry_delay: Duration,
    max_failures: u64,
}

impl PriceCollector {
    /// Creates a collector from the collection settings.
    ///
    /// # Errors
    /// Returns error if the interval is invalid or the HTTP client cannot be built.
    pub fn new(config: &CollectionConfig, user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: HttpSource::new(BINANCE_SPOT_API, nonzero!(1200u32), user_agent)?,
            symbol: config.price_symbol.clone(),
            interval: Interval::from_str(&config.price_interval)?,
            batch_size: config.price_limit.clamp(1, MAX_CANDLES_PER_REQUEST),
            retry_delay: Duration::from_secs(5),
            max_failures: DEFAULT_MAX_FAILURES,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(url);
        self
    }

    /// Sets the pause after a failed batch.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets how many failed batches are tolerated before giving up.
    #[must_use]
    pub fn with_max_failures(mut self, max_failures: u64) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Fetches candles opened in `[start, end]` as a derived price series.
    ///
    /// # Errors
    /// Returns error if `start > end` or too many batches fail.
    pub async fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(PriceSeries, CollectorStats)> {
        if start > end {
            return Err(anyhow!("Start time must be before end time"));
        }

        let mut ticks = Vec::new();
        let mut stats = CollectorStats::default();
        let mut current_start = start;

        while current_start <= end {
            stats.requests += 1;

            match self.fetch_batch(current_start, end).await {
                Ok(batch) => {
                    let Some(last) = batch.last() else {
                        break;
                    };
                    current_start = last.timestamp + self.interval.duration();
                    let full_page = batch.len() >= self.batch_size;
                    ticks.extend(batch);
                    if !full_page {
                        break;
                    }
                }
                Err(e) => {
                    stats.failed_requests += 1;
                    tracing::error!(symbol = %self.symbol, error = %e, "Failed to fetch kline batch");

                    if stats.failed_requests >= self.max_failures {
                        return Err(anyhow!(
                            "Too many failed requests ({}). Last error: {}",
                            stats.failed_requests,
                            e
                        ));
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }

        let fetched = ticks.len();
        let series = PriceSeries::new(ticks);
        stats.duplicates_skipped = (fetched - series.len()) as u64;
        stats.records = series.len() as u64;

        tracing::info!(
            symbol = %self.symbol,
            interval = self.interval.as_str(),
            candles = series.len(),
            "Fetched price data"
        );
        Ok((series, stats))
    }

    async fn fetch_batch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PriceTick>> {
        let query = [
            ("symbol", self.symbol.clone()),
            ("interval", self.interval.as_str().to_string()),
            ("startTime", start.timestamp_millis().to_string()),
            ("endTime", end.timestamp_millis().to_string()),
            ("limit", self.batch_size.to_string()),
        ];
        let data: Vec<Vec<serde_json::Value>> = self.http.get_json("/api/v3/klines", &query, &[]).await?;

        Ok(data.iter().filter_map(|kline| parse_kline(kline)).collect())
    }
}

#[async_trait]
impl SourceAdapter for PriceCollector {
    type Record = PriceTick;

    fn name(&self) -> &str {
        "prices"
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<PriceTick>> {
        let (series, stats) = self.fetch(since, Utc::now()).await?;
        tracing::info!("Price collection: {}", stats.summary());
        Ok(series.into_ticks())
    }
}

/// Parses one kline row.
///
/// Binance kline format:
/// ```text
/// [
///   1499040000000,      // 0: Open time
///   "0.01634000",       // 1: Open
///   "0.80000000",       // 2: High
///   "0.01575800",       // 3: Low
///   "0.01577100",       // 4: Close
///   "148976.11427815",  // 5: Volume
///   ...
/// ]
/// ```
fn parse_kline(kline: &[serde_json::Value]) -> Option<PriceTick> {
    if kline.len() < 6 {
        return None;
    }

    let timestamp = Utc.timestamp_millis_opt(kline[0].as_i64()?).single()?;
    Some(PriceTick::new(
        timestamp,
        parse_f64_from_json(&kline[1])?,
        parse_f64_from_json(&kline[2])?,
        parse_f64_from_json(&kline[3])?,
        parse_f64_from_json(&kline[4])?,
        parse_f64_from_json(&kline[5])?,
    ))
}

/// Parses a float from a JSON string or number.
fn parse_f64_from_json(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 30, 0, 0, 0).unwrap() + chrono::Duration::hours(h)
    }

    fn kline(h: i64, close: f64) -> serde_json::Value {
        serde_json::json!([
            hour(h).timestamp_millis(),
            "100.0",
            "120.0",
            "90.0",
            close.to_string(),
            "12.5",
            hour(h).timestamp_millis() + 3_599_999,
            "0",
            10,
            "0",
            "0",
            "0"
        ])
    }

    fn collector(base: &str, limit: usize) -> PriceCollector {
        let config = CollectionConfig {
            price_limit: limit,
            ..Default::default()
        };
        PriceCollector::new(&config, "test")
            .unwrap()
            .with_base_url(base)
            .with_retry_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(Interval::from_str("1h").unwrap(), Interval::OneHour);
        assert_eq!(Interval::from_str("1H").unwrap(), Interval::OneHour);
        assert_eq!(Interval::OneHour.duration(), chrono::Duration::hours(1));
        let err = Interval::from_str("7x").unwrap_err();
        assert!(err.to_string().contains("Invalid interval"));
    }

    #[test]
    fn test_parse_kline() {
        let row: Vec<serde_json::Value> = serde_json::from_value(kline(0, 105.5)).unwrap();
        let tick = parse_kline(&row).unwrap();
        assert_eq!(tick.timestamp, hour(0));
        assert_eq!(tick.close, 105.5);
        assert_eq!(tick.volume, 12.5);

        assert!(parse_kline(&row[..3]).is_none());
        let mut bad = row.clone();
        bad[4] = serde_json::json!("not a number");
        assert!(parse_kline(&bad).is_none());
    }

    #[tokio::test]
    async fn test_fetch_paginates_and_derives_changes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("startTime", hour(0).timestamp_millis().to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                kline(0, 100.0),
                kline(1, 110.0)
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .and(query_param("startTime", hour(2).timestamp_millis().to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([kline(2, 99.0)])))
            .mount(&mock_server)
            .await;

        let (series, stats) = collector(&mock_server.uri(), 2).fetch(hour(0), hour(5)).await.unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(stats.requests, 2);
        assert_eq!(series.ticks()[0].price_change, None);
        assert!((series.ticks()[1].price_change.unwrap() - 10.0).abs() < 1e-9);
        assert!((series.ticks()[2].price_change.unwrap() + 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_too_many_failures_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = collector(&mock_server.uri(), 24)
            .with_max_failures(2)
            .fetch(hour(0), hour(5))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Too many failed requests (2)"));
    }

    #[tokio::test]
    async fn test_start_after_end_rejected() {
        let err = collector("http://localhost:1", 24)
            .fetch(hour(5), hour(0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("before end"));
    }
}

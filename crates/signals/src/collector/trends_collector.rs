//! Google Trends collector.
//!
//! Each keyword group goes through the two-step Trends API: `explore`
//! returns a TIMESERIES widget with a token, which `widgetdata/multiline`
//! exchanges for the interest timeline. A group's combined interest is the
//! mean across its keywords; the two groups are joined on time.

use crate::collector::types::{CollectorStats, HttpSource};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nonzero_ext::nonzero;
use sentiment_core::{CollectionConfig, SourceAdapter};
use sentiment_data::{with_interest_changes, TrendPoint};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Google Trends base URL.
pub const GOOGLE_TRENDS_URL: &str = "https://trends.google.com";

const HOST_LANGUAGE: &str = "en-US";
/// Timezone offset in minutes, as the Trends web client sends it.
const TZ_OFFSET: &str = "360";
const TIMESERIES_WIDGET: &str = "TIMESERIES";

// ========== Trends API Response Types ==========

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    token: Option<String>,
    request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultilineData {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelinePoint {
    /// Seconds since epoch, as a string
    time: String,
    #[serde(default)]
    value: Vec<f64>,
}

impl TimelinePoint {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = self.time.parse::<i64>().ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// Trends responses start with an anti-JSON-hijacking prefix such as `)]}'`.
fn strip_json_prefix(body: &str) -> &str {
    body.find('{').map_or(body, |i| &body[i..])
}

fn parse_prefixed<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(strip_json_prefix(body)).with_context(|| format!("Failed to parse Trends {what} response"))
}

/// Mean interest per timestamp for one keyword group.
fn combined_interest(points: &[TimelinePoint]) -> BTreeMap<DateTime<Utc>, f64> {
    points
        .iter()
        .filter(|p| !p.value.is_empty())
        .filter_map(|p| {
            let mean = p.value.iter().sum::<f64>() / p.value.len() as f64;
            Some((p.timestamp()?, mean))
        })
        .collect()
}

/// Collects search interest for the bitcoin and trump keyword groups.
pub struct TrendsCollector {
    http: HttpSource,
    bitcoin_keywords: Vec<String>,
    trump_keywords: Vec<String>,
    timeframe: String,
}

impl TrendsCollector {
    /// Creates a collector from the collection settings.
    ///
    /// # Errors
    /// Returns error if either keyword group is empty or the client cannot be built.
    pub fn new(config: &CollectionConfig, user_agent: &str) -> Result<Self> {
        if config.trends_bitcoin_keywords.is_empty() || config.trends_trump_keywords.is_empty() {
            return Err(anyhow!("Both trends keyword groups need at least one keyword"));
        }

        Ok(Self {
            // Trends answers bursts with 429s
            http: HttpSource::new(GOOGLE_TRENDS_URL, nonzero!(10u32), user_agent)?,
            bitcoin_keywords: config.trends_bitcoin_keywords.clone(),
            trump_keywords: config.trends_trump_keywords.clone(),
            timeframe: config.trends_timeframe.clone(),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(url);
        self
    }

    fn base_query(&self) -> Vec<(&'static str, String)> {
        vec![("hl", HOST_LANGUAGE.to_string()), ("tz", TZ_OFFSET.to_string())]
    }

    /// Fetches the interest timeline for one keyword group.
    async fn interest_over_time(&self, keywords: &[String]) -> Result<Vec<TimelinePoint>> {
        let comparison: Vec<serde_json::Value> = keywords
            .iter()
            .map(|k| serde_json::json!({"keyword": k, "geo": "", "time": self.timeframe}))
            .collect();
        let explore_req = serde_json::json!({"comparisonItem": comparison, "category": 0, "property": ""});

        let mut query = self.base_query();
        query.push(("req", explore_req.to_string()));
        let body = self.http.get_text("/trends/api/explore", &query, &[]).await?;
        let explore: ExploreResponse = parse_prefixed(&body, "explore")?;

        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == TIMESERIES_WIDGET)
            .ok_or_else(|| anyhow!("Trends explore response has no {TIMESERIES_WIDGET} widget"))?;
        let token = widget
            .token
            .ok_or_else(|| anyhow!("{TIMESERIES_WIDGET} widget has no token"))?;
        let request = widget
            .request
            .ok_or_else(|| anyhow!("{TIMESERIES_WIDGET} widget has no request"))?;

        let mut query = self.base_query();
        query.push(("req", request.to_string()));
        query.push(("token", token));
        let body = self
            .http
            .get_text("/trends/api/widgetdata/multiline", &query, &[])
            .await?;
        let multiline: MultilineResponse = parse_prefixed(&body, "multiline")?;

        Ok(multiline.default.timeline_data)
    }

    /// Fetches both groups and joins them on time, keeping points at or after `since`.
    ///
    /// # Errors
    /// Returns error if either group's request fails.
    pub async fn collect(&self, since: DateTime<Utc>) -> Result<(Vec<TrendPoint>, CollectorStats)> {
        let bitcoin = combined_interest(&self.interest_over_time(&self.bitcoin_keywords).await?);
        let trump = combined_interest(&self.interest_over_time(&self.trump_keywords).await?);

        let mut stats = CollectorStats {
            requests: 4,
            ..Default::default()
        };

        let joined: Vec<TrendPoint> = bitcoin
            .iter()
            .filter_map(|(t, btc)| trump.get(t).map(|tr| TrendPoint::new(*t, *btc, *tr)))
            .collect();
        let unmatched = bitcoin.len() + trump.len() - 2 * joined.len();
        if unmatched > 0 {
            tracing::debug!(unmatched, "Dropped trends points present in only one keyword group");
        }

        // Changes are derived over the full timeline before trimming to `since`.
        let points: Vec<TrendPoint> = with_interest_changes(joined)
            .into_iter()
            .filter(|p| {
                let keep = p.timestamp >= since;
                if !keep {
                    stats.too_old += 1;
                }
                keep
            })
            .collect();

        stats.records = points.len() as u64;
        tracing::info!(points = points.len(), timeframe = %self.timeframe, "Collected trends data");
        Ok((points, stats))
    }
}

#[async_trait]
impl SourceAdapter for TrendsCollector {
    type Record = TrendPoint;

    fn name(&self) -> &str {
        "trends"
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<TrendPoint>> {
        let (points, stats) = self.collect(since).await?;
        tracing::info!("Trends collection: {}", stats.summary());
        Ok(points)
    }
}

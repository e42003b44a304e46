use crate::models::{with_interest_changes, Engagement, PriceSeries, PriceTick, TimestampedEvent, TrendPoint};
use crate::time::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use csv::{Reader, StringRecord, Writer};
use sentiment_core::{AnalysisError, Result, SentimentScore};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Format of the generation stamp embedded in file names.
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Column aliases accepted for each logical event field.
const EVENT_TIME_COLUMNS: &[&str] = &["created_at", "published_at", "timestamp", "post_time", "announcement_time"];
const EVENT_BODY_COLUMNS: &[&str] = &["text", "selftext", "description"];
const EVENT_SOURCE_COLUMNS: &[&str] = &["source", "subreddit", "user"];
const POLARITY_COLUMNS: &[&str] = &["sentiment_polarity", "title_sentiment_polarity"];
const SUBJECTIVITY_COLUMNS: &[&str] = &["sentiment_subjectivity", "title_sentiment_subjectivity"];

/// A data row rejected while loading, with its 1-based row number.
#[derive(Debug)]
pub struct RowError {
    pub row: usize,
    pub error: AnalysisError,
}

/// Events loaded from a CSV file plus the rows that were skipped.
#[derive(Debug, Default)]
pub struct EventLoad {
    pub events: Vec<TimestampedEvent>,
    pub rejected: Vec<RowError>,
}

/// Flat row layout used when persisting events.
#[derive(Debug, Serialize)]
struct EventRow<'a> {
    id: Option<&'a str>,
    created_at: String,
    title: &'a str,
    text: Option<&'a str>,
    url: Option<&'a str>,
    source: &'a str,
    content_type: &'a str,
    is_direct: bool,
    is_crypto: bool,
    confidence_score: Option<f64>,
    sentiment_polarity: Option<f64>,
    sentiment_subjectivity: Option<f64>,
    score: i64,
    num_comments: u64,
    replies: u64,
    reblogs: u64,
    favorites: u64,
}

impl<'a> From<&'a TimestampedEvent> for EventRow<'a> {
    fn from(e: &'a TimestampedEvent) -> Self {
        Self {
            id: e.id.as_deref(),
            created_at: format_timestamp(e.timestamp),
            title: &e.title,
            text: e.body.as_deref(),
            url: e.url.as_deref(),
            source: &e.source,
            content_type: &e.content_type,
            is_direct: e.is_direct,
            is_crypto: e.is_crypto,
            confidence_score: e.confidence_score,
            sentiment_polarity: e.sentiment.map(|s| s.polarity),
            sentiment_subjectivity: e.sentiment.map(|s| s.subjectivity),
            score: e.engagement.score,
            num_comments: e.engagement.comments,
            replies: e.engagement.replies,
            reblogs: e.engagement.reblogs,
            favorites: e.engagement.favorites,
        }
    }
}

fn csv_err(err: csv::Error) -> AnalysisError {
    AnalysisError::Csv(err.to_string())
}

/// Header lookup by (case-insensitive) column name.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self { index }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.index.get(*a).copied())
    }

    fn require(&self, field: &str, aliases: &[&str]) -> Result<usize> {
        self.find(aliases)
            .ok_or_else(|| AnalysisError::missing_column(field))
    }
}

/// Accessors for one data row that report typed failures by field name.
struct Row<'r> {
    record: &'r StringRecord,
    number: usize,
}

impl<'r> Row<'r> {
    fn text(&self, col: Option<usize>) -> Option<&'r str> {
        col.and_then(|c| self.record.get(c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn f64(&self, field: &str, col: Option<usize>) -> Result<Option<f64>> {
        match self.text(col) {
            None => Ok(None),
            Some(raw) if raw.eq_ignore_ascii_case("nan") => Ok(None),
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                Ok(_) => Err(AnalysisError::input_shape(
                    field,
                    format!("row {}: '{}' is not a finite number", self.number, raw),
                )),
                Err(_) => Err(AnalysisError::input_shape(
                    field,
                    format!("row {}: '{}' is not a number", self.number, raw),
                )),
            },
        }
    }

    fn count(&self, field: &str, col: Option<usize>) -> Result<u64> {
        match self.f64(field, col)? {
            None => Ok(0),
            Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
            Some(v) => Err(AnalysisError::input_shape(
                field,
                format!("row {}: {} is not a non-negative integer", self.number, v),
            )),
        }
    }

    fn bool(&self, field: &str, col: Option<usize>) -> Result<bool> {
        match self.text(col).map(str::to_lowercase).as_deref() {
            None | Some("false") | Some("0") | Some("no") => Ok(false),
            Some("true") | Some("1") | Some("yes") => Ok(true),
            Some(other) => Err(AnalysisError::input_shape(
                field,
                format!("row {}: '{}' is not a boolean", self.number, other),
            )),
        }
    }
}

pub struct CsvStorage;

impl CsvStorage {
    /// Builds `{dir}/{prefix}_{YYYYmmdd_HHMMSS}.csv`.
    #[must_use]
    pub fn timestamped_path(dir: impl AsRef<Path>, prefix: &str, generated_at: DateTime<Utc>) -> PathBuf {
        dir.as_ref()
            .join(format!("{}_{}.csv", prefix, generated_at.format(FILE_STAMP_FORMAT)))
    }

    /// Reads events from a collector CSV.
    ///
    /// Accepts the column layouts written by every collector (posts, articles,
    /// announcements). Rows with malformed timestamps are rejected individually;
    /// missing required columns or wrongly typed values abort the load.
    ///
    /// # Errors
    /// `InputShape` when no timestamp or text column exists or a value has the wrong type.
    pub fn read_events(path: impl AsRef<Path>, default_source: &str) -> Result<EventLoad> {
        let mut reader = Reader::from_path(path.as_ref()).map_err(csv_err)?;
        let cols = Columns::new(reader.headers().map_err(csv_err)?);

        let time_col = cols.require("created_at", EVENT_TIME_COLUMNS)?;
        let title_col = cols.find(&["title"]);
        let body_col = cols.find(EVENT_BODY_COLUMNS);
        if title_col.is_none() && body_col.is_none() {
            return Err(AnalysisError::missing_column("title"));
        }

        let id_col = cols.find(&["id"]);
        let url_col = cols.find(&["url"]);
        let source_col = cols.find(EVENT_SOURCE_COLUMNS);
        let type_col = cols.find(&["content_type"]);
        let direct_col = cols.find(&["is_direct"]);
        let crypto_col = cols.find(&["is_crypto"]);
        let confidence_col = cols.find(&["confidence_score"]);
        let polarity_col = cols.find(POLARITY_COLUMNS);
        let subjectivity_col = cols.find(SUBJECTIVITY_COLUMNS);
        let score_col = cols.find(&["score"]);
        let comments_col = cols.find(&["num_comments", "comments"]);
        let replies_col = cols.find(&["replies"]);
        let reblogs_col = cols.find(&["reblogs", "retweets"]);
        let favorites_col = cols.find(&["favorites"]);

        let mut load = EventLoad::default();

        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(csv_err)?;
            let row = Row { record: &record, number: i + 1 };

            let raw_time = row.text(Some(time_col)).unwrap_or_default();
            let timestamp = match parse_timestamp(raw_time) {
                Ok(ts) => ts,
                Err(error) => {
                    load.rejected.push(RowError { row: row.number, error });
                    continue;
                }
            };

            let body = row.text(body_col);
            let title = match row.text(title_col) {
                Some(title) => title.to_string(),
                None => body
                    .and_then(|b| b.lines().map(str::trim).find(|l| !l.is_empty()))
                    .unwrap_or_default()
                    .to_string(),
            };
            let source = row.text(source_col).unwrap_or(default_source);

            let mut event = TimestampedEvent::new(timestamp, source, title);
            if let Some(body) = body {
                event = event.with_body(body);
            }
            if let Some(id) = row.text(id_col) {
                event = event.with_id(id);
            }
            if let Some(url) = row.text(url_col) {
                event = event.with_url(url);
            }
            if let Some(content_type) = row.text(type_col) {
                event = event.with_content_type(content_type);
            }

            event.is_direct = row.bool("is_direct", direct_col)?;
            event.is_crypto = row.bool("is_crypto", crypto_col)?;
            event.confidence_score = row.f64("confidence_score", confidence_col)?;

            if let Some(polarity) = row.f64("sentiment_polarity", polarity_col)? {
                let subjectivity = row.f64("sentiment_subjectivity", subjectivity_col)?.unwrap_or(0.0);
                event = event.with_sentiment(SentimentScore::new(polarity, subjectivity));
            }

            let score = row.f64("score", score_col)?.unwrap_or(0.0);
            if score.fract() != 0.0 {
                return Err(AnalysisError::input_shape(
                    "score",
                    format!("row {}: {} is not an integer", row.number, score),
                ));
            }
            event.engagement = Engagement {
                score: score as i64,
                comments: row.count("num_comments", comments_col)?,
                replies: row.count("replies", replies_col)?,
                reblogs: row.count("reblogs", reblogs_col)?,
                favorites: row.count("favorites", favorites_col)?,
            };

            load.events.push(event);
        }

        if !load.rejected.is_empty() {
            tracing::warn!(
                path = %path.as_ref().display(),
                rejected = load.rejected.len(),
                "Skipped event rows with malformed timestamps"
            );
        }

        Ok(load)
    }

    /// Writes events in the canonical event layout.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails.
    pub fn write_events(path: impl AsRef<Path>, events: &[TimestampedEvent]) -> Result<()> {
        let rows: Vec<EventRow<'_>> = events.iter().map(EventRow::from).collect();
        Self::write_rows(path, &rows)
    }

    /// Reads an OHLCV price file into a sorted, deduplicated series.
    ///
    /// Format: timestamp,open,high,low,close,volume[,price_change,...]. Only
    /// `timestamp` and `close` are required; derived columns are recomputed.
    ///
    /// # Errors
    /// `InputShape` for missing columns, unparseable timestamps, or non-numeric prices.
    pub fn read_prices(path: impl AsRef<Path>) -> Result<PriceSeries> {
        let mut reader = Reader::from_path(path.as_ref()).map_err(csv_err)?;
        let cols = Columns::new(reader.headers().map_err(csv_err)?);

        let time_col = cols.require("timestamp", &["timestamp", "time", "date"])?;
        let close_col = cols.require("close", &["close"])?;
        let open_col = cols.find(&["open"]);
        let high_col = cols.find(&["high"]);
        let low_col = cols.find(&["low"]);
        let volume_col = cols.find(&["volume"]);

        let mut ticks = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(csv_err)?;
            let row = Row { record: &record, number: i + 1 };

            let raw_time = row.text(Some(time_col)).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time).map_err(|_| {
                AnalysisError::input_shape("timestamp", format!("row {}: '{}' is not a timestamp", row.number, raw_time))
            })?;
            let close = row
                .f64("close", Some(close_col))?
                .ok_or_else(|| AnalysisError::input_shape("close", format!("row {}: value is empty", row.number)))?;

            ticks.push(PriceTick::new(
                timestamp,
                row.f64("open", open_col)?.unwrap_or(close),
                row.f64("high", high_col)?.unwrap_or(close),
                row.f64("low", low_col)?.unwrap_or(close),
                close,
                row.f64("volume", volume_col)?.unwrap_or(0.0),
            ));
        }

        Ok(PriceSeries::new(ticks))
    }

    /// Writes price ticks with their derived change columns.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails.
    pub fn write_prices(path: impl AsRef<Path>, ticks: &[PriceTick]) -> Result<()> {
        Self::write_rows(path, ticks)
    }

    /// Reads a search-interest file.
    ///
    /// # Errors
    /// `InputShape` for missing interest columns, bad timestamps, or non-numeric values.
    pub fn read_trends(path: impl AsRef<Path>) -> Result<Vec<TrendPoint>> {
        let mut reader = Reader::from_path(path.as_ref()).map_err(csv_err)?;
        let cols = Columns::new(reader.headers().map_err(csv_err)?);

        let time_col = cols.require("timestamp", &["timestamp", "date", "time"])?;
        let btc_col = cols.require("bitcoin_interest", &["bitcoin_interest", "bitcoin_combined_interest"])?;
        let trump_col = cols.require("trump_interest", &["trump_interest", "trump_combined_interest"])?;

        let mut points = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(csv_err)?;
            let row = Row { record: &record, number: i + 1 };

            let raw_time = row.text(Some(time_col)).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time).map_err(|_| {
                AnalysisError::input_shape("timestamp", format!("row {}: '{}' is not a timestamp", row.number, raw_time))
            })?;
            let empty = |field: &str| AnalysisError::input_shape(field, format!("row {}: value is empty", row.number));
            let bitcoin = row
                .f64("bitcoin_interest", Some(btc_col))?
                .ok_or_else(|| empty("bitcoin_interest"))?;
            let trump = row
                .f64("trump_interest", Some(trump_col))?
                .ok_or_else(|| empty("trump_interest"))?;

            points.push(TrendPoint::new(timestamp, bitcoin, trump));
        }

        Ok(with_interest_changes(points))
    }

    /// Writes search-interest points.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails.
    pub fn write_trends(path: impl AsRef<Path>, points: &[TrendPoint]) -> Result<()> {
        Self::write_rows(path, points)
    }

    /// Writes any flat serializable rows with a header line.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails.
    pub fn write_rows<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = Writer::from_writer(file);
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush()?;

        tracing::debug!(path = %path.display(), rows = rows.len(), "Wrote CSV");
        Ok(())
    }
}

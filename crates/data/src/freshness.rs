//! Freshness cache for collected data files.
//!
//! Each collector writes `{prefix}_{stamp}.csv` files into the data directory.
//! Before hitting the network again, the newest file for a prefix is checked:
//! if its newest record is younger than the configured age it is reused.

use crate::csv_storage::CsvStorage;
use chrono::{DateTime, Duration, Utc};
use sentiment_core::{Result, SourceAdapter, Timestamped};
use std::path::{Path, PathBuf};

/// Files smaller than this are treated as holding no records.
pub const MIN_USEFUL_FILE_BYTES: u64 = 100;

/// Outcome of checking a batch of cached records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Newest record is within the allowed age.
    Usable { newest: DateTime<Utc>, age: Duration },
    /// Newest record is older than the allowed age.
    Stale { newest: DateTime<Utc>, age: Duration },
    /// No records at all.
    Empty,
}

impl Freshness {
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Freshness::Usable { .. })
    }
}

/// Classifies records by the age of their newest timestamp.
///
/// A record exactly `max_age` old is still usable.
pub fn check_freshness<T: Timestamped>(records: &[T], max_age: Duration, now: DateTime<Utc>) -> Freshness {
    let Some(newest) = records.iter().map(Timestamped::timestamp).max() else {
        return Freshness::Empty;
    };

    let age = now - newest;
    if age <= max_age {
        Freshness::Usable { newest, age }
    } else {
        Freshness::Stale { newest, age }
    }
}

/// Returns the newest `{prefix}_*.csv` file in `dir`, ordered by the stamp in its name.
///
/// # Errors
/// Returns error if the directory exists but cannot be listed.
pub fn latest_file(dir: impl AsRef<Path>, prefix: &str) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(None);
    }

    let stem_prefix = format!("{prefix}_");
    let mut newest: Option<(String, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let Some(stamp) = name
            .strip_prefix(&stem_prefix)
            .and_then(|rest| rest.strip_suffix(".csv"))
        else {
            continue;
        };
        // Skip files whose prefix merely starts with ours, e.g. `news_data_x` vs `news`.
        if !stamp.chars().all(|c| c.is_ascii_digit() || c == '_') {
            continue;
        }

        let stamp = stamp.to_string();
        if newest.as_ref().map_or(true, |(best, _)| stamp > *best) {
            newest = Some((stamp, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// A cached record type that can be loaded from and saved to the data directory.
pub trait CsvRecord: Timestamped + Sized {
    /// Loads every record from a cache file.
    ///
    /// # Errors
    /// Returns error if the file is unreadable or has the wrong shape.
    fn load(path: &Path) -> Result<Vec<Self>>;

    /// Saves records to a cache file.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    fn save(path: &Path, records: &[Self]) -> Result<()>;
}

impl CsvRecord for crate::models::TimestampedEvent {
    fn load(path: &Path) -> Result<Vec<Self>> {
        let source = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("cache");
        Ok(CsvStorage::read_events(path, source)?.events)
    }

    fn save(path: &Path, records: &[Self]) -> Result<()> {
        CsvStorage::write_events(path, records)
    }
}

impl CsvRecord for crate::models::PriceTick {
    fn load(path: &Path) -> Result<Vec<Self>> {
        Ok(CsvStorage::read_prices(path)?.into_ticks())
    }

    fn save(path: &Path, records: &[Self]) -> Result<()> {
        CsvStorage::write_prices(path, records)
    }
}

impl CsvRecord for crate::models::TrendPoint {
    fn load(path: &Path) -> Result<Vec<Self>> {
        CsvStorage::read_trends(path)
    }

    fn save(path: &Path, records: &[Self]) -> Result<()> {
        CsvStorage::write_trends(path, records)
    }
}

/// Reuses a recent collector file or fetches and stores a new one.
#[derive(Debug, Clone)]
pub struct FreshnessCache {
    dir: PathBuf,
    prefix: String,
    max_age: Duration,
}

impl FreshnessCache {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            max_age,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Loads the newest cached file if its records are still fresh.
    ///
    /// Unreadable or malformed cache files count as a miss.
    ///
    /// # Errors
    /// Returns error only if the data directory cannot be listed.
    pub fn load_fresh<R: CsvRecord>(&self, now: DateTime<Utc>) -> Result<Option<Vec<R>>> {
        let Some(path) = latest_file(&self.dir, &self.prefix)? else {
            tracing::debug!(prefix = %self.prefix, "No cached file");
            return Ok(None);
        };

        let size = std::fs::metadata(&path)?.len();
        if size < MIN_USEFUL_FILE_BYTES {
            tracing::debug!(path = %path.display(), size, "Cached file is empty");
            return Ok(None);
        }

        let records = match R::load(&path) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
                return Ok(None);
            }
        };

        match check_freshness(&records, self.max_age, now) {
            Freshness::Usable { newest, age } => {
                tracing::info!(
                    path = %path.display(),
                    records = records.len(),
                    %newest,
                    age_minutes = age.num_minutes(),
                    "Using cached data"
                );
                Ok(Some(records))
            }
            Freshness::Stale { newest, age } => {
                tracing::info!(
                    path = %path.display(),
                    %newest,
                    age_hours = age.num_hours(),
                    "Cached data is stale"
                );
                Ok(None)
            }
            Freshness::Empty => Ok(None),
        }
    }

    /// Returns fresh cached records or fetches from `adapter`, saving non-empty results.
    ///
    /// # Errors
    /// Returns error if the fetch fails or the result cannot be saved.
    pub async fn load_or_fetch<A>(
        &self,
        adapter: &A,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<A::Record>>
    where
        A: SourceAdapter,
        A::Record: CsvRecord,
    {
        if let Some(cached) = self.load_fresh::<A::Record>(now)? {
            return Ok(cached);
        }

        tracing::info!(source = adapter.name(), %since, "Fetching fresh data");
        let records = adapter.fetch_since(since).await?;

        if records.is_empty() {
            tracing::warn!(source = adapter.name(), "Fetch returned no records, nothing saved");
        } else {
            let path = CsvStorage::timestamped_path(&self.dir, &self.prefix, now);
            A::Record::save(&path, &records)?;
            tracing::info!(path = %path.display(), records = records.len(), "Saved fetched data");
        }

        Ok(records)
    }
}

//! CLI commands for sentiment collection and analysis.

pub mod analyze_impact;
pub mod collect;
pub mod correlate;
pub mod run;

pub use analyze_impact::{run_analyze_impact, AnalyzeImpactArgs};
pub use collect::{run_collect, CollectArgs};
pub use correlate::{run_correlate, CorrelateArgs};
pub use run::run_pipeline;

use anyhow::{anyhow, Result};
use sentiment_data::latest_file;
use std::path::PathBuf;

/// Uses `explicit` when given, otherwise the newest `{prefix}_*.csv` in `data_dir`.
///
/// # Errors
/// Returns error if no path is given and no matching file exists.
pub fn resolve_input(explicit: Option<PathBuf>, data_dir: &str, prefix: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    latest_file(data_dir, prefix)?.ok_or_else(|| {
        anyhow!(
            "No {}_*.csv file found in '{}'. Run `collect` first or pass a path explicitly",
            prefix,
            data_dir
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_input(Some(PathBuf::from("x.csv")), "missing-dir", "price_data").unwrap();
        assert_eq!(path, PathBuf::from("x.csv"));
    }

    #[test]
    fn newest_file_is_picked() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("price_data_20250101_000000.csv"), "a").unwrap();
        std::fs::write(dir.path().join("price_data_20250102_000000.csv"), "b").unwrap();
        std::fs::write(dir.path().join("reddit_data_20250103_000000.csv"), "c").unwrap();

        let data_dir = dir.path().to_string_lossy().to_string();
        let path = resolve_input(None, &data_dir, "price_data").unwrap();
        assert!(path.ends_with("price_data_20250102_000000.csv"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let err = resolve_input(None, &data_dir, "trends_data").unwrap_err();
        assert!(err.to_string().contains("trends_data_*.csv"));
    }
}

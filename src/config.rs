// Runtime settings.
//
// Loaded from `geo_credit.toml` (or `--config`); every field has a default so
// an absent file or a partial file is fine.
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "geo_credit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub output: OutputSettings,
    pub report: ReportSettings,
}

/// Input dataset locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub villages: PathBuf,
    pub benchmark_level1: PathBuf,
    pub benchmark_level2: PathBuf,
    pub benchmark_level3: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            villages: PathBuf::from("Prototype Jawa Tengah.csv"),
            benchmark_level1: PathBuf::from("data/Kewajaran_Omzet_All.xlsx - Level 1.csv"),
            benchmark_level2: PathBuf::from("data/Kewajaran_Omzet_All.xlsx - Level 2.csv"),
            benchmark_level3: PathBuf::from("data/Kewajaran_Omzet_All.xlsx - Level 3.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    /// Rows shown in console previews; files always get the full table.
    pub preview_rows: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("."), preview_rows: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub chart_sample_limit: usize,
    pub top_saturated: usize,
    pub watchlist_limit: usize,
    pub top_sentiment: usize,
    pub sentiment_seed: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            chart_sample_limit: 4000,
            top_saturated: 10,
            watchlist_limit: 100,
            top_sentiment: 10,
            sentiment_seed: crate::sentiment::DEFAULT_SEED,
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read settings from `path`, or from `geo_credit.toml` when no path is
    /// given. A missing default file yields defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let settings = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let s = Settings::from_toml_str(
            r#"
            [report]
            watchlist_limit = 25

            [output]
            dir = "out"
            "#,
        )
        .unwrap();
        assert_eq!(s.report.watchlist_limit, 25);
        assert_eq!(s.report.chart_sample_limit, 4000);
        assert_eq!(s.report.sentiment_seed, 42);
        assert_eq!(s.output.dir, PathBuf::from("out"));
        assert_eq!(s.data, DataSettings::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let err = Settings::from_toml_str("[report\nwatchlist_limit = ").unwrap_err();
        assert!(matches!(err, crate::error::GeoCreditError::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }
}

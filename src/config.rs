use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

const DEFAULT_ARCHIVE_URL: &str =
    "https://maven-datasets.s3.amazonaws.com/Airbnb/Airbnb+Data.zip";

/// Storage locations and source settings for one pipeline instance.
///
/// Every artifact path derives from `data_dir`, so pointing it at a scratch
/// directory sandboxes the whole pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory all pipeline artifacts live under.
    pub data_dir: PathBuf,
    /// URL of the source archive.
    pub archive_url: String,
    /// File name of the cached archive, under `<data_dir>/raw/`.
    pub archive_file: String,
    /// File name of the extracted raw listings file, under `<data_dir>/raw/`.
    pub raw_file: String,
    /// File name of the cleaned artifact, under `<data_dir>/cleaned/`.
    pub clean_file: String,
    /// File name of the SQLite store, directly under `<data_dir>`.
    pub db_file: String,
    /// Name of the single table inside the store.
    pub table_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            archive_file: "airbnb_data.zip".to_string(),
            raw_file: "airbnb_listings.csv".to_string(),
            clean_file: "airbnb_paris_clean.csv".to_string(),
            db_file: "airbnb.db".to_string(),
            table_name: "listings_paris".to_string(),
        }
    }
}

impl Config {
    /// Reads `config.toml` from the working directory when present, otherwise
    /// returns the defaults. Missing keys fall back individually.
    pub fn load() -> Result<Self> {
        let config_path = Path::new("config.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults rooted at a caller-chosen data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join("raw").join(&self.archive_file)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join("raw").join(&self.raw_file)
    }

    pub fn clean_path(&self) -> PathBuf {
        self.data_dir.join("cleaned").join(&self.clean_file)
    }

    /// Sidecar recording the SHA-256 of the raw file the cleaned artifact was
    /// derived from.
    pub fn manifest_path(&self) -> PathBuf {
        self.clean_path().with_extension("src.sha256")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use super::Pipeline;
use crate::constants::ARCHIVE_MATCH_TOKEN;
use crate::error::{PipelineError, Result};

impl Pipeline {
    /// Ensures the raw listings file exists locally and returns its path.
    ///
    /// No network traffic happens when the file is already extracted, and a
    /// previously downloaded archive is reused rather than fetched again.
    pub fn fetch(&self) -> Result<PathBuf> {
        let archive_path = self.config.archive_path();
        let raw_path = self.config.raw_path();

        if raw_path.exists() {
            debug!(path = %raw_path.display(), "raw file already present, skipping fetch");
            return Ok(raw_path);
        }

        if let Some(parent) = raw_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if archive_path.exists() {
            info!(archive = %archive_path.display(), "archive cached, extracting without download");
            extract_entry(&archive_path, ARCHIVE_MATCH_TOKEN, &raw_path)?;
            return Ok(raw_path);
        }

        info!(url = %self.config.archive_url, "downloading source archive");
        let bytes = download(&self.config.archive_url)?;
        // Persist the archive before extraction so a failed extract can be
        // retried without another download.
        fs::write(&archive_path, &bytes)?;

        extract_entry(&archive_path, ARCHIVE_MATCH_TOKEN, &raw_path)?;
        info!(path = %raw_path.display(), "raw file extracted");
        Ok(raw_path)
    }
}

fn download(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .map_err(|e| PipelineError::DataUnavailable(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(PipelineError::DataUnavailable(format!(
            "GET {url}: status {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|e| PipelineError::DataUnavailable(format!("reading body of {url}: {e}")))?;
    Ok(bytes.to_vec())
}

/// Extracts the archive entry whose name contains `token` (case-insensitive)
/// into `out_path`. When several entries match, the first one with a `.csv`
/// suffix wins, otherwise the first match in archive order.
fn extract_entry(archive_path: &Path, token: &str, out_path: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let token_lower = token.to_lowercase();

    let mut csv_match = None;
    let mut first_match = None;
    for index in 0..archive.len() {
        let name = archive.by_index(index)?.name().to_lowercase();
        if !name.contains(&token_lower) {
            continue;
        }
        if first_match.is_none() {
            first_match = Some(index);
        }
        if name.ends_with(".csv") {
            csv_match = Some(index);
            break;
        }
    }

    let index = csv_match
        .or(first_match)
        .ok_or_else(|| PipelineError::ExtractionError {
            token: token.to_string(),
        })?;

    let mut entry = archive.by_index(index)?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    fs::write(out_path, bytes)?;
    Ok(())
}

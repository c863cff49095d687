use std::fs;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, Writer};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::Pipeline;
use crate::constants::{arrondissement_for_quarter, KEEP_COLS, PRICE_CEILING, SUPPORTED_CITY};
use crate::error::{PipelineError, Result};
use crate::types::Listing;

impl Pipeline {
    /// Ensures a fresh cleaned artifact exists and returns its path.
    ///
    /// The artifact is reused byte-untouched while the manifest's recorded
    /// hash still matches the raw file's content; otherwise it is re-derived
    /// and swapped in atomically together with an updated manifest. The raw
    /// file is fetched on demand when missing.
    pub fn clean(&self) -> Result<PathBuf> {
        let raw_path = self.config.raw_path();
        if !raw_path.exists() {
            info!("raw file missing, fetching on demand");
            self.fetch()?;
        }

        let clean_path = self.config.clean_path();
        let manifest_path = self.config.manifest_path();
        let raw_bytes = fs::read(&raw_path)?;
        let raw_digest = sha256_hex(&raw_bytes);

        if is_fresh(&clean_path, &manifest_path, &raw_digest) {
            debug!(path = %clean_path.display(), "cleaned artifact up to date");
            return Ok(clean_path);
        }

        let rows = transform(&raw_bytes)?;
        info!(rows = rows.len(), path = %clean_path.display(), "writing cleaned artifact");
        write_artifact(&clean_path, &manifest_path, &rows, &raw_digest)?;
        Ok(clean_path)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Fresh means: the artifact exists and its manifest still names the raw
/// bytes it was derived from. Timestamps play no part, so an externally
/// touched but unchanged raw file never forces a re-clean.
fn is_fresh(clean_path: &Path, manifest_path: &Path, raw_digest: &str) -> bool {
    if !clean_path.exists() {
        return false;
    }
    match fs::read_to_string(manifest_path) {
        Ok(recorded) => recorded.trim() == raw_digest,
        Err(_) => false,
    }
}

/// Positions of the kept columns within the raw header.
struct Columns {
    listing_id: usize,
    city: usize,
    district: usize,
    neighbourhood: usize,
    room_type: usize,
    price: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self> {
        let mut positions = [0usize; KEEP_COLS.len()];
        let mut missing = Vec::new();
        for (slot, col) in positions.iter_mut().zip(KEEP_COLS) {
            match headers.iter().position(|h| h == col) {
                Some(index) => *slot = index,
                None => missing.push(col.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::SourceSchemaError(missing));
        }
        let [listing_id, city, district, neighbourhood, room_type, price, latitude, longitude] =
            positions;
        Ok(Self {
            listing_id,
            city,
            district,
            neighbourhood,
            room_type,
            price,
            latitude,
            longitude,
        })
    }
}

/// Projects, filters and normalizes the raw export into cleaned rows.
fn transform(raw_bytes: &[u8]) -> Result<Vec<Listing>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(raw_bytes);

    // The upstream export is Latin-1, so fields are decoded lossily; every
    // value that participates in matching is plain ASCII.
    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();
    let columns = Columns::locate(&headers)?;

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let field = |index: usize| -> String {
            record
                .get(index)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };

        let city = field(columns.city);
        if !city.trim().eq_ignore_ascii_case(SUPPORTED_CITY) {
            continue;
        }

        let neighbourhood = non_empty(field(columns.neighbourhood));
        let mut district = non_empty(field(columns.district));
        if district.is_none() {
            if let Some(quarter) = neighbourhood.as_deref() {
                district = arrondissement_for_quarter(quarter).map(|n| n.to_string());
            }
        }
        let district = district.as_deref().and_then(format_district);

        let price = parse_number(&field(columns.price));
        let latitude = parse_number(&field(columns.latitude));
        let longitude = parse_number(&field(columns.longitude));
        let (Some(price), Some(latitude), Some(longitude)) = (price, latitude, longitude) else {
            continue;
        };
        if price <= 0.0 || price >= PRICE_CEILING {
            continue;
        }

        rows.push(Listing {
            listing_id: field(columns.listing_id),
            city,
            district,
            neighbourhood,
            room_type: non_empty(field(columns.room_type)),
            price,
            latitude,
            longitude,
        });
    }
    Ok(rows)
}

/// Renders a district number as its display token: 1 -> "1er", n -> "<n>e".
/// Values that do not parse as a number yield `None`, never an error.
fn format_district(raw: &str) -> Option<String> {
    let parsed = raw.trim().parse::<f64>().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    let number = parsed as i64;
    if number == 1 {
        Some("1er".to_string())
    } else {
        Some(format!("{number}e"))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Writes rows to a temporary file and renames it over the previous artifact,
/// then records the source digest. An interrupted write leaves the prior
/// artifact complete; an interruption between rename and manifest update only
/// costs one redundant re-clean on the next run.
fn write_artifact(
    clean_path: &Path,
    manifest_path: &Path,
    rows: &[Listing],
    raw_digest: &str,
) -> Result<()> {
    if let Some(parent) = clean_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = clean_path.with_extension("csv.tmp");
    let mut writer = Writer::from_path(&tmp_path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp_path, clean_path)?;
    fs::write(manifest_path, format!("{raw_digest}\n"))?;
    Ok(())
}

/// Reads a cleaned artifact back into memory.
pub(crate) fn read_cleaned(path: &Path) -> Result<Vec<Listing>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

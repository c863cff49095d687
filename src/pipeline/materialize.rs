use std::fs;
use std::path::PathBuf;

use rusqlite::{params, Connection};
use tracing::info;

use super::{clean::read_cleaned, Pipeline};
use crate::error::{PipelineError, Result};
use crate::types::Listing;

impl Pipeline {
    /// Rebuilds the SQLite store from the cleaned artifact and returns the
    /// store path.
    ///
    /// Always a full replace, never an upsert: the Transformer runs first,
    /// then the new store is assembled at a temporary path and renamed over
    /// the previous one, so a crash mid-rebuild leaves the prior store intact
    /// and readers never observe a half-written table.
    pub fn rebuild(&self) -> Result<PathBuf> {
        self.clean()?;

        let clean_path = self.config.clean_path();
        if !clean_path.exists() {
            return Err(PipelineError::CleanArtifactMissing(clean_path));
        }
        let rows = read_cleaned(&clean_path)?;

        let db_path = self.config.db_path();
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = db_path.with_extension("db.tmp");
        if tmp_path.exists() {
            // Leftover from an interrupted rebuild.
            fs::remove_file(&tmp_path)?;
        }

        let mut conn = Connection::open(&tmp_path)?;
        write_table(&mut conn, &self.config.table_name, &rows)?;
        conn.close().map_err(|(_, e)| e)?;

        fs::rename(&tmp_path, &db_path)?;
        info!(rows = rows.len(), path = %db_path.display(), "store rebuilt");
        Ok(db_path)
    }
}

fn write_table(conn: &mut Connection, table: &str, rows: &[Listing]) -> Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE {table} (
            listing_id    TEXT,
            city          TEXT,
            district      TEXT,
            neighbourhood TEXT,
            room_type     TEXT,
            price         REAL,
            latitude      REAL,
            longitude     REAL
        );
        "#
    ))?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (listing_id, city, district, neighbourhood, room_type, price, latitude, longitude) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ))?;
        for row in rows {
            stmt.execute(params![
                row.listing_id,
                row.city,
                row.district,
                row.neighbourhood,
                row.room_type,
                row.price,
                row.latitude,
                row.longitude,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

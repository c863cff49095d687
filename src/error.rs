use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("remote fetch failed: {0}")]
    DataUnavailable(String),

    #[error("no archive entry matches '{token}'")]
    ExtractionError { token: String },

    #[error("raw file is missing required columns: {}", .0.join(", "))]
    SourceSchemaError(Vec<String>),

    #[error("cleaned artifact missing after transform: {}", .0.display())]
    CleanArtifactMissing(PathBuf),

    #[error("no data representation available after pipeline trigger")]
    DataUnresolvable,

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

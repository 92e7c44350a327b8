use std::io;

use config::ConfigError;
use thiserror::Error;

pub(crate) type ApplicationResult<T> = Result<T, ApplicationError>;

#[derive(Debug, Error)]
pub(crate) enum ApplicationError {
    #[error("Error regarding config: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Failed to serialize config: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
    #[error("System input/output error: {0}")]
    IoError(#[from] io::Error),
    #[error("Error with reqwest: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Failed to parse METAR wind group: {0}")]
    MetarParseError(String),
    #[error("Unknown FIR: {0}")]
    UnknownFir(String),
    #[error("No rwy file configured, set `rwy_file_path` in {0} or pass --output")]
    NoOutputPath(String),
    #[error("Invalid runway configuration for {airport}: {reason}")]
    InvalidRunwayConfiguration { airport: String, reason: String },
}

/// Reasons a single airport gets no runway. These never abort a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum AssignmentError {
    #[error("Wind direction or speed unknown")]
    MissingWindData,
    #[error("No runway configuration for airport")]
    NoConfiguration,
    #[error("Tailwind exceeds preferential threshold and no alternate configuration exists")]
    InsufficientConfigurations,
}

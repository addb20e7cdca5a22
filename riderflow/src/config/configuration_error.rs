use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("invalid rate table '{0}': {1}")]
    InvalidRateTable(String, String),
    #[error("invalid spawn configuration: {0}")]
    InvalidSpawnConfig(String),
    #[error("invalid simulation configuration: {0}")]
    InvalidSimulationConfig(String),
    #[error("unknown density source '{0}'")]
    UnknownDensitySource(String),
    #[error("failure reading {0}: {1}")]
    ReadError(String, String),
    #[error("failure decoding {0}: {1}")]
    DecodeError(String, String),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}

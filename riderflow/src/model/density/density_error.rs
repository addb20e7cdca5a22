use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DensityError {
    #[error("density source '{0}' is unavailable: {1}")]
    Unavailable(String, String),
    #[error("invalid density query: {0}")]
    InvalidInput(String),
    #[error("failure reading density points from {0}: {1}")]
    ReadError(String, String),
}

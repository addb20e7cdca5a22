use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReservoirError {
    #[error("reservoir {0} is at its capacity of {1} waiting commuters")]
    CapacityExceeded(String, usize),
    #[error("invalid destination for {0}: {1}")]
    InvalidDestination(String, String),
    #[error("invalid position for {0}: {1}")]
    InvalidPosition(String, String),
    #[error("invalid time for {0}: {1}")]
    InvalidTime(String, String),
    #[error("invalid segment resolution {0}: {1}")]
    InvalidResolution(u8, String),
    #[error("lock poisoned for reservoir {0}")]
    LockPoisoned(String),
}

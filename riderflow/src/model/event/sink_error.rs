use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failure opening event sink {0}: {1}")]
    OpenError(String, String),
    #[error("failure encoding event: {source}")]
    EncodeError {
        #[from]
        source: serde_json::Error,
    },
    #[error("failure writing event: {source}")]
    WriteError {
        #[from]
        source: std::io::Error,
    },
}

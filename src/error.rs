use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid process spec on line {line}: {reason}")]
    InvalidProcessSpec { line: usize, reason: String },

    #[error("Invalid event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    #[error("Unknown scheduling algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown prevention policy: {0}")]
    UnknownPolicy(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

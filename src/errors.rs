use thiserror::Error;

/// Error type shared by the allocation core and the settlement caller layer.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unit already exists: {0}")]
    DuplicateUnit(String),
    #[error("Unit not found: {0}")]
    UnitNotFound(String),
    #[error("History record #{} does not exist ({len} stored)", .index + 1)]
    HistoryIndexOutOfRange { index: usize, len: usize },
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SettlementError>;

impl From<std::io::Error> for SettlementError {
    fn from(err: std::io::Error) -> Self {
        SettlementError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SettlementError {
    fn from(err: serde_json::Error) -> Self {
        SettlementError::Serde(err.to_string())
    }
}

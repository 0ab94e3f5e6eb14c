use thiserror::Error;

/// Error raised when operator text does not name a known lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown lookup operator: {0:?}")]
    Unknown(String),
    #[error("empty lookup operator")]
    Empty,
}

use thiserror::Error;

/// Simulation result
pub type SimResult<T> = Result<T, SimError>;

/// Simulation errors
///
/// Only the algorithm identifier is validated; every other input is accepted
/// as given and sanitized before a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

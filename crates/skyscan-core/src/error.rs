//! Error types for the flight-path engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlightPathError {
    /// A generation or profiling parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every analyzer row was rejected.
    #[error("no valid waypoints ({rejected} rows rejected)")]
    NoValidWaypoints { rejected: usize },
}

impl FlightPathError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FlightPathError>;

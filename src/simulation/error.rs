//! Error types for city generation, dispatch triggers and city selection.

use thiserror::Error;

/// Errors produced while generating a city.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("could not place {category}: {placed}/{requested} after {attempts} attempts")]
    Infeasible {
        category: &'static str,
        placed: usize,
        requested: usize,
        attempts: usize,
    },

    #[error("grid of size {size} cannot hold the station and hospital blocks")]
    GridTooSmall { size: usize },
}

/// Reasons an emergency trigger is refused. No state changes on rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerRejection {
    #[error("an emergency run is already active")]
    RunAlreadyActive,

    #[error("the simulation was cancelled and has not been reset")]
    AlreadyCancelled,

    #[error("unknown house {0:?}")]
    UnknownHouse(String),
}

/// Errors from the application root.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("unknown city {0:?}")]
    UnknownCity(String),

    #[error("wait for the current emergency to finish before selecting a new city")]
    RunActive,
}

//! Error taxonomy for the core, per spec §7.
//!
//! Structural/configuration failures are hard errors; a level-0 conflict is
//! UNSAT, which is a normal [`crate::cnf::Solution`] value, never an
//! `Err`. Invariant violations are `debug_assert!`s inside the relevant
//! modules and never reach this type in a release build.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("clause is empty after simplification, program is trivially incoherent")]
    EmptyClause,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("incremental API misuse: {0}")]
    IncrementalApiMisuse(String),

    #[error("malformed input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SolverResult<T> = Result<T, SolverError>;

//! Error taxonomy for the engine (see SPEC_FULL.md §7).

use thiserror::Error;

/// Everything that can go wrong in the core or the AIGER codec.
#[derive(Error, Debug)]
pub enum AigError {
    #[error("malformed AIGER input: {0}")]
    MalformedAiger(String),

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("arena exhausted: cannot allocate another node")]
    AllocationFailure,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AigResult<T> = Result<T, AigError>;

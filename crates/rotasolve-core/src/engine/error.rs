use super::config::ConfigError;
use super::utils::sampling::SamplingError;
use crate::core::forcefield::scoring::ScoringError;
use crate::core::models::ids::IdentityKey;
use crate::core::models::system::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Structure error: {0}")]
    Model(#[from] ModelError),

    #[error("Energy scoring failed: {source}")]
    Scoring {
        #[from]
        source: ScoringError,
    },

    #[error("Sampling failed: {0}")]
    Sampling(#[from] SamplingError),

    #[error("Interaction in term '{term}' touches {count} variable positions ({positions:?}); at most two are supported")]
    UnsupportedInteractionTopology {
        term: String,
        count: usize,
        positions: Vec<usize>,
    },

    #[error("Interaction in term '{term}' mixes identities {first} and {second} of position {position}")]
    MismatchedIdentities {
        term: String,
        position: usize,
        first: usize,
        second: usize,
    },

    #[error("State vector has {found} entries but the system has {expected} variable positions")]
    IndexMismatch { expected: usize, found: usize },

    #[error("Rotamer {rotamer} is out of range at position {position} ({available} available)")]
    RotamerOutOfRange {
        position: usize,
        rotamer: usize,
        available: usize,
    },

    #[error("Rotamer {rotamer} at position {position} was removed by the self-energy cutoff")]
    RotamerPruned { position: usize, rotamer: usize },

    #[error("Identity {key:?} could not be restored to conformation {conformation}: {reason}")]
    InconsistentIdentityState {
        key: IdentityKey,
        conformation: usize,
        reason: String,
    },

    #[error("Per-term energies for '{0}' are unavailable; enable `save_by_term` before building the tables")]
    TermBreakdownUnavailable(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

//! Unified error type for Molehunt.

use molehunt_core::{MatchError, RuleViolation};
use molehunt_map::MapError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MolehuntError {
    /// The map document was rejected.
    #[error(transparent)]
    Map(#[from] MapError),

    /// The match couldn't be built (bad roster, bad spawn).
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The action was refused by the rules.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// The match actor has shut down or its queue is closed.
    #[error("match actor is unavailable")]
    Unavailable,
}

impl MolehuntError {
    /// The refusal behind this error, if the rules refused the action.
    pub fn violation(&self) -> Option<&RuleViolation> {
        match self {
            Self::Rule(v) => Some(v),
            _ => None,
        }
    }
}

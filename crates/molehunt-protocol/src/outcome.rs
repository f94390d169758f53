//! Structured results handed to the broadcast layer.
//!
//! Inside the engine, rule checks return `Result<_, RuleViolation>`. At the
//! boundary those collapse into these two flat shapes, which serialize as
//! `{"success": false, "reason": "..."}` and `{"valid": true}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of a mutating action (task attempt, sabotage, meeting call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for ActionOutcome {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::rejected(e.to_string()),
        }
    }
}

/// Result of a read-only eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Validation {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::valid(),
            Err(e) => Self::invalid(e.to_string()),
        }
    }
}

// src/error.rs

//! Error types for the transshipment solver.

use thiserror::Error;

use crate::model::action::Action;
use crate::model::state::State;

/// Everything that can abort a solve.
///
/// None of these are retried: the computation is deterministic, so a failure
/// with one configuration fails the same way every time.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Only a single stage of warehouse pipeline delay is supported.
    #[error("unsupported warehouse lead time {0}, only a lead time of 1 is supported")]
    UnsupportedLeadTime(usize),

    #[error("unsupported demand distribution '{0}'")]
    UnsupportedDistribution(String),

    /// The kind is known but its parameters are rejected.
    #[error("invalid parameters for {kind} demand: {reason}")]
    InvalidDistribution { kind: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal defect: the action generator always yields the all-zero action.
    #[error("no feasible action generated for state {state}")]
    EmptyActionSet { state: State },

    #[error("action {action} is infeasible in state {state} (period {period})")]
    InfeasibleAction {
        period: usize,
        state: State,
        action: Action,
    },

    /// A policy table does not match the solver's horizon or state space.
    #[error("policy table mismatch: {0}")]
    PolicyShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

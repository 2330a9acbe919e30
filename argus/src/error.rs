use crate::analysis::arg::ArgStateId;
use argus_cfa::{CfaEdgeId, CfaError};
use thiserror::Error;

/// Broad classes of [`ArgusError`], used by drivers to decide how to report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller combined operators or analyses in an unsupported way.
    Configuration,
    /// A domain could not compute something it was asked for.
    Domain,
    /// A counterexample path could not be reconstructed.
    Path,
    /// The engine broke one of its own invariants.
    EngineInvariant,
}

#[derive(Debug, Error)]
pub enum ArgusError {
    #[error("Analysis `{analysis}` could not compute a successor along {edge}: {reason}")]
    TransferFailure {
        analysis: String,
        edge: CfaEdgeId,
        reason: String,
    },
    #[error("Interpolants disagree on `{variable}`: {left} vs {right}")]
    InterpolantInconsistency {
        variable: String,
        left: String,
        right: String,
    },
    #[error("ARG state {state} has several parents and no branching information was supplied")]
    AmbiguousPath { state: ArgStateId },
    #[error("Analysis `{analysis}` does not support {operation}")]
    PolicyUnsupported { analysis: String, operation: String },
    #[error("Engine invariant violated: {0}")]
    EngineInvariantViolated(String),
    #[error("Refinement produced the already explained counterexample {0:?} again")]
    RepeatedCounterexample(Vec<CfaEdgeId>),
    #[error("The counterexample is infeasible but no precision increment explains it")]
    RefinementFailed,
    #[error("Invalid control-flow automaton")]
    Cfa(#[from] CfaError),
}

impl ArgusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArgusError::PolicyUnsupported { .. } | ArgusError::Cfa(_) => ErrorKind::Configuration,
            ArgusError::TransferFailure { .. } | ArgusError::RefinementFailed => ErrorKind::Domain,
            ArgusError::AmbiguousPath { .. } => ErrorKind::Path,
            ArgusError::InterpolantInconsistency { .. }
            | ArgusError::EngineInvariantViolated(_)
            | ArgusError::RepeatedCounterexample(_) => ErrorKind::EngineInvariant,
        }
    }

    pub(crate) fn invariant<S: Into<String>>(msg: S) -> Self {
        ArgusError::EngineInvariantViolated(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ArgusError>;

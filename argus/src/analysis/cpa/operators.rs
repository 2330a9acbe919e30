use crate::analysis::cpa::state::{AbstractState, MergeOutcome};
use crate::error::{ArgusError, Result};
use serde::{Deserialize, Serialize};

/// How a new state is combined with a reached state at the same location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeOperator {
    /// Keep both states.
    Sep,
    /// Replace the reached state by the join of both.
    Join,
}

impl MergeOperator {
    pub fn merge<S: AbstractState>(
        self,
        analysis: &str,
        reached: &mut S,
        new: &S,
    ) -> Result<MergeOutcome> {
        match self {
            MergeOperator::Sep => Ok(reached.merge_sep(new)),
            MergeOperator::Join if !S::supports_join() => Err(ArgusError::PolicyUnsupported {
                analysis: analysis.to_string(),
                operation: "merge-join".to_string(),
            }),
            MergeOperator::Join => Ok(reached.merge_join(new)),
        }
    }
}

/// When a candidate state is considered covered by the reached set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopOperator {
    /// Covered iff an equal state was reached.
    Sep,
    /// Covered iff a reached state subsumes the candidate.
    Join,
    /// Never covered.
    Never,
    /// Covered whenever anything at all was reached. Unsound for most
    /// domains; only ever used when requested explicitly.
    Always,
}

impl StopOperator {
    /// Index of the reached element covering `state`, if any.
    pub fn covering_index<'r, S, I>(self, state: &S, mut reached: I) -> Option<usize>
    where
        S: AbstractState + 'r,
        I: Iterator<Item = &'r S>,
    {
        match self {
            StopOperator::Sep => state.stop_sep(reached),
            StopOperator::Join => state.stop_join(reached),
            StopOperator::Never => None,
            StopOperator::Always => reached.next().map(|_| 0),
        }
    }
}

/// The result of precision adjustment.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjustment<S, P> {
    Continue(S, P),
    /// Discard the candidate.
    Break,
}

impl<S, P> Adjustment<S, P> {
    pub fn is_break(&self) -> bool {
        matches!(self, Adjustment::Break)
    }
}

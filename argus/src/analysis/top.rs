//! The trivial analysis: a single state that approximates everything.

use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::lattice::JoinSemiLattice;
use crate::analysis::cpa::operators::{MergeOperator, StopOperator};
use crate::analysis::cpa::state::{AbstractState, Successor};
use crate::error::Result;
use crate::impl_state_display_via_debug;
use argus_cfa::{CfaEdge, CfaNodeId};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TopState;

impl PartialOrd for TopState {
    fn partial_cmp(&self, _other: &Self) -> Option<Ordering> {
        Some(Ordering::Equal)
    }
}

impl JoinSemiLattice for TopState {
    fn join(&mut self, _other: &Self) {}
}

impl_state_display_via_debug!(TopState);

impl AbstractState for TopState {}

#[derive(Debug, Clone, Copy)]
pub struct TopAnalysis {
    stop: StopOperator,
}

impl TopAnalysis {
    pub fn new() -> Self {
        Self {
            stop: StopOperator::Join,
        }
    }

    pub fn with_stop(stop: StopOperator) -> Self {
        Self { stop }
    }
}

impl Default for TopAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurableProgramAnalysis for TopAnalysis {
    type State = TopState;
    type Precision = ();

    fn name(&self) -> String {
        "top".to_string()
    }

    fn initial_state(&self, _entry: CfaNodeId) -> Self::State {
        TopState
    }

    fn initial_precision(&self, _entry: CfaNodeId) -> Self::Precision {}

    fn transfer<'a>(
        &'a self,
        _state: &'a Self::State,
        _precision: &Self::Precision,
        _edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>> {
        Ok(Successor::single(TopState))
    }

    fn merge_operator(&self) -> MergeOperator {
        MergeOperator::Sep
    }

    fn stop_operator(&self) -> StopOperator {
        self.stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_covers_itself() {
        let top = TopAnalysis::new();
        assert!(top.stop(&TopState, &[&TopState], &()));
        assert!(!top.stop(&TopState, &[], &()));
    }

    #[test]
    fn test_never_stop() {
        let top = TopAnalysis::with_stop(StopOperator::Never);
        assert!(!top.stop(&TopState, &[&TopState], &()));
    }
}

mod state;

pub use state::BranchCountState;

use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::operators::{Adjustment, MergeOperator, StopOperator};
use crate::analysis::cpa::state::Successor;
use crate::error::Result;
use argus_cfa::{CfaEdge, CfaNodeId};

/// Bounds the number of assumptions on a path. Paths exceeding the bound
/// are pruned by precision adjustment, which makes exploration incomplete.
pub struct BoundedBranchAnalysis {
    max_steps: usize,
}

impl BoundedBranchAnalysis {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }
}

impl ConfigurableProgramAnalysis for BoundedBranchAnalysis {
    type State = BranchCountState;
    type Precision = ();

    fn name(&self) -> String {
        format!("bounded-branch({})", self.max_steps)
    }

    fn initial_state(&self, _entry: CfaNodeId) -> Self::State {
        BranchCountState::new(self.max_steps)
    }

    fn initial_precision(&self, _entry: CfaNodeId) -> Self::Precision {}

    fn transfer<'a>(
        &'a self,
        state: &'a Self::State,
        _precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>> {
        let next = if edge.kind.is_assume() {
            state.step()
        } else {
            state.clone()
        };
        Ok(Successor::single(next))
    }

    fn merge_operator(&self) -> MergeOperator {
        MergeOperator::Join
    }

    fn stop_operator(&self) -> StopOperator {
        StopOperator::Join
    }

    fn adjust_precision(
        &self,
        state: Self::State,
        precision: &Self::Precision,
        _reached: &[&Self::State],
    ) -> Result<Adjustment<Self::State, Self::Precision>> {
        if state.exceeded() {
            Ok(Adjustment::Break)
        } else {
            Ok(Adjustment::Continue(state, *precision))
        }
    }
}

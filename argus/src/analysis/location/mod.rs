use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::state::Successor;
use crate::analysis::location::state::BasicLocationState;
use crate::error::Result;
use argus_cfa::{CfaEdge, CfaNodeId};

pub mod state;

#[cfg(test)]
mod tests;

/// Tracks the CFA node a state is at. Conventionally the first component of
/// a compound analysis.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationAnalysis;

impl LocationAnalysis {
    pub fn new() -> Self {
        Self
    }
}

impl ConfigurableProgramAnalysis for LocationAnalysis {
    type State = BasicLocationState;
    type Precision = ();

    fn name(&self) -> String {
        "location".to_string()
    }

    fn initial_state(&self, entry: CfaNodeId) -> Self::State {
        BasicLocationState::location(entry)
    }

    fn initial_precision(&self, _entry: CfaNodeId) -> Self::Precision {}

    fn transfer<'a>(
        &'a self,
        state: &'a Self::State,
        _precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>> {
        Ok(state.transfer(edge))
    }
}

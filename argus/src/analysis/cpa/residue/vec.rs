use super::Residue;
use crate::analysis::cpa::state::AbstractState;
use argus_cfa::{CfaEdge, CfaEdgeId};

/// Records every transition seen by the algorithm, in order.
///
/// When a merge happens, earlier recorded occurrences of the reached state
/// are replaced by the merged state, so the history reflects the merges.
pub struct VecResidue<S>
where
    S: AbstractState,
{
    pub visited: Vec<(CfaEdgeId, S)>,
    pub covered: usize,
}

impl<S: AbstractState> Default for VecResidue<S> {
    fn default() -> Self {
        Self {
            visited: Vec::new(),
            covered: 0,
        }
    }
}

impl<S: AbstractState> Residue<S> for VecResidue<S> {
    type Output = Vec<(CfaEdgeId, S)>;

    fn new_state(&mut self, _state: &S, edge: &CfaEdge, dest_state: &S) {
        self.visited.push((edge.id, dest_state.clone()));
    }

    fn merged_state(&mut self, reached: &S, _new_state: &S, merged: &S) {
        for (_, entry) in &mut self.visited {
            if entry == reached {
                *entry = merged.clone();
            }
        }
    }

    fn covered_state(&mut self, _state: &S, _covering: &S) {
        self.covered += 1;
    }

    fn new() -> Self {
        Self::default()
    }

    fn finalize(self) -> Self::Output {
        self.visited
    }
}

pub mod lattice;
pub mod operators;
pub mod precision;
pub mod reachability;
pub mod reached;
pub mod reducer;
pub mod residue;
pub mod state;

use crate::analysis::cpa::operators::{Adjustment, MergeOperator, StopOperator};
use crate::analysis::cpa::precision::Precision;
use crate::analysis::cpa::reducer::{NoOpReducer, Reducer};
use crate::analysis::cpa::state::{AbstractState, MergeOutcome, Successor};
use crate::error::{ArgusError, Result};
use argus_cfa::{CfaEdge, CfaNodeId};

/**
A trait representing Configurable Program Analysis, a tunable unified framework for
dataflow and model checking algorithms. This implementation is based on the presentation of
CPA contained in Chapter 16 of
[The Handbook of Model Checking](https://link.springer.com/book/10.1007/978-3-319-10575-8)

A CPA is a set of operators over an abstract domain whose states form a
[JoinSemiLattice](lattice::JoinSemiLattice): a transfer relation producing successors along
CFA edges, a merge operator deciding whether control-flow merges combine information, a stop
operator deciding whether a state is already covered, and a precision adjustment that may
abstract a state further or prune it altogether. Each operator may consult the current
[Precision], which refinement makes finer over time.

The operators are run by the [reachability algorithm](reachability::ReachabilityAlgorithm),
which records the exploration as an abstract reachability graph. Tuples of analyses are
analyses themselves (see [compound](crate::analysis::compound)).

Termination is the analysis' responsibility: the algorithm reaches a fixed point only if the
domain, together with its merge, stop and precision adjustment, admits no infinite ascending
exploration.
*/
pub trait ConfigurableProgramAnalysis {
    type State: AbstractState;
    type Precision: Precision;

    /// A name used in diagnostics.
    fn name(&self) -> String;

    fn initial_state(&self, entry: CfaNodeId) -> Self::State;

    fn initial_precision(&self, entry: CfaNodeId) -> Self::Precision;

    /// Successors of `state` along `edge`. Must be a pure function of its
    /// arguments.
    fn transfer<'a>(
        &'a self,
        state: &'a Self::State,
        precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>>;

    fn merge_operator(&self) -> MergeOperator {
        MergeOperator::Sep
    }

    fn stop_operator(&self) -> StopOperator {
        StopOperator::Sep
    }

    /// Merges `new` into `reached`, which is a copy of a reached state.
    fn merge(
        &self,
        reached: &mut Self::State,
        new: &Self::State,
        _precision: &Self::Precision,
    ) -> Result<MergeOutcome> {
        self.merge_operator().merge(&self.name(), reached, new)
    }

    /// Index of the state in `reached` that covers `state`, if any.
    fn covering_index(
        &self,
        state: &Self::State,
        reached: &[&Self::State],
        _precision: &Self::Precision,
    ) -> Option<usize> {
        self.stop_operator()
            .covering_index(state, reached.iter().copied())
    }

    fn stop(&self, state: &Self::State, reached: &[&Self::State], precision: &Self::Precision) -> bool {
        self.covering_index(state, reached, precision).is_some()
    }

    /// Adjusts a candidate state and its precision before the stop check,
    /// or prunes it. `reached` holds the reached states at the same
    /// location.
    fn adjust_precision(
        &self,
        state: Self::State,
        precision: &Self::Precision,
        _reached: &[&Self::State],
    ) -> Result<Adjustment<Self::State, Self::Precision>> {
        Ok(Adjustment::Continue(state, precision.clone()))
    }

    fn reducer(&self) -> impl Reducer<Self::State> {
        NoOpReducer
    }

    /// Ordering key for [ranked](reached::WaitlistOrder::Ranked) waitlists;
    /// higher is popped first.
    fn rank(&self, _state: &Self::State) -> i64 {
        0
    }

    /// Rejects operator combinations the domain cannot honor before any
    /// exploration happens.
    fn validate(&self) -> Result<()> {
        if self.merge_operator() == MergeOperator::Join && !Self::State::supports_join() {
            return Err(ArgusError::PolicyUnsupported {
                analysis: self.name(),
                operation: "merge-join".to_string(),
            });
        }
        Ok(())
    }
}

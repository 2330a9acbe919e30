//! A small interval analysis over the integer edge language.
//!
//! Only the variables its [`VariablePrecision`] tracks at a location are kept
//! in states at that location, so an initial empty precision makes it behave
//! like [`TopAnalysis`](crate::analysis::top::TopAnalysis) until refinement
//! starts adding variables. Merge-join widens, which keeps loops finite.

pub mod refinement;
pub mod state;
pub mod value;

use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::lattice::JoinSemiLattice;
use crate::analysis::cpa::operators::{MergeOperator, StopOperator};
use crate::analysis::cpa::precision::{PrecisionScope, VariablePrecision};
use crate::analysis::cpa::reducer::Reducer;
use crate::analysis::cpa::state::{MergeOutcome, Successor};
use crate::analysis::interval::state::IntervalState;
use crate::error::{ArgusError, Result};
use argus_cfa::{Block, Cfa, CfaEdge, CfaNodeId, EdgeKind, Variable};
use std::collections::BTreeSet;

pub struct IntervalCpa {
    variables: BTreeSet<Variable>,
    tracked: BTreeSet<Variable>,
    merge: MergeOperator,
    stop: StopOperator,
    scope: PrecisionScope,
}

impl IntervalCpa {
    /// An analysis over the variables declared by `cfa`, tracking none of
    /// them initially.
    pub fn new(cfa: &Cfa, scope: PrecisionScope) -> Self {
        Self {
            variables: cfa.variables().clone(),
            tracked: BTreeSet::new(),
            merge: MergeOperator::Sep,
            stop: StopOperator::Join,
            scope,
        }
    }

    /// Tracks `vars` everywhere from the start.
    pub fn tracking<I: IntoIterator<Item = Variable>>(mut self, vars: I) -> Self {
        self.tracked.extend(vars);
        self
    }

    pub fn with_merge(mut self, merge: MergeOperator) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_stop(mut self, stop: StopOperator) -> Self {
        self.stop = stop;
        self
    }

    fn step(&self, state: &IntervalState, edge: &CfaEdge) -> Result<Option<IntervalState>> {
        if let Some(var) = edge.kind.variables().into_iter().find(|v| !self.variables.contains(v)) {
            return Err(ArgusError::TransferFailure {
                analysis: self.name(),
                edge: edge.id,
                reason: format!("`{var}` is not declared"),
            });
        }
        let next = match &edge.kind {
            EdgeKind::Blank => Some(state.clone()),
            EdgeKind::Assign { var, expr } => {
                let mut next = state.clone();
                let value = state.eval(expr);
                next.set(*var, value);
                Some(next)
            }
            EdgeKind::Havoc { var } => {
                let mut next = state.clone();
                next.forget(var);
                Some(next)
            }
            EdgeKind::Assume(cond) => state.assume(cond),
        };
        Ok(next)
    }
}

impl ConfigurableProgramAnalysis for IntervalCpa {
    type State = IntervalState;
    type Precision = VariablePrecision;

    fn name(&self) -> String {
        "interval".to_string()
    }

    fn initial_state(&self, _entry: CfaNodeId) -> Self::State {
        IntervalState::new()
    }

    fn initial_precision(&self, _entry: CfaNodeId) -> Self::Precision {
        VariablePrecision::tracking(self.scope, self.tracked.iter().copied())
    }

    fn transfer<'a>(
        &'a self,
        state: &'a Self::State,
        precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>> {
        let Some(mut next) = self.step(state, edge)? else {
            return Ok(Successor::empty());
        };
        next.retain(|v| precision.tracks(v, edge.successor));
        Ok(Successor::single(next))
    }

    fn merge_operator(&self) -> MergeOperator {
        self.merge
    }

    fn stop_operator(&self) -> StopOperator {
        self.stop
    }

    fn merge(
        &self,
        reached: &mut Self::State,
        new: &Self::State,
        _precision: &Self::Precision,
    ) -> Result<MergeOutcome> {
        match self.merge {
            MergeOperator::Sep => Ok(MergeOutcome::NoOp),
            MergeOperator::Join if new.is_less_or_equal(reached) => Ok(MergeOutcome::NoOp),
            MergeOperator::Join => {
                let mut joined = reached.clone();
                joined.join(new);
                *reached = reached.widen(&joined);
                Ok(MergeOutcome::Merged)
            }
        }
    }

    fn reducer(&self) -> impl Reducer<Self::State> {
        IntervalReducer
    }
}

/// Keeps only the variables a block uses while inside it.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalReducer;

impl Reducer<IntervalState> for IntervalReducer {
    fn reduce(&self, state: &IntervalState, block: &Block) -> IntervalState {
        let mut reduced = state.clone();
        reduced.retain(|v| block.uses(v));
        reduced
    }

    fn expand(&self, root: &IntervalState, block: &Block, reduced: &IntervalState) -> IntervalState {
        let mut expanded = reduced.clone();
        for (v, value) in root.iter().filter(|(v, _)| !block.uses(v)) {
            expanded.set(*v, *value);
        }
        expanded
    }
}

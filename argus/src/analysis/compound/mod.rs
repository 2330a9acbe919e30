//! Products of analyses.
//!
//! A tuple of analyses is itself an analysis over tuples of states. The
//! first component is conventionally the one carrying the location. Every
//! operator is applied component-wise:
//!
//! - transfer yields the cartesian product of the component successors, so
//!   an edge is taken only if every component can take it;
//! - merge commits only if all components agree, i.e. each one either merged
//!   or already equals the new component;
//! - a reached state covers a candidate only if every component covers the
//!   candidate's component against that same reached state;
//! - precision adjustment prunes if any component prunes.

pub mod reducer;
pub mod state;

use crate::analysis::compound::reducer::{CompoundReducer2, CompoundReducer3};
use crate::analysis::compound::state::{CompoundState2, CompoundState3};
use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::operators::Adjustment;
use crate::analysis::cpa::reducer::Reducer;
use crate::analysis::cpa::state::{MergeOutcome, Successor};
use crate::error::Result;
use argus_cfa::{CfaEdge, CfaNodeId};
use itertools::iproduct;

/// Merges one component on a copy. `None` if the component neither merged
/// nor already equals the new component.
fn merge_component<A: ConfigurableProgramAnalysis>(
    cpa: &A,
    reached: &A::State,
    new: &A::State,
    precision: &A::Precision,
) -> Result<Option<(A::State, MergeOutcome)>> {
    let mut merged = reached.clone();
    let outcome = cpa.merge(&mut merged, new, precision)?;
    Ok((outcome.merged() || merged == *new).then_some((merged, outcome)))
}

fn component_covers<A: ConfigurableProgramAnalysis>(
    cpa: &A,
    state: &A::State,
    reached: &A::State,
    precision: &A::Precision,
) -> bool {
    cpa.stop(state, &[reached], precision)
}

impl<A: ConfigurableProgramAnalysis, B: ConfigurableProgramAnalysis> ConfigurableProgramAnalysis
    for (A, B)
{
    type State = CompoundState2<A::State, B::State>;
    type Precision = (A::Precision, B::Precision);

    fn name(&self) -> String {
        format!("({}, {})", self.0.name(), self.1.name())
    }

    fn initial_state(&self, entry: CfaNodeId) -> Self::State {
        CompoundState2 {
            s1: self.0.initial_state(entry),
            s2: self.1.initial_state(entry),
        }
    }

    fn initial_precision(&self, entry: CfaNodeId) -> Self::Precision {
        (self.0.initial_precision(entry), self.1.initial_precision(entry))
    }

    fn transfer<'a>(
        &'a self,
        state: &'a Self::State,
        precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>> {
        let left = self.0.transfer(&state.s1, &precision.0, edge)?;
        let right: Vec<_> = self
            .1
            .transfer(&state.s2, &precision.1, edge)?
            .into_iter()
            .collect();
        Ok(iproduct!(left, right)
            .map(|(s1, s2)| CompoundState2 { s1, s2 })
            .into())
    }

    fn merge(
        &self,
        reached: &mut Self::State,
        new: &Self::State,
        precision: &Self::Precision,
    ) -> Result<MergeOutcome> {
        let Some((s1, o1)) = merge_component(&self.0, &reached.s1, &new.s1, &precision.0)? else {
            return Ok(MergeOutcome::NoOp);
        };
        let Some((s2, o2)) = merge_component(&self.1, &reached.s2, &new.s2, &precision.1)? else {
            return Ok(MergeOutcome::NoOp);
        };
        let outcome = o1 + o2;
        if outcome.merged() {
            *reached = CompoundState2 { s1, s2 };
        }
        Ok(outcome)
    }

    fn covering_index(
        &self,
        state: &Self::State,
        reached: &[&Self::State],
        precision: &Self::Precision,
    ) -> Option<usize> {
        reached.iter().position(|r| {
            component_covers(&self.0, &state.s1, &r.s1, &precision.0)
                && component_covers(&self.1, &state.s2, &r.s2, &precision.1)
        })
    }

    fn adjust_precision(
        &self,
        state: Self::State,
        precision: &Self::Precision,
        reached: &[&Self::State],
    ) -> Result<Adjustment<Self::State, Self::Precision>> {
        let left: Vec<_> = reached.iter().map(|r| &r.s1).collect();
        let Adjustment::Continue(s1, p1) = self.0.adjust_precision(state.s1, &precision.0, &left)?
        else {
            return Ok(Adjustment::Break);
        };
        let right: Vec<_> = reached.iter().map(|r| &r.s2).collect();
        let Adjustment::Continue(s2, p2) = self.1.adjust_precision(state.s2, &precision.1, &right)?
        else {
            return Ok(Adjustment::Break);
        };
        Ok(Adjustment::Continue(CompoundState2 { s1, s2 }, (p1, p2)))
    }

    fn reducer(&self) -> impl Reducer<Self::State> {
        CompoundReducer2 {
            r1: self.0.reducer(),
            r2: self.1.reducer(),
        }
    }

    fn rank(&self, state: &Self::State) -> i64 {
        self.0.rank(&state.s1).saturating_add(self.1.rank(&state.s2))
    }

    fn validate(&self) -> Result<()> {
        self.0.validate()?;
        self.1.validate()
    }
}

impl<A: ConfigurableProgramAnalysis, B: ConfigurableProgramAnalysis, C: ConfigurableProgramAnalysis>
    ConfigurableProgramAnalysis for (A, B, C)
{
    type State = CompoundState3<A::State, B::State, C::State>;
    type Precision = (A::Precision, B::Precision, C::Precision);

    fn name(&self) -> String {
        format!("({}, {}, {})", self.0.name(), self.1.name(), self.2.name())
    }

    fn initial_state(&self, entry: CfaNodeId) -> Self::State {
        CompoundState3 {
            s1: self.0.initial_state(entry),
            s2: self.1.initial_state(entry),
            s3: self.2.initial_state(entry),
        }
    }

    fn initial_precision(&self, entry: CfaNodeId) -> Self::Precision {
        (
            self.0.initial_precision(entry),
            self.1.initial_precision(entry),
            self.2.initial_precision(entry),
        )
    }

    fn transfer<'a>(
        &'a self,
        state: &'a Self::State,
        precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successor<'a, Self::State>> {
        let first = self.0.transfer(&state.s1, &precision.0, edge)?;
        let second: Vec<_> = self
            .1
            .transfer(&state.s2, &precision.1, edge)?
            .into_iter()
            .collect();
        let third: Vec<_> = self
            .2
            .transfer(&state.s3, &precision.2, edge)?
            .into_iter()
            .collect();
        Ok(iproduct!(first, second, third)
            .map(|(s1, s2, s3)| CompoundState3 { s1, s2, s3 })
            .into())
    }

    fn merge(
        &self,
        reached: &mut Self::State,
        new: &Self::State,
        precision: &Self::Precision,
    ) -> Result<MergeOutcome> {
        let Some((s1, o1)) = merge_component(&self.0, &reached.s1, &new.s1, &precision.0)? else {
            return Ok(MergeOutcome::NoOp);
        };
        let Some((s2, o2)) = merge_component(&self.1, &reached.s2, &new.s2, &precision.1)? else {
            return Ok(MergeOutcome::NoOp);
        };
        let Some((s3, o3)) = merge_component(&self.2, &reached.s3, &new.s3, &precision.2)? else {
            return Ok(MergeOutcome::NoOp);
        };
        let outcome = o1 + o2 + o3;
        if outcome.merged() {
            *reached = CompoundState3 { s1, s2, s3 };
        }
        Ok(outcome)
    }

    fn covering_index(
        &self,
        state: &Self::State,
        reached: &[&Self::State],
        precision: &Self::Precision,
    ) -> Option<usize> {
        reached.iter().position(|r| {
            component_covers(&self.0, &state.s1, &r.s1, &precision.0)
                && component_covers(&self.1, &state.s2, &r.s2, &precision.1)
                && component_covers(&self.2, &state.s3, &r.s3, &precision.2)
        })
    }

    fn adjust_precision(
        &self,
        state: Self::State,
        precision: &Self::Precision,
        reached: &[&Self::State],
    ) -> Result<Adjustment<Self::State, Self::Precision>> {
        let first: Vec<_> = reached.iter().map(|r| &r.s1).collect();
        let Adjustment::Continue(s1, p1) = self.0.adjust_precision(state.s1, &precision.0, &first)?
        else {
            return Ok(Adjustment::Break);
        };
        let second: Vec<_> = reached.iter().map(|r| &r.s2).collect();
        let Adjustment::Continue(s2, p2) =
            self.1.adjust_precision(state.s2, &precision.1, &second)?
        else {
            return Ok(Adjustment::Break);
        };
        let third: Vec<_> = reached.iter().map(|r| &r.s3).collect();
        let Adjustment::Continue(s3, p3) = self.2.adjust_precision(state.s3, &precision.2, &third)?
        else {
            return Ok(Adjustment::Break);
        };
        Ok(Adjustment::Continue(
            CompoundState3 { s1, s2, s3 },
            (p1, p2, p3),
        ))
    }

    fn reducer(&self) -> impl Reducer<Self::State> {
        CompoundReducer3 {
            r1: self.0.reducer(),
            r2: self.1.reducer(),
            r3: self.2.reducer(),
        }
    }

    fn rank(&self, state: &Self::State) -> i64 {
        self.0
            .rank(&state.s1)
            .saturating_add(self.1.rank(&state.s2))
            .saturating_add(self.2.rank(&state.s3))
    }

    fn validate(&self) -> Result<()> {
        self.0.validate()?;
        self.1.validate()?;
        self.2.validate()
    }
}

use crate::analysis::cpa::lattice::{JoinSemiLattice, product_order};
use crate::analysis::cpa::state::{AbstractState, LocationState, StateDisplay};
use argus_cfa::CfaNodeId;
use std::cmp::Ordering;
use std::fmt::{Formatter, Result as FmtResult};

/// The state of a pair of analyses. `s1` carries the location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundState2<S1, S2> {
    pub s1: S1,
    pub s2: S2,
}

impl<S1: PartialOrd, S2: PartialOrd> PartialOrd for CompoundState2<S1, S2> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        product_order([
            self.s1.partial_cmp(&other.s1),
            self.s2.partial_cmp(&other.s2),
        ])
    }
}

impl<S1: JoinSemiLattice, S2: JoinSemiLattice> JoinSemiLattice for CompoundState2<S1, S2> {
    fn join(&mut self, other: &Self) {
        self.s1.join(&other.s1);
        self.s2.join(&other.s2);
    }
}

impl<S1: StateDisplay, S2: StateDisplay> StateDisplay for CompoundState2<S1, S2> {
    fn fmt_state(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "(")?;
        self.s1.fmt_state(f)?;
        write!(f, ", ")?;
        self.s2.fmt_state(f)?;
        write!(f, ")")
    }
}

impl<S1: AbstractState, S2: AbstractState> AbstractState for CompoundState2<S1, S2> {
    fn supports_join() -> bool {
        S1::supports_join() && S2::supports_join()
    }
}

impl<S1: LocationState, S2: AbstractState> LocationState for CompoundState2<S1, S2> {
    fn location(&self) -> Option<CfaNodeId> {
        self.s1.location()
    }
}

/// The state of a triple of analyses. `s1` carries the location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundState3<S1, S2, S3> {
    pub s1: S1,
    pub s2: S2,
    pub s3: S3,
}

impl<S1: PartialOrd, S2: PartialOrd, S3: PartialOrd> PartialOrd for CompoundState3<S1, S2, S3> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        product_order([
            self.s1.partial_cmp(&other.s1),
            self.s2.partial_cmp(&other.s2),
            self.s3.partial_cmp(&other.s3),
        ])
    }
}

impl<S1: JoinSemiLattice, S2: JoinSemiLattice, S3: JoinSemiLattice> JoinSemiLattice
    for CompoundState3<S1, S2, S3>
{
    fn join(&mut self, other: &Self) {
        self.s1.join(&other.s1);
        self.s2.join(&other.s2);
        self.s3.join(&other.s3);
    }
}

impl<S1: StateDisplay, S2: StateDisplay, S3: StateDisplay> StateDisplay
    for CompoundState3<S1, S2, S3>
{
    fn fmt_state(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "(")?;
        self.s1.fmt_state(f)?;
        write!(f, ", ")?;
        self.s2.fmt_state(f)?;
        write!(f, ", ")?;
        self.s3.fmt_state(f)?;
        write!(f, ")")
    }
}

impl<S1: AbstractState, S2: AbstractState, S3: AbstractState> AbstractState
    for CompoundState3<S1, S2, S3>
{
    fn supports_join() -> bool {
        S1::supports_join() && S2::supports_join() && S3::supports_join()
    }
}

impl<S1: LocationState, S2: AbstractState, S3: AbstractState> LocationState
    for CompoundState3<S1, S2, S3>
{
    fn location(&self) -> Option<CfaNodeId> {
        self.s1.location()
    }
}

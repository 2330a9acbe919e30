use crate::analysis::cpa::lattice::JoinSemiLattice;
use crate::analysis::cpa::lattice::flat::FlatLattice;
use crate::analysis::cpa::state::{AbstractState, LocationState, StateDisplay, Successor};
use argus_cfa::{CfaEdge, CfaNodeId};
use std::cmp::Ordering;
use std::fmt::Formatter;

/// The program location of a state. Locations are never joined: two states
/// at different locations are incomparable with anything but top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicLocationState {
    inner: FlatLattice<CfaNodeId>,
}

impl BasicLocationState {
    pub fn location(node: CfaNodeId) -> Self {
        Self {
            inner: FlatLattice::Value(node),
        }
    }

    pub fn top() -> Self {
        Self {
            inner: FlatLattice::Top,
        }
    }

    pub fn inner(&self) -> &FlatLattice<CfaNodeId> {
        &self.inner
    }

    /// The state after `edge`, if `edge` leaves this location.
    pub fn transfer<'a>(&self, edge: &CfaEdge) -> Successor<'a, Self> {
        match self.inner {
            FlatLattice::Value(node) if node != edge.predecessor => Successor::empty(),
            _ => Successor::single(Self::location(edge.successor)),
        }
    }
}

impl From<CfaNodeId> for BasicLocationState {
    fn from(node: CfaNodeId) -> Self {
        Self::location(node)
    }
}

impl PartialOrd for BasicLocationState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.inner.partial_cmp(&other.inner)
    }
}

impl JoinSemiLattice for BasicLocationState {
    fn join(&mut self, other: &Self) {
        self.inner.join(&other.inner);
    }
}

impl StateDisplay for BasicLocationState {
    fn fmt_state(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.inner)
    }
}

impl AbstractState for BasicLocationState {
    fn supports_join() -> bool {
        false
    }
}

impl LocationState for BasicLocationState {
    fn location(&self) -> Option<CfaNodeId> {
        self.inner.value().copied()
    }
}

use crate::analysis::cpa::lattice::JoinSemiLattice;
use crate::analysis::cpa::state::{AbstractState, StateDisplay};
use std::cmp::{Ordering, Reverse};
use std::fmt::Formatter;

/// Counts the assumptions taken on a path.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct BranchCountState {
    pub branch_count: usize,
    max_count: usize,
}

impl BranchCountState {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count,
            branch_count: 0,
        }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn exceeded(&self) -> bool {
        self.branch_count > self.max_count
    }

    pub(crate) fn step(&self) -> Self {
        Self {
            branch_count: self.branch_count + 1,
            max_count: self.max_count,
        }
    }
}

impl PartialOrd for BranchCountState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.max_count != other.max_count {
            return None;
        }
        // fewer branches reach more, so a lower count is greater in the lattice
        Reverse(self.branch_count).partial_cmp(&Reverse(other.branch_count))
    }
}

impl JoinSemiLattice for BranchCountState {
    fn join(&mut self, other: &Self) {
        self.branch_count = self.branch_count.min(other.branch_count);
    }
}

impl StateDisplay for BranchCountState {
    fn fmt_state(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}/{}", self.branch_count, self.max_count)
    }
}

impl AbstractState for BranchCountState {}

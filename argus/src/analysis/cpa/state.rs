use crate::analysis::cpa::lattice::JoinSemiLattice;
use argus_cfa::CfaNodeId;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::ops::{Add, AddAssign};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MergeOutcome {
    NoOp,
    Merged,
}

impl MergeOutcome {
    pub fn merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged)
    }
}

impl Add for MergeOutcome {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::NoOp, Self::NoOp) => Self::NoOp,
            _ => Self::Merged,
        }
    }
}

impl AddAssign for MergeOutcome {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs
    }
}

/// The successors produced by a transfer: none when the edge is infeasible,
/// usually one, several for nondeterministic domains.
pub struct Successor<'a, T>(Box<dyn Iterator<Item = T> + 'a>);

impl<'a, T: 'a> Successor<'a, T> {
    pub fn empty() -> Self {
        Self(Box::new(std::iter::empty()))
    }

    pub fn single(value: T) -> Self {
        Self(Box::new(std::iter::once(value)))
    }
}

impl<'a, T> IntoIterator for Successor<'a, T> {
    type Item = T;
    type IntoIter = Box<dyn Iterator<Item = T> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0
    }
}

impl<'a, T, I> From<I> for Successor<'a, T>
where
    I: Iterator<Item = T> + 'a,
{
    fn from(value: I) -> Self {
        Self(Box::new(value))
    }
}

impl<T> Debug for Successor<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Successor { .. }")
    }
}

/// Local trait for formatting abstract states.
///
/// Used instead of `Display` on `AbstractState` to avoid coherence issues
/// with the generic tuple impls.
pub trait StateDisplay {
    fn fmt_state(&self, f: &mut Formatter<'_>) -> FmtResult;
}

/// Adapts any [`StateDisplay`] to [`Display`] for use in format strings.
pub struct StateDisplayWrapper<'a, S: ?Sized>(pub &'a S);

impl<S: StateDisplay + ?Sized> Display for StateDisplayWrapper<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt_state(f)
    }
}

/// Implements `StateDisplay` for a concrete type by delegating to `Debug`.
#[macro_export]
macro_rules! impl_state_display_via_debug {
    ($ty:ty) => {
        impl $crate::analysis::cpa::state::StateDisplay for $ty {
            fn fmt_state(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{self:?}")
            }
        }
    };
}

/// Core trait for abstract states explored by a CPA.
///
/// States are immutable once they are part of the ARG; merging works on a
/// copy which the algorithm then commits as a new ARG node.
pub trait AbstractState: JoinSemiLattice + Clone + Debug + StateDisplay {
    /// Whether `join` is meaningful for this domain. Domains returning `false`
    /// may only be combined with separate merge.
    fn supports_join() -> bool
    where
        Self: Sized,
    {
        true
    }

    /// Join `new_state` into `self`, reporting whether `self` changed.
    fn merge_join(&mut self, new_state: &Self) -> MergeOutcome {
        if new_state.is_less_or_equal(self) {
            MergeOutcome::NoOp
        } else {
            self.join(new_state);
            MergeOutcome::Merged
        }
    }

    fn merge_sep(&mut self, _: &Self) -> MergeOutcome {
        MergeOutcome::NoOp
    }

    /// Index of the first element of `states` equal to `self`.
    fn stop_sep<'a, T: Iterator<Item = &'a Self>>(&self, mut states: T) -> Option<usize>
    where
        Self: 'a,
    {
        states.position(|s| s == self)
    }

    /// Index of the first element of `states` that subsumes `self`.
    fn stop_join<'a, T: Iterator<Item = &'a Self>>(&self, mut states: T) -> Option<usize>
    where
        Self: 'a,
    {
        states.position(|s| self.is_less_or_equal(s))
    }
}

/// States that know their program location.
pub trait LocationState: AbstractState {
    fn location(&self) -> Option<CfaNodeId>;
}

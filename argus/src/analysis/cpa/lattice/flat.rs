use crate::analysis::cpa::lattice::JoinSemiLattice;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Distinct values are incomparable; `Top` lies above all of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FlatLattice<C> {
    Value(C),
    Top,
}

impl<C> FlatLattice<C> {
    pub fn is_top(&self) -> bool {
        matches!(self, FlatLattice::Top)
    }

    pub fn value(&self) -> Option<&C> {
        match self {
            FlatLattice::Value(c) => Some(c),
            FlatLattice::Top => None,
        }
    }
}

impl<C> From<C> for FlatLattice<C> {
    fn from(value: C) -> Self {
        FlatLattice::Value(value)
    }
}

impl<C: Display> Display for FlatLattice<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value() {
            Some(c) => c.fmt(f),
            None => f.write_str("⊤"),
        }
    }
}

impl<C: PartialEq> PartialOrd for FlatLattice<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self.is_top(), other.is_top()) {
            (true, _) => Some(Ordering::Greater),
            (_, true) => Some(Ordering::Less),
            _ => None,
        }
    }
}

impl<C: Eq> JoinSemiLattice for FlatLattice<C> {
    fn join(&mut self, other: &Self) {
        if self != other {
            *self = FlatLattice::Top;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cpa::lattice::laws::check_lattice_laws;

    #[test]
    fn test_distinct_values_join_to_top() {
        let four = FlatLattice::from(4u64);
        let five = FlatLattice::from(5u64);
        assert_eq!(four.partial_cmp(&five), None);
        assert!(FlatLattice::Top > four);

        let mut joined = four;
        joined.join(&four);
        assert_eq!(joined, four);
        joined.join(&five);
        assert!(joined.is_top());
        assert_eq!(joined.to_string(), "⊤");
        check_lattice_laws(&[four, five, FlatLattice::Top]);
    }
}

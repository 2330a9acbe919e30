pub mod flat;

use std::cmp::Ordering;

/// A join semi-lattice whose partial order is given by [`PartialOrd`].
///
/// `join` must produce an upper bound of both operands, and the order must be
/// reflexive and transitive.
pub trait JoinSemiLattice: Eq + PartialOrd {
    fn join(&mut self, other: &Self);

    fn is_less_or_equal(&self, other: &Self) -> bool {
        matches!(
            self.partial_cmp(other),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }
}

/// The ordering of two values under the product order of their components.
///
/// Feed it one component ordering at a time; `None` as soon as two components
/// disagree on direction or any pair is incomparable.
pub(crate) fn product_order<I: IntoIterator<Item = Option<Ordering>>>(
    components: I,
) -> Option<Ordering> {
    let mut acc = Ordering::Equal;
    for ord in components {
        match (acc, ord?) {
            (_, Ordering::Equal) => {}
            (Ordering::Equal, o) => acc = o,
            (a, o) if a == o => {}
            _ => return None,
        }
    }
    Some(acc)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_order() {
        use Ordering::*;
        assert_eq!(product_order([Some(Equal), Some(Equal)]), Some(Equal));
        assert_eq!(product_order([Some(Less), Some(Equal)]), Some(Less));
        assert_eq!(product_order([Some(Equal), Some(Greater)]), Some(Greater));
        assert_eq!(product_order([Some(Less), Some(Greater)]), None);
        assert_eq!(product_order([Some(Less), None]), None);
    }
}

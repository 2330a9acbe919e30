use argus_cfa::CmpOp;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A closed integer interval. `None` bounds are unbounded.
///
/// The empty interval is not representable; operations that could produce
/// it return `Option<Interval>` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    lo: Option<i64>,
    hi: Option<i64>,
}

impl Interval {
    pub const TOP: Interval = Interval { lo: None, hi: None };

    pub fn new(lo: Option<i64>, hi: Option<i64>) -> Option<Self> {
        match (lo, hi) {
            (Some(l), Some(h)) if l > h => None,
            _ => Some(Self { lo, hi }),
        }
    }

    pub fn constant(value: i64) -> Self {
        Self {
            lo: Some(value),
            hi: Some(value),
        }
    }

    pub fn lo(&self) -> Option<i64> {
        self.lo
    }

    pub fn hi(&self) -> Option<i64> {
        self.hi
    }

    pub fn is_top(&self) -> bool {
        self.lo.is_none() && self.hi.is_none()
    }

    pub fn as_constant(&self) -> Option<i64> {
        match (self.lo, self.hi) {
            (Some(l), Some(h)) if l == h => Some(l),
            _ => None,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo.is_none_or(|l| l <= value) && self.hi.is_none_or(|h| value <= h)
    }

    /// Whether every value of `other` is in `self`.
    pub fn includes(&self, other: &Interval) -> bool {
        let lo_ok = match (self.lo, other.lo) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a <= b,
        };
        let hi_ok = match (self.hi, other.hi) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => b <= a,
        };
        lo_ok && hi_ok
    }

    /// The smallest interval containing both.
    pub fn hull(&self, other: &Interval) -> Interval {
        Interval {
            lo: self.lo.zip(other.lo).map(|(a, b)| a.min(b)),
            hi: self.hi.zip(other.hi).map(|(a, b)| a.max(b)),
        }
    }

    /// Drops every bound of `self` that `next` exceeds.
    pub fn widen(&self, next: &Interval) -> Interval {
        let lo = match (self.lo, next.lo) {
            (Some(a), Some(b)) if a <= b => Some(a),
            _ => None,
        };
        let hi = match (self.hi, next.hi) {
            (Some(a), Some(b)) if b <= a => Some(a),
            _ => None,
        };
        Interval { lo, hi }
    }

    pub fn meet(&self, other: &Interval) -> Option<Interval> {
        let lo = match (self.lo, other.lo) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let hi = match (self.hi, other.hi) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Interval::new(lo, hi)
    }

    pub fn add(&self, other: &Interval) -> Interval {
        Interval {
            lo: self.lo.zip(other.lo).and_then(|(a, b)| a.checked_add(b)),
            hi: self.hi.zip(other.hi).and_then(|(a, b)| a.checked_add(b)),
        }
    }

    pub fn neg(&self) -> Interval {
        Interval {
            lo: self.hi.and_then(i64::checked_neg),
            hi: self.lo.and_then(i64::checked_neg),
        }
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        let (Some(a), Some(b), Some(c), Some(d)) = (self.lo, self.hi, other.lo, other.hi) else {
            return Interval::TOP;
        };
        let products = [a.checked_mul(c), a.checked_mul(d), b.checked_mul(c), b.checked_mul(d)];
        if products.iter().any(Option::is_none) {
            return Interval::TOP;
        }
        let products = products.into_iter().flatten();
        Interval {
            lo: products.clone().min(),
            hi: products.max(),
        }
    }

    /// Narrows `left` and `right` to the values satisfying `left op right`.
    /// `None` if no pair does.
    pub fn constrain(op: CmpOp, left: &Interval, right: &Interval) -> Option<(Interval, Interval)> {
        match op {
            CmpOp::Eq => {
                let both = left.meet(right)?;
                Some((both, both))
            }
            CmpOp::Ne => match (left.as_constant(), right.as_constant()) {
                (Some(a), Some(b)) if a == b => None,
                _ => Some((*left, *right)),
            },
            CmpOp::Le => {
                let l = left.meet(&Interval {
                    lo: None,
                    hi: right.hi,
                })?;
                let r = right.meet(&Interval {
                    lo: left.lo,
                    hi: None,
                })?;
                Some((l, r))
            }
            CmpOp::Lt => {
                let l = left.meet(&Interval {
                    lo: None,
                    hi: right.hi.map(|h| h.saturating_sub(1)),
                })?;
                let r = right.meet(&Interval {
                    lo: left.lo.map(|l| l.saturating_add(1)),
                    hi: None,
                })?;
                Some((l, r))
            }
            CmpOp::Ge | CmpOp::Gt => {
                let (r, l) = Interval::constrain(op.flip(), right, left)?;
                Some((l, r))
            }
        }
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (other.includes(self), self.includes(other)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(c) = self.as_constant() {
            return write!(f, "{c}");
        }
        match self.lo {
            Some(l) => write!(f, "[{l}, ")?,
            None => write!(f, "(-inf, ")?,
        }
        match self.hi {
            Some(h) => write!(f, "{h}]"),
            None => write!(f, "+inf)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(lo: i64, hi: i64) -> Interval {
        Interval::new(Some(lo), Some(hi)).unwrap()
    }

    #[test]
    fn test_order_is_inclusion() {
        assert!(range(1, 2) < range(0, 3));
        assert!(range(0, 3) < Interval::TOP);
        assert_eq!(range(0, 1).partial_cmp(&range(2, 3)), None);
        assert_eq!(range(1, 1), Interval::constant(1));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(range(1, 2).add(&range(10, 20)), range(11, 22));
        assert_eq!(range(1, 2).sub(&range(10, 20)), range(-19, -8));
        assert_eq!(range(-2, 3).mul(&range(4, 5)), range(-10, 15));
        assert!(Interval::constant(i64::MAX).add(&Interval::constant(1)).hi().is_none());
        assert!(range(0, 1).mul(&Interval::TOP).is_top());
    }

    #[test]
    fn test_constrain() {
        let x = range(0, 10);
        let five = Interval::constant(5);
        assert_eq!(Interval::constrain(CmpOp::Eq, &x, &five), Some((five, five)));
        assert_eq!(Interval::constrain(CmpOp::Lt, &x, &five), Some((range(0, 4), five)));
        assert_eq!(Interval::constrain(CmpOp::Gt, &x, &five), Some((range(6, 10), five)));
        assert_eq!(Interval::constrain(CmpOp::Ge, &x, &five), Some((range(5, 10), five)));
        assert_eq!(Interval::constrain(CmpOp::Eq, &Interval::constant(2), &five), None);
        assert_eq!(Interval::constrain(CmpOp::Ne, &five, &five), None);
        assert_eq!(Interval::constrain(CmpOp::Gt, &Interval::constant(2), &five), None);
    }

    #[test]
    fn test_widen_drops_growing_bounds() {
        assert_eq!(
            Interval::constant(0).widen(&Interval::constant(1)),
            Interval::new(Some(0), None).unwrap()
        );
        assert_eq!(range(0, 5).widen(&range(1, 2)), range(0, 5));
    }
}

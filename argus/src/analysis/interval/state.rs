use crate::analysis::cpa::lattice::JoinSemiLattice;
use crate::analysis::cpa::state::{AbstractState, StateDisplay};
use crate::analysis::interval::value::Interval;
use argus_cfa::{Condition, Expr, Variable};
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Formatter;

/// An interval per variable. Variables without an entry are unconstrained;
/// entries are never top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntervalState {
    values: BTreeMap<Variable, Interval>,
}

impl IntervalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &Variable) -> Interval {
        self.values.get(var).copied().unwrap_or(Interval::TOP)
    }

    pub fn set(&mut self, var: Variable, value: Interval) {
        if value.is_top() {
            self.values.remove(&var);
        } else {
            self.values.insert(var, value);
        }
    }

    pub fn forget(&mut self, var: &Variable) {
        self.values.remove(var);
    }

    pub fn retain<F: FnMut(&Variable) -> bool>(&mut self, mut keep: F) {
        self.values.retain(|v, _| keep(v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Interval)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn eval(&self, expr: &Expr) -> Interval {
        match expr {
            Expr::Const(c) => Interval::constant(*c),
            Expr::Var(v) => self.get(v),
            Expr::Add(l, r) => self.eval(l).add(&self.eval(r)),
            Expr::Sub(l, r) => self.eval(l).sub(&self.eval(r)),
            Expr::Mul(l, r) => self.eval(l).mul(&self.eval(r)),
            Expr::Neg(e) => self.eval(e).neg(),
        }
    }

    /// The state restricted to values satisfying `cond`, or `None` if none
    /// do. Only variables standing alone on either side are narrowed.
    pub fn assume(&self, cond: &Condition) -> Option<Self> {
        let left = self.eval(&cond.lhs);
        let right = self.eval(&cond.rhs);
        let (left, right) = Interval::constrain(cond.op, &left, &right)?;
        let mut next = self.clone();
        if let Some(v) = cond.lhs.as_var() {
            next.set(v, left);
        }
        if let Some(v) = cond.rhs.as_var() {
            let narrowed = next.get(&v).meet(&right)?;
            next.set(v, narrowed);
        }
        Some(next)
    }

    /// Pointwise widening of `self` by `next`.
    pub fn widen(&self, next: &Self) -> Self {
        let mut out = Self::new();
        for (v, value) in &self.values {
            out.set(*v, value.widen(&next.get(v)));
        }
        out
    }
}

impl PartialOrd for IntervalState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let le = other.values.iter().all(|(v, i)| self.get(v) <= *i);
        let ge = self.values.iter().all(|(v, i)| other.get(v) <= *i);
        match (le, ge) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl JoinSemiLattice for IntervalState {
    fn join(&mut self, other: &Self) {
        let joined = self
            .values
            .iter()
            .filter_map(|(v, i)| other.values.get(v).map(|o| (*v, i.hull(o))))
            .filter(|(_, i)| !i.is_top())
            .collect();
        self.values = joined;
    }
}

impl StateDisplay for IntervalState {
    fn fmt_state(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.values
                .iter()
                .map(|(v, i)| format!("{v}: {i}"))
                .join(", ")
        )
    }
}

impl AbstractState for IntervalState {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cpa::lattice::laws::check_lattice_laws;
    use argus_cfa::CmpOp;

    fn state(entries: &[(&str, Interval)]) -> IntervalState {
        let mut s = IntervalState::new();
        for (name, value) in entries {
            s.set(Variable::new(name), *value);
        }
        s
    }

    #[test]
    fn test_missing_is_top() {
        let x = Variable::new("x");
        let mut s = state(&[("x", Interval::constant(3))]);
        s.set(x, Interval::TOP);
        assert!(s.is_empty());
        assert_eq!(s, IntervalState::new());
    }

    #[test]
    fn test_lattice_laws() {
        let range = |l, h| Interval::new(Some(l), Some(h)).unwrap();
        check_lattice_laws(&[
            IntervalState::new(),
            state(&[("x", Interval::constant(0))]),
            state(&[("x", range(0, 4))]),
            state(&[("x", range(0, 4)), ("y", Interval::constant(1))]),
            state(&[("y", range(-3, 3))]),
        ]);
    }

    #[test]
    fn test_assume_narrows_variables() {
        let x = Variable::new("x");
        let s = state(&[("x", Interval::new(Some(0), Some(10)).unwrap())]);
        let cond = Condition::new(Expr::var(x), CmpOp::Lt, 3i64);
        let narrowed = s.assume(&cond).unwrap();
        assert_eq!(narrowed.get(&x), Interval::new(Some(0), Some(2)).unwrap());
        let impossible = Condition::new(Expr::var(x), CmpOp::Gt, 10i64);
        assert_eq!(s.assume(&impossible), None);
        let flipped = Condition::new(5i64, CmpOp::Eq, Expr::var(x));
        assert_eq!(s.assume(&flipped).unwrap().get(&x), Interval::constant(5));
    }
}

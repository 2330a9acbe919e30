//! Explicit-value refinement support for the interval analysis.
//!
//! Counterexamples are replayed with concrete values where they are known;
//! interpolants are partial assignments naming the variables the analysis
//! must start tracking.

use crate::error::{ArgusError, Result};
use crate::refinement::feasibility::StrongestPost;
use crate::refinement::interpolant::{Interpolant, InterpolantManager};
use argus_cfa::{CfaEdge, CmpOp, EdgeKind, Expr, Variable};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Known values of some variables. Absent variables may hold anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueAssignment(BTreeMap<Variable, i64>);

impl ValueAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &Variable) -> Option<i64> {
        self.0.get(var).copied()
    }

    pub fn set(&mut self, var: Variable, value: i64) {
        self.0.insert(var, value);
    }

    pub fn forget(&mut self, var: &Variable) {
        self.0.remove(var);
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value of `expr`, if every variable in it is known and no
    /// operation overflows.
    pub fn eval(&self, expr: &Expr) -> Option<i64> {
        match expr {
            Expr::Const(c) => Some(*c),
            Expr::Var(v) => self.get(v),
            Expr::Add(l, r) => self.eval(l)?.checked_add(self.eval(r)?),
            Expr::Sub(l, r) => self.eval(l)?.checked_sub(self.eval(r)?),
            Expr::Mul(l, r) => self.eval(l)?.checked_mul(self.eval(r)?),
            Expr::Neg(e) => self.eval(e)?.checked_neg(),
        }
    }
}

impl<const N: usize> From<[(Variable, i64); N]> for ValueAssignment {
    fn from(entries: [(Variable, i64); N]) -> Self {
        Self(entries.into_iter().collect())
    }
}

impl Display for ValueAssignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.0.iter().map(|(v, c)| format!("{v} = {c}")).join(", ")
        )
    }
}

/// Strongest post over partial assignments.
///
/// An assumption is infeasible only when both of its sides are known and
/// the comparison fails. An equality between an unknown variable and a known
/// value assigns the variable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValuePost;

impl StrongestPost for ValuePost {
    type State = ValueAssignment;

    fn initial_state(&self) -> Self::State {
        ValueAssignment::new()
    }

    fn post(&self, state: &Self::State, edge: &CfaEdge) -> Result<Option<Self::State>> {
        let mut next = state.clone();
        match &edge.kind {
            EdgeKind::Blank => {}
            EdgeKind::Assign { var, expr } => match state.eval(expr) {
                Some(value) => next.set(*var, value),
                None => next.forget(var),
            },
            EdgeKind::Havoc { var } => next.forget(var),
            EdgeKind::Assume(cond) => {
                match (state.eval(&cond.lhs), state.eval(&cond.rhs)) {
                    (Some(l), Some(r)) => {
                        if !cond.op.holds(l, r) {
                            return Ok(None);
                        }
                    }
                    (None, Some(r)) if cond.op == CmpOp::Eq => {
                        if let Some(v) = cond.lhs.as_var() {
                            next.set(v, r);
                        }
                    }
                    (Some(l), None) if cond.op == CmpOp::Eq => {
                        if let Some(v) = cond.rhs.as_var() {
                            next.set(v, l);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(Some(next))
    }

    fn keys(&self, state: &Self::State) -> Vec<Variable> {
        state.variables().copied().collect()
    }

    fn forget(&self, state: &mut Self::State, key: &Variable) {
        state.forget(key);
    }
}

/// A partial assignment that must hold at an ARG state, or `False` if the
/// state is unreachable. The empty assignment is TRUE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueInterpolant {
    False,
    Values(BTreeMap<Variable, i64>),
}

impl Interpolant for ValueInterpolant {
    type State = ValueAssignment;

    fn join(&self, other: &Self) -> Result<Self> {
        let (ValueInterpolant::Values(left), ValueInterpolant::Values(right)) = (self, other)
        else {
            return Ok(ValueInterpolant::False);
        };
        let mut joined = left.clone();
        for (var, value) in right {
            match joined.insert(*var, *value) {
                Some(previous) if previous != *value => {
                    return Err(ArgusError::InterpolantInconsistency {
                        variable: var.to_string(),
                        left: previous.to_string(),
                        right: value.to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(ValueInterpolant::Values(joined))
    }

    fn is_true(&self) -> bool {
        matches!(self, ValueInterpolant::Values(v) if v.is_empty())
    }

    fn is_false(&self) -> bool {
        matches!(self, ValueInterpolant::False)
    }

    fn reconstruct_state(&self) -> Option<Self::State> {
        match self {
            ValueInterpolant::False => None,
            ValueInterpolant::Values(values) => Some(ValueAssignment(values.clone())),
        }
    }

    fn variables(&self) -> BTreeSet<Variable> {
        match self {
            ValueInterpolant::False => BTreeSet::new(),
            ValueInterpolant::Values(values) => values.keys().copied().collect(),
        }
    }
}

impl Display for ValueInterpolant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueInterpolant::False => write!(f, "false"),
            ValueInterpolant::Values(v) if v.is_empty() => write!(f, "true"),
            ValueInterpolant::Values(v) => write!(
                f,
                "{}",
                v.iter().map(|(var, c)| format!("{var} = {c}")).join(" && ")
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ValueInterpolantManager;

impl InterpolantManager for ValueInterpolantManager {
    type State = ValueAssignment;
    type Interpolant = ValueInterpolant;

    fn create_interpolant(&self, state: &Self::State) -> Self::Interpolant {
        ValueInterpolant::Values(state.0.clone())
    }

    fn true_interpolant(&self) -> Self::Interpolant {
        ValueInterpolant::Values(BTreeMap::new())
    }

    fn false_interpolant(&self) -> Self::Interpolant {
        ValueInterpolant::False
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_cfa::{CfaBuilder, CfaEdge};

    fn edges(kinds: Vec<EdgeKind>) -> Vec<CfaEdge> {
        let mut b = CfaBuilder::new();
        b.variable("v");
        b.variable("w");
        let mut prev = b.node("N0");
        let entry = prev;
        let mut ids = Vec::new();
        for (i, kind) in kinds.into_iter().enumerate() {
            let next = b.node(format!("N{}", i + 1));
            ids.push(b.edge(prev, next, kind).unwrap());
            prev = next;
        }
        let cfa = b.build(entry).unwrap();
        ids.into_iter().map(|id| cfa.edge(id).unwrap().clone()).collect()
    }

    #[test]
    fn test_post_decides_known_assumptions() {
        let path = edges(vec![
            EdgeKind::assign("v", 0i64),
            EdgeKind::assign("v", Expr::add(Expr::var("v"), 1i64.into())),
            EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 5i64),
        ]);
        let post = ValuePost;
        let s1 = post.post(&post.initial_state(), &path[0]).unwrap().unwrap();
        let s2 = post.post(&s1, &path[1]).unwrap().unwrap();
        assert_eq!(s2.get(&Variable::new("v")), Some(1));
        assert_eq!(post.post(&s2, &path[2]).unwrap(), None);
        // unknown operands leave the assumption open and learn from equality
        let learned = post.post(&ValueAssignment::new(), &path[2]).unwrap().unwrap();
        assert_eq!(learned.get(&Variable::new("v")), Some(5));
    }

    #[test]
    fn test_post_forgets_on_havoc_and_overflow() {
        let path = edges(vec![
            EdgeKind::assign("w", i64::MAX),
            EdgeKind::assign("w", Expr::add(Expr::var("w"), 1i64.into())),
            EdgeKind::assign("v", 3i64),
            EdgeKind::havoc("v"),
        ]);
        let post = ValuePost;
        let mut state = post.initial_state();
        for edge in &path {
            state = post.post(&state, edge).unwrap().unwrap();
        }
        assert!(state.is_empty());
    }

    #[test]
    fn test_true_and_false_identities() {
        let manager = ValueInterpolantManager;
        let x = ValueInterpolant::Values(BTreeMap::from([(Variable::new("v"), 2)]));
        let t = manager.true_interpolant();
        let f = manager.false_interpolant();
        assert!(t.is_true() && !t.is_false());
        assert!(f.is_false() && !f.is_true());
        assert_eq!(manager.create_initial(), t);
        assert_eq!(t.join(&x).unwrap(), x);
        assert_eq!(x.join(&t).unwrap(), x);
        assert_eq!(f.join(&x).unwrap(), f);
        assert_eq!(x.join(&f).unwrap(), f);
        assert_eq!(f.reconstruct_state(), None);
        assert_eq!(t.reconstruct_state(), Some(ValueAssignment::new()));
    }

    #[test]
    fn test_conflicting_join_is_flagged() {
        let v = Variable::new("v");
        let a = ValueInterpolant::Values(BTreeMap::from([(v, 1)]));
        let b = ValueInterpolant::Values(BTreeMap::from([(v, 2)]));
        let err = a.join(&b).unwrap_err();
        assert!(matches!(err, ArgusError::InterpolantInconsistency { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::EngineInvariant);
    }
}

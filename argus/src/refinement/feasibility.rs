use crate::error::Result;
use argus_cfa::{CfaEdge, Variable};
use std::fmt::Debug;

/// A precise-enough post operator used to replay counterexamples.
pub trait StrongestPost {
    type State: Clone + Debug;

    fn initial_state(&self) -> Self::State;

    /// The state after `edge`, or `None` if `edge` cannot be taken.
    fn post(&self, state: &Self::State, edge: &CfaEdge) -> Result<Option<Self::State>>;

    /// The variables `state` constrains, in a stable order.
    fn keys(&self, state: &Self::State) -> Vec<Variable>;

    /// Drops whatever `state` knows about `key`.
    fn forget(&self, state: &mut Self::State, key: &Variable);
}

/// Replays edge sequences through a [`StrongestPost`].
pub struct FeasibilityChecker<'a, P> {
    post: &'a P,
}

impl<'a, P: StrongestPost> FeasibilityChecker<'a, P> {
    pub fn new(post: &'a P) -> Self {
        Self { post }
    }

    pub fn is_feasible(&self, edges: &[CfaEdge]) -> Result<bool> {
        self.is_feasible_from(&self.post.initial_state(), edges)
    }

    pub fn is_feasible_from(&self, state: &P::State, edges: &[CfaEdge]) -> Result<bool> {
        Ok(self.first_infeasible_from(state, edges)?.is_none())
    }

    /// Index of the first edge of `edges` that cannot be taken.
    pub fn first_infeasible(&self, edges: &[CfaEdge]) -> Result<Option<usize>> {
        self.first_infeasible_from(&self.post.initial_state(), edges)
    }

    pub fn first_infeasible_from(
        &self,
        state: &P::State,
        edges: &[CfaEdge],
    ) -> Result<Option<usize>> {
        let mut current = state.clone();
        for (i, edge) in edges.iter().enumerate() {
            match self.post.post(&current, edge)? {
                Some(next) => current = next,
                None => return Ok(Some(i)),
            }
        }
        Ok(None)
    }

    /// The states along `edges` up to the first infeasible edge.
    pub fn states(&self, edges: &[CfaEdge]) -> Result<Vec<P::State>> {
        let mut states = vec![self.post.initial_state()];
        for edge in edges {
            let Some(last) = states.last() else {
                break;
            };
            match self.post.post(last, edge)? {
                Some(next) => states.push(next),
                None => break,
            }
        }
        Ok(states)
    }
}

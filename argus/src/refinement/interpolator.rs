use crate::error::Result;
use crate::refinement::feasibility::{FeasibilityChecker, StrongestPost};
use crate::refinement::interpolant::{Interpolant, InterpolantManager};
use argus_cfa::CfaEdge;
use tracing::trace;

/// Computes interpolants along infeasible edge sequences.
///
/// Interpolants are obtained from strongest-post states by forgetting every
/// variable whose value is not needed to keep the rest of the sequence
/// infeasible. Variables are tried in the order [`StrongestPost::keys`]
/// reports them.
pub struct EdgeInterpolator<'a, P, M> {
    post: &'a P,
    manager: &'a M,
}

impl<'a, P, M> EdgeInterpolator<'a, P, M>
where
    P: StrongestPost,
    M: InterpolantManager<State = P::State>,
{
    pub fn new(post: &'a P, manager: &'a M) -> Self {
        Self { post, manager }
    }

    pub fn manager(&self) -> &M {
        self.manager
    }

    pub fn checker(&self) -> FeasibilityChecker<'a, P> {
        FeasibilityChecker::new(self.post)
    }

    /// The interpolant after `edge`, given the interpolant `input` before it
    /// and the `suffix` of edges following it.
    pub fn interpolate(
        &self,
        input: &M::Interpolant,
        edge: &CfaEdge,
        suffix: &[CfaEdge],
    ) -> Result<M::Interpolant> {
        if input.is_false() {
            return Ok(self.manager.false_interpolant());
        }
        let Some(state) = input.reconstruct_state() else {
            return Ok(self.manager.false_interpolant());
        };
        let Some(next) = self.post.post(&state, edge)? else {
            return Ok(self.manager.false_interpolant());
        };
        let minimal = self.minimise(next, suffix)?;
        Ok(self.manager.create_interpolant(&minimal))
    }

    /// Forgets every key of `state` the infeasibility of `suffix` does not
    /// depend on. A state from which `suffix` is feasible is returned as is.
    fn minimise(&self, mut state: P::State, suffix: &[CfaEdge]) -> Result<P::State> {
        let checker = self.checker();
        if checker.is_feasible_from(&state, suffix)? {
            return Ok(state);
        }
        for key in self.post.keys(&state) {
            let mut weaker = state.clone();
            self.post.forget(&mut weaker, &key);
            if !checker.is_feasible_from(&weaker, suffix)? {
                trace!("`{key}` is irrelevant to the suffix");
                state = weaker;
            }
        }
        Ok(state)
    }

    /// Interpolants for every position of `edges`, forward from TRUE.
    ///
    /// The result has one more element than `edges`: the first is for the
    /// state before `edges[0]`.
    pub fn top_down(&self, edges: &[CfaEdge]) -> Result<Vec<M::Interpolant>> {
        let mut interpolants = vec![self.manager.create_initial()];
        for (i, edge) in edges.iter().enumerate() {
            let Some(previous) = interpolants.last() else {
                break;
            };
            let next = self.interpolate(previous, edge, &edges[i + 1..])?;
            interpolants.push(next);
        }
        Ok(interpolants)
    }

    /// Interpolants computed backward from the first infeasible edge.
    ///
    /// The concrete states along `edges` are minimised last to first. A key
    /// of the state before `edges[i]` may be forgotten if the failing edge
    /// stays unreachable when every later state is projected onto the
    /// variables of the interpolant already computed for it. Positions after
    /// the failing edge are FALSE. A feasible sequence yields its concrete
    /// states unchanged.
    pub fn bottom_up(&self, edges: &[CfaEdge]) -> Result<Vec<M::Interpolant>> {
        let states = self.checker().states(edges)?;
        let failing = states.len().saturating_sub(1);
        if failing >= edges.len() {
            let mut interpolants = vec![self.manager.create_initial()];
            interpolants.extend(states[1..].iter().map(|s| self.manager.create_interpolant(s)));
            return Ok(interpolants);
        }
        let mut interpolants = vec![self.manager.false_interpolant(); edges.len() + 1];
        interpolants[0] = self.manager.create_initial();
        for i in (1..=failing).rev() {
            let minimal = self.minimise_backward(
                states[i].clone(),
                &edges[i..=failing],
                &interpolants[i + 1..=failing],
            )?;
            interpolants[i] = self.manager.create_interpolant(&minimal);
        }
        Ok(interpolants)
    }

    fn minimise_backward(
        &self,
        mut state: P::State,
        edges: &[CfaEdge],
        later: &[M::Interpolant],
    ) -> Result<P::State> {
        for key in self.post.keys(&state) {
            let mut weaker = state.clone();
            self.post.forget(&mut weaker, &key);
            if self.projected_infeasible(&weaker, edges, later)? {
                trace!("`{key}` is not needed before {}", edges[0].id);
                state = weaker;
            }
        }
        Ok(state)
    }

    /// Whether `edges` cannot be taken from `state` when the state after
    /// `edges[j]` only keeps the variables of `later[j]`.
    fn projected_infeasible(
        &self,
        state: &P::State,
        edges: &[CfaEdge],
        later: &[M::Interpolant],
    ) -> Result<bool> {
        let mut current = state.clone();
        for (j, edge) in edges.iter().enumerate() {
            let Some(mut next) = self.post.post(&current, edge)? else {
                return Ok(true);
            };
            if let Some(interpolant) = later.get(j) {
                let keep = interpolant.variables();
                for key in self.post.keys(&next) {
                    if !keep.contains(&key) {
                        self.post.forget(&mut next, &key);
                    }
                }
            }
            current = next;
        }
        Ok(false)
    }
}

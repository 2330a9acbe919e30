use crate::analysis::arg::{Arg, ArgPath, ArgStateId};
use crate::analysis::cpa::precision::PrecisionIncrement;
use crate::error::{ArgusError, Result};
use crate::refinement::feasibility::StrongestPost;
use crate::refinement::interpolant::{Interpolant, InterpolantManager};
use crate::refinement::interpolator::EdgeInterpolator;
use argus_cfa::CfaEdge;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// How interpolants are computed along each path of the tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationStrategy {
    /// Propagate forward from the root through [`EdgeInterpolator::interpolate`].
    TopDown,
    /// Minimise the concrete states of the path against their suffixes.
    BottomUp,
}

/// One counterexample: an ARG path together with the CFA edges to
/// interpolate along it, which may differ from the path's own edges where
/// a prefix blanked an earlier failing edge.
#[derive(Debug, Clone)]
pub struct TreeBranch {
    pub path: ArgPath,
    pub edges: Vec<CfaEdge>,
}

/// The union of several counterexample paths sharing the ARG root, with one
/// interpolant per ARG state on any of them.
///
/// A state on several paths gets the join of the interpolants each path
/// computes for it. Since join is commutative, the result does not depend
/// on the order of the branches.
#[derive(Debug, Clone)]
pub struct InterpolationTree<I> {
    branches: Vec<TreeBranch>,
    root: ArgStateId,
    interpolants: BTreeMap<ArgStateId, I>,
}

impl<I: Interpolant> InterpolationTree<I> {
    pub fn new(branches: Vec<TreeBranch>) -> Result<Self> {
        let root = branches
            .first()
            .map(|b| b.path.root())
            .ok_or_else(|| ArgusError::invariant("an interpolation tree needs a path"))?;
        for branch in &branches {
            if branch.path.root() != root {
                return Err(ArgusError::invariant(format!(
                    "path to {} does not start at the tree root {root}",
                    branch.path.target()
                )));
            }
            if branch.edges.len() != branch.path.len() {
                return Err(ArgusError::invariant(format!(
                    "path to {} has {} transitions but {} edges to interpolate",
                    branch.path.target(),
                    branch.path.len(),
                    branch.edges.len()
                )));
            }
            let predecessors_agree = branch
                .edges
                .windows(2)
                .all(|w| w[0].successor == w[1].predecessor);
            if !predecessors_agree {
                return Err(ArgusError::invariant(format!(
                    "edges along the path to {} do not form a walk",
                    branch.path.target()
                )));
            }
        }
        Ok(Self {
            branches,
            root,
            interpolants: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> ArgStateId {
        self.root
    }

    pub fn branches(&self) -> &[TreeBranch] {
        &self.branches
    }

    pub fn interpolant(&self, state: ArgStateId) -> Option<&I> {
        self.interpolants.get(&state)
    }

    pub fn interpolants(&self) -> impl Iterator<Item = (&ArgStateId, &I)> {
        self.interpolants.iter()
    }

    /// Computes the interpolants of every branch and joins them per state.
    pub fn compute<P, M>(
        &mut self,
        interpolator: &EdgeInterpolator<'_, P, M>,
        strategy: InterpolationStrategy,
    ) -> Result<()>
    where
        P: StrongestPost,
        M: InterpolantManager<State = P::State, Interpolant = I>,
    {
        self.interpolants.clear();
        for branch in &self.branches {
            let along = match strategy {
                InterpolationStrategy::TopDown => interpolator.top_down(&branch.edges)?,
                InterpolationStrategy::BottomUp => interpolator.bottom_up(&branch.edges)?,
            };
            for (state, interpolant) in branch.path.states().iter().zip(along) {
                let joined = match self.interpolants.get(state) {
                    Some(existing) => existing.join(&interpolant)?,
                    None => interpolant,
                };
                self.interpolants.insert(*state, joined);
            }
        }
        self.interpolants
            .insert(self.root, interpolator.manager().true_interpolant());
        debug!(
            "computed {} interpolants over {} paths",
            self.interpolants.len(),
            self.branches.len()
        );
        Ok(())
    }

    /// The first state with a non-TRUE interpolant on each path, without
    /// duplicates and without states lying below another one on some path.
    pub fn refinement_roots(&self) -> Vec<ArgStateId> {
        let mut firsts = BTreeSet::new();
        for branch in &self.branches {
            let first = branch
                .path
                .states()
                .iter()
                .find(|s| self.interpolants.get(s).is_some_and(|i| !i.is_true()));
            if let Some(first) = first {
                firsts.insert(*first);
            }
        }
        firsts
            .iter()
            .copied()
            .filter(|candidate| {
                !self.branches.iter().any(|branch| {
                    let states = branch.path.states();
                    match states.iter().position(|s| s == candidate) {
                        Some(at) => states[..at].iter().any(|s| firsts.contains(s)),
                        None => false,
                    }
                })
            })
            .collect()
    }

    /// The variables of each state's interpolant, keyed by its location.
    pub fn precision_increment<S>(&self, arg: &Arg<S>) -> Result<PrecisionIncrement> {
        let mut increment = PrecisionIncrement::new();
        for (state, interpolant) in &self.interpolants {
            let location = arg.node(*state)?.location;
            increment.add(location, interpolant.variables());
        }
        Ok(increment)
    }
}

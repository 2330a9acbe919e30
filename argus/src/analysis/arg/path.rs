use crate::analysis::arg::{Arg, ArgStateId};
use crate::error::{ArgusError, Result};
use argus_cfa::CfaEdgeId;
use itertools::Itertools;
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};

/// Resolves which parent to follow at a state reached along several paths.
pub trait BranchingInfo {
    fn choose_parent(
        &self,
        state: ArgStateId,
        parents: &BTreeSet<(ArgStateId, CfaEdgeId)>,
    ) -> Option<(ArgStateId, CfaEdgeId)>;
}

/// Always follows the lowest `(parent, edge)` pair, i.e. the oldest parent.
#[derive(Debug, Default, Copy, Clone)]
pub struct FirstParent;

impl BranchingInfo for FirstParent {
    fn choose_parent(
        &self,
        _state: ArgStateId,
        parents: &BTreeSet<(ArgStateId, CfaEdgeId)>,
    ) -> Option<(ArgStateId, CfaEdgeId)> {
        parents.first().copied()
    }
}

/// A root-first path through the ARG.
///
/// `states` has exactly one more element than `edges`; `edges[i]` leads from
/// `states[i]` to `states[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPath {
    pub(crate) states: Vec<ArgStateId>,
    pub(crate) edges: Vec<CfaEdgeId>,
}

impl ArgPath {
    /// Reconstructs the path to `target` by walking parent links.
    pub fn from_target<S>(
        arg: &Arg<S>,
        target: ArgStateId,
        branching: Option<&dyn BranchingInfo>,
    ) -> Result<Self> {
        let root = arg
            .root()
            .ok_or_else(|| ArgusError::invariant("the ARG has no root"))?;
        let mut states = vec![target];
        let mut edges = Vec::new();
        let mut seen = HashSet::from([target]);
        let mut current = target;
        while current != root {
            let parents = arg.node(current)?.parents();
            let (parent, edge) = match (parents.len(), branching) {
                (0, _) => {
                    return Err(ArgusError::invariant(format!(
                        "{current} has no parent but is not the root"
                    )));
                }
                (1, _) => parents.first().copied(),
                (_, Some(info)) => info.choose_parent(current, parents),
                (_, None) => return Err(ArgusError::AmbiguousPath { state: current }),
            }
            .ok_or(ArgusError::AmbiguousPath { state: current })?;
            if !seen.insert(parent) {
                return Err(ArgusError::invariant(format!(
                    "parent links of {target} form a cycle through {parent}"
                )));
            }
            states.push(parent);
            edges.push(edge);
            current = parent;
        }
        states.reverse();
        edges.reverse();
        Ok(Self { states, edges })
    }

    pub fn states(&self) -> &[ArgStateId] {
        &self.states
    }

    pub fn edges(&self) -> &[CfaEdgeId] {
        &self.edges
    }

    pub fn edge_sequence(&self) -> String {
        self.edges.iter().join(" ")
    }

    pub fn root(&self) -> ArgStateId {
        self.states[0]
    }

    pub fn target(&self) -> ArgStateId {
        self.states[self.states.len() - 1]
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The first `edges` edges of this path.
    pub fn truncated(&self, edges: usize) -> Self {
        let edges = edges.min(self.edges.len());
        Self {
            states: self.states[..=edges].to_vec(),
            edges: self.edges[..edges].to_vec(),
        }
    }
}

impl Display for ArgPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.states[0])?;
        for (edge, state) in self.edges.iter().zip(self.states.iter().skip(1)) {
            write!(f, " -{edge}-> {state}")?;
        }
        Ok(())
    }
}

//! The abstract reachability graph.
//!
//! Nodes live in an arena and are addressed by [`ArgStateId`]. Ids are handed
//! out monotonically and never reused, so an id held by a caller either names
//! the node it was created for or nothing at all.

mod path;

pub use path::{ArgPath, BranchingInfo, FirstParent};

use crate::error::{ArgusError, Result};
use argus_cfa::{BlockId, CfaEdgeId, CfaNodeId};
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArgStateId(pub usize);

impl Display for ArgStateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// One level of block nesting: the block and the state it was entered with.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFrame<S> {
    pub block: BlockId,
    pub root: Arc<S>,
}

#[derive(Debug, Clone)]
pub struct ArgNode<S> {
    pub state: S,
    pub location: CfaNodeId,
    pub(crate) parents: BTreeSet<(ArgStateId, CfaEdgeId)>,
    pub(crate) children: BTreeSet<ArgStateId>,
    pub(crate) covered_by: Option<ArgStateId>,
    pub(crate) covers: BTreeSet<ArgStateId>,
    pub(crate) target: bool,
    pub(crate) scope: Vec<BlockFrame<S>>,
}

impl<S> ArgNode<S> {
    /// Parent states together with the CFA edge leading from each.
    pub fn parents(&self) -> &BTreeSet<(ArgStateId, CfaEdgeId)> {
        &self.parents
    }

    pub fn children(&self) -> &BTreeSet<ArgStateId> {
        &self.children
    }

    pub fn covered_by(&self) -> Option<ArgStateId> {
        self.covered_by
    }

    pub fn covers(&self) -> &BTreeSet<ArgStateId> {
        &self.covers
    }

    pub fn is_covered(&self) -> bool {
        self.covered_by.is_some()
    }

    pub fn is_target(&self) -> bool {
        self.target
    }

    /// Enclosing blocks, outermost first.
    pub fn scope(&self) -> &[BlockFrame<S>] {
        &self.scope
    }
}

/// Edges of the exported graph view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArgGraphEdge {
    Transition(CfaEdgeId),
    CoveredBy,
}

impl Display for ArgGraphEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgGraphEdge::Transition(e) => write!(f, "{e}"),
            ArgGraphEdge::CoveredBy => write!(f, "covered-by"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Arg<S> {
    nodes: Vec<Option<ArgNode<S>>>,
    live: usize,
    root: Option<ArgStateId>,
}

impl<S> Default for Arg<S> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            live: 0,
            root: None,
        }
    }
}

impl<S> Arg<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<ArgStateId> {
        self.root
    }

    pub fn get(&self, id: ArgStateId) -> Option<&ArgNode<S>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Like [`Arg::get`], for ids the engine itself holds.
    pub fn node(&self, id: ArgStateId) -> Result<&ArgNode<S>> {
        self.get(id)
            .ok_or_else(|| ArgusError::invariant(format!("ARG state {id} does not exist")))
    }

    fn node_mut(&mut self, id: ArgStateId) -> Result<&mut ArgNode<S>> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| ArgusError::invariant(format!("ARG state {id} does not exist")))
    }

    pub fn contains(&self, id: ArgStateId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArgStateId, &ArgNode<S>)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (ArgStateId(i), n)))
    }

    /// Uncovered target states, in creation order.
    pub fn targets(&self) -> Vec<ArgStateId> {
        self.iter()
            .filter(|(_, n)| n.target && n.covered_by.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn insert(
        &mut self,
        state: S,
        location: CfaNodeId,
        scope: Vec<BlockFrame<S>>,
    ) -> ArgStateId {
        let id = ArgStateId(self.nodes.len());
        self.nodes.push(Some(ArgNode {
            state,
            location,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            covered_by: None,
            covers: BTreeSet::new(),
            target: false,
            scope,
        }));
        self.live += 1;
        id
    }

    pub(crate) fn set_root(&mut self, id: ArgStateId) {
        self.root = Some(id);
    }

    pub(crate) fn link(&mut self, parent: ArgStateId, edge: CfaEdgeId, child: ArgStateId) -> Result<()> {
        self.node_mut(parent)?.children.insert(child);
        self.node_mut(child)?.parents.insert((parent, edge));
        Ok(())
    }

    pub(crate) fn cover(&mut self, covered: ArgStateId, by: ArgStateId) -> Result<()> {
        self.node_mut(by)?.covers.insert(covered);
        self.node_mut(covered)?.covered_by = Some(by);
        Ok(())
    }

    pub(crate) fn set_target(&mut self, id: ArgStateId, target: bool) -> Result<()> {
        self.node_mut(id)?.target = target;
        Ok(())
    }

    /// Moves every relation of `old` onto `new` and deletes `old`.
    ///
    /// A self-loop on `old` becomes a self-loop on `new`.
    pub(crate) fn transplant(&mut self, old: ArgStateId, new: ArgStateId) -> Result<()> {
        let mut child_links = Vec::new();
        for child in &self.node(old)?.children {
            for (parent, edge) in &self.node(*child)?.parents {
                if *parent == old {
                    child_links.push((*child, *edge));
                }
            }
        }
        let was_root = self.root == Some(old);
        let node = self.remove(old)?;
        let rename = |id: ArgStateId| if id == old { new } else { id };
        for (parent, edge) in node.parents {
            self.link(rename(parent), edge, new)?;
        }
        for (child, edge) in child_links {
            self.link(new, edge, rename(child))?;
        }
        for covered in node.covers {
            self.cover(covered, new)?;
        }
        if was_root {
            self.root = Some(new);
        }
        Ok(())
    }

    /// Deletes `id` and every reference to it, returning the removed node.
    pub(crate) fn remove(&mut self, id: ArgStateId) -> Result<ArgNode<S>> {
        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| ArgusError::invariant(format!("ARG state {id} does not exist")))?;
        self.live -= 1;
        for (parent, _) in &node.parents {
            if let Some(Some(p)) = self.nodes.get_mut(parent.0) {
                p.children.remove(&id);
            }
        }
        for child in &node.children {
            if let Some(Some(c)) = self.nodes.get_mut(child.0) {
                c.parents.retain(|(p, _)| *p != id);
            }
        }
        if let Some(Some(by)) = node.covered_by.and_then(|by| self.nodes.get_mut(by.0)) {
            by.covers.remove(&id);
        }
        for covered in &node.covers {
            if let Some(Some(c)) = self.nodes.get_mut(covered.0) {
                c.covered_by = None;
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(node)
    }

    /// Drops every node. Ids handed out before are reused afterwards.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.live = 0;
        self.root = None;
    }

    /// `roots` and every node reachable from them through child links.
    pub fn descendants(&self, roots: &[ArgStateId]) -> BTreeSet<ArgStateId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<ArgStateId> = roots.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.get(id) {
                queue.extend(node.children.iter().copied());
            }
        }
        seen
    }

    /// Replays a CFA edge sequence from the root.
    ///
    /// A covered state on the way continues at its covering state. Returns
    /// `None` if some edge has no matching ARG transition.
    pub fn replay(&self, edges: &[CfaEdgeId]) -> Option<ArgPath> {
        let mut current = self.root?;
        let mut states = vec![current];
        for edge in edges {
            if let Some(by) = self.get(current)?.covered_by {
                current = by;
                if let Some(last) = states.last_mut() {
                    *last = by;
                }
            }
            let node = self.get(current)?;
            current = node.children.iter().copied().find(|c| {
                self.get(*c)
                    .is_some_and(|child| child.parents.contains(&(current, *edge)))
            })?;
            states.push(current);
        }
        Some(ArgPath {
            states,
            edges: edges.to_vec(),
        })
    }

    /// A graph view of the ARG, for example to render with `petgraph::dot`.
    pub fn to_graph(&self) -> DiGraph<ArgStateId, ArgGraphEdge> {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        for (id, _) in self.iter() {
            index.insert(id, graph.add_node(id));
        }
        for (id, node) in self.iter() {
            for (parent, edge) in &node.parents {
                if let (Some(p), Some(c)) = (index.get(parent), index.get(&id)) {
                    graph.add_edge(*p, *c, ArgGraphEdge::Transition(*edge));
                }
            }
            if let Some(by) = node.covered_by {
                if let (Some(c), Some(b)) = (index.get(&id), index.get(&by)) {
                    graph.add_edge(*c, *b, ArgGraphEdge::CoveredBy);
                }
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn e(i: u32) -> CfaEdgeId {
        CfaEdgeId(i)
    }

    /// `r -e0-> a -e1-> b`
    fn chain() -> (Arg<u8>, [ArgStateId; 3]) {
        let mut arg = Arg::new();
        let r = arg.insert(0, CfaNodeId(0), vec![]);
        arg.set_root(r);
        let a = arg.insert(1, CfaNodeId(1), vec![]);
        let b = arg.insert(2, CfaNodeId(2), vec![]);
        arg.link(r, e(0), a).unwrap();
        arg.link(a, e(1), b).unwrap();
        (arg, [r, a, b])
    }

    #[test]
    fn test_path_from_target() {
        let (arg, [r, a, b]) = chain();
        let path = ArgPath::from_target(&arg, b, None).unwrap();
        assert_eq!(path.states(), &[r, a, b]);
        assert_eq!(path.edges(), &[e(0), e(1)]);
        assert_eq!(path.to_string(), "s0 -e0-> s1 -e1-> s2");
        let prefix = path.truncated(1);
        assert_eq!(prefix.target(), a);
        assert_eq!(prefix.len(), 1);
    }

    #[test]
    fn test_several_parents_need_branching_info() {
        let (mut arg, [r, a, _]) = chain();
        let c = arg.insert(3, CfaNodeId(3), vec![]);
        arg.link(a, e(2), c).unwrap();
        arg.link(r, e(3), c).unwrap();
        let err = ArgPath::from_target(&arg, c, None).unwrap_err();
        assert!(matches!(err, ArgusError::AmbiguousPath { state } if state == c));
        assert_eq!(err.kind(), ErrorKind::Path);

        let path = ArgPath::from_target(&arg, c, Some(&FirstParent)).unwrap();
        assert_eq!(path.states(), &[r, c]);
        assert_eq!(path.edges(), &[e(3)]);
    }

    #[test]
    fn test_parent_cycle_is_an_invariant_violation() {
        let (mut arg, _) = chain();
        let x = arg.insert(4, CfaNodeId(4), vec![]);
        let y = arg.insert(5, CfaNodeId(5), vec![]);
        arg.link(x, e(4), y).unwrap();
        arg.link(y, e(5), x).unwrap();
        let err = ArgPath::from_target(&arg, x, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineInvariant);
    }

    #[test]
    fn test_replay_continues_at_covering_state() {
        let (mut arg, [r, a, b]) = chain();
        let twin = arg.insert(1, CfaNodeId(1), vec![]);
        arg.link(r, e(7), twin).unwrap();
        arg.cover(twin, a).unwrap();

        let path = arg.replay(&[e(7), e(1)]).unwrap();
        assert_eq!(path.states(), &[r, a, b]);
        assert!(arg.replay(&[e(1)]).is_none());

        let graph = arg.to_graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_transplant_and_descendants() {
        let (mut arg, [r, a, b]) = chain();
        assert_eq!(arg.descendants(&[a]), BTreeSet::from([a, b]));
        let merged = arg.insert(10, CfaNodeId(1), vec![]);
        arg.transplant(a, merged).unwrap();
        assert!(!arg.contains(a));
        assert!(arg.node(r).unwrap().children().contains(&merged));
        assert!(arg.node(b).unwrap().parents().contains(&(merged, e(1))));
        assert_eq!(arg.descendants(&[r]), BTreeSet::from([r, merged, b]));
        assert_eq!(arg.len(), 3);
    }

    #[test]
    fn test_clear_resets_the_arena() {
        let (mut arg, [_, a, _]) = chain();
        arg.remove(a).unwrap();
        assert_eq!(arg.len(), 2);
        arg.clear();
        assert!(arg.is_empty());
        assert_eq!(arg.root(), None);
        let fresh = arg.insert(0, CfaNodeId(0), vec![]);
        assert_eq!(fresh, ArgStateId(0));
        assert_eq!(arg.len(), 1);
        assert_eq!(arg.iter().count(), 1);
    }
}

use crate::block::{Block, BlockId};
use crate::error::CfaError;
use crate::expr::EdgeKind;
use crate::variable::Variable;
use itertools::Itertools;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{DfsPostOrder, EdgeRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CfaNodeId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CfaEdgeId(pub u32);

impl Display for CfaNodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl Display for CfaEdgeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl CfaNodeId {
    pub(crate) fn index(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }
}

impl CfaEdgeId {
    pub(crate) fn index(self) -> EdgeIndex {
        EdgeIndex::new(self.0 as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfaNode {
    pub id: CfaNodeId,
    pub label: String,
}

impl Display for CfaNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CfaEdge {
    pub id: CfaEdgeId,
    pub predecessor: CfaNodeId,
    pub successor: CfaNodeId,
    pub kind: EdgeKind,
}

impl CfaEdge {
    /// The same edge with its operation replaced by `skip`.
    pub fn as_blank(&self) -> CfaEdge {
        CfaEdge {
            kind: EdgeKind::Blank,
            ..self.clone()
        }
    }
}

impl Display for CfaEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.predecessor, self.kind, self.successor
        )
    }
}

/// A read-only control-flow automaton.
///
/// Node and edge identifiers are dense and assigned in insertion order, so
/// they double as indices into the underlying graph.
#[derive(Debug, Clone)]
pub struct Cfa {
    pub(crate) graph: DiGraph<CfaNode, CfaEdge>,
    pub(crate) entry: CfaNodeId,
    pub(crate) variables: BTreeSet<Variable>,
    pub(crate) blocks: BTreeMap<BlockId, Block>,
    pub(crate) block_of: HashMap<CfaNodeId, BlockId>,
    pub(crate) labels: HashMap<String, CfaNodeId>,
}

impl Cfa {
    pub fn entry(&self) -> CfaNodeId {
        self.entry
    }

    pub fn graph(&self) -> &DiGraph<CfaNode, CfaEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: CfaNodeId) -> Result<&CfaNode, CfaError> {
        self.graph
            .node_weight(id.index())
            .ok_or(CfaError::UnknownNode(id))
    }

    pub fn node_by_label(&self, label: &str) -> Result<CfaNodeId, CfaError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| CfaError::UnknownLabel(label.to_string()))
    }

    pub fn label(&self, id: CfaNodeId) -> &str {
        self.graph
            .node_weight(id.index())
            .map(|n| n.label.as_str())
            .unwrap_or("?")
    }

    pub fn edge(&self, id: CfaEdgeId) -> Result<&CfaEdge, CfaError> {
        self.graph
            .edge_weight(id.index())
            .ok_or(CfaError::UnknownEdge(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CfaNode> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &CfaEdge> {
        self.graph.edge_weights()
    }

    fn adjacent(&self, node: CfaNodeId, dir: Direction) -> Vec<&CfaEdge> {
        if self.graph.node_weight(node.index()).is_none() {
            return Vec::new();
        }
        self.graph
            .edges_directed(node.index(), dir)
            .map(|e| e.weight())
            .sorted_by_key(|e| e.id)
            .collect()
    }

    /// Edges leaving `node`, ordered by edge id.
    pub fn leaving_edges(&self, node: CfaNodeId) -> Vec<&CfaEdge> {
        self.adjacent(node, Direction::Outgoing)
    }

    /// Edges entering `node`, ordered by edge id.
    pub fn entering_edges(&self, node: CfaNodeId) -> Vec<&CfaEdge> {
        self.adjacent(node, Direction::Incoming)
    }

    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    pub fn declares(&self, var: &Variable) -> bool {
        self.variables.contains(var)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn block_containing(&self, node: CfaNodeId) -> Option<&Block> {
        self.block_of.get(&node).and_then(|b| self.blocks.get(b))
    }

    /// The block this edge enters, if it jumps to a block entry from outside.
    pub fn block_entered_by(&self, edge: &CfaEdge) -> Option<&Block> {
        let block = self.block_containing(edge.successor)?;
        (block.entry == edge.successor && !block.contains(edge.predecessor)).then_some(block)
    }

    /// The block this edge leaves, if it goes from inside a block to outside.
    pub fn block_exited_by(&self, edge: &CfaEdge) -> Option<&Block> {
        let block = self.block_containing(edge.predecessor)?;
        (!block.contains(edge.successor)).then_some(block)
    }

    /// Nodes reachable from the entry in reverse postorder.
    pub fn reverse_postorder(&self) -> Vec<CfaNodeId> {
        let mut dfs = DfsPostOrder::new(&self.graph, self.entry.index());
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(idx) = dfs.next(&self.graph) {
            order.push(self.graph[idx].id);
        }
        order.reverse();
        order
    }

    /// Whether `edges` can be taken one after another starting at the entry.
    pub fn is_walk(&self, edges: &[CfaEdgeId]) -> bool {
        let mut current = self.entry;
        for id in edges {
            match self.edge(*id) {
                Ok(edge) if edge.predecessor == current => current = edge.successor,
                _ => return false,
            }
        }
        true
    }

    /// The node at which the walk `edges` ends.
    pub fn walk_end(&self, edges: &[CfaEdgeId]) -> Result<CfaNodeId, CfaError> {
        if !self.is_walk(edges) {
            return Err(CfaError::NotAWalk);
        }
        match edges.last() {
            Some(last) => Ok(self.edge(*last)?.successor),
            None => Ok(self.entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::CfaBuilder;
    use crate::expr::{CmpOp, EdgeKind, Expr};

    #[test]
    fn test_leaving_edges_are_sorted() {
        let mut b = CfaBuilder::new();
        let e = b.node("E");
        let l = b.node("L");
        let x = b.node("X");
        b.variable("v");
        let first = b.edge(e, l, EdgeKind::assign("v", 0i64)).unwrap();
        let second = b.edge(e, x, EdgeKind::Blank).unwrap();
        let third = b
            .edge(e, l, EdgeKind::assume(Expr::var("v"), CmpOp::Lt, 3i64))
            .unwrap();
        let cfa = b.build(e).unwrap();
        let ids: Vec<_> = cfa.leaving_edges(e).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, second, third]);
        let entering: Vec<_> = cfa.entering_edges(l).iter().map(|e| e.id).collect();
        assert_eq!(entering, vec![first, third]);
    }

    #[test]
    fn test_reverse_postorder_and_walks() {
        let mut b = CfaBuilder::new();
        let e = b.node("E");
        let l1 = b.node("L1");
        let l2 = b.node("L2");
        let e1 = b.edge(e, l1, EdgeKind::Blank).unwrap();
        let e2 = b.edge(l1, l2, EdgeKind::Blank).unwrap();
        let back = b.edge(l2, l1, EdgeKind::Blank).unwrap();
        let cfa = b.build(e).unwrap();
        assert_eq!(cfa.reverse_postorder(), vec![e, l1, l2]);
        assert!(cfa.is_walk(&[e1, e2, back, e2]));
        assert!(!cfa.is_walk(&[e2]));
        assert_eq!(cfa.walk_end(&[e1, e2, back]).unwrap(), l1);
        assert_eq!(cfa.walk_end(&[]).unwrap(), e);
    }
}

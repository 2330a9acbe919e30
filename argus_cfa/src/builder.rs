use crate::block::{Block, BlockId};
use crate::cfa::{Cfa, CfaEdge, CfaEdgeId, CfaNode, CfaNodeId};
use crate::error::CfaError;
use crate::expr::EdgeKind;
use crate::variable::Variable;
use petgraph::graph::DiGraph;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Incrementally assembles a [`Cfa`], checking references as it goes.
#[derive(Debug, Default)]
pub struct CfaBuilder {
    graph: DiGraph<CfaNode, CfaEdge>,
    variables: BTreeSet<Variable>,
    blocks: Vec<(CfaNodeId, BTreeSet<CfaNodeId>)>,
}

impl CfaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node<S: Into<String>>(&mut self, label: S) -> CfaNodeId {
        let id = CfaNodeId(self.graph.node_count() as u32);
        self.graph.add_node(CfaNode {
            id,
            label: label.into(),
        });
        id
    }

    pub fn variable<V: Into<Variable>>(&mut self, var: V) -> Variable {
        let var = var.into();
        self.variables.insert(var);
        var
    }

    fn check_node(&self, id: CfaNodeId) -> Result<(), CfaError> {
        if (id.0 as usize) < self.graph.node_count() {
            Ok(())
        } else {
            Err(CfaError::UnknownNode(id))
        }
    }

    pub fn edge(
        &mut self,
        predecessor: CfaNodeId,
        successor: CfaNodeId,
        kind: EdgeKind,
    ) -> Result<CfaEdgeId, CfaError> {
        self.check_node(predecessor)?;
        self.check_node(successor)?;
        let id = CfaEdgeId(self.graph.edge_count() as u32);
        if let Some(var) = kind.variables().into_iter().find(|v| !self.variables.contains(v)) {
            return Err(CfaError::UndeclaredVariable {
                edge: id,
                variable: var.to_string(),
            });
        }
        self.graph.add_edge(
            predecessor.index(),
            successor.index(),
            CfaEdge {
                id,
                predecessor,
                successor,
                kind,
            },
        );
        Ok(id)
    }

    /// Declares a block over `nodes` entered through `entry`.
    pub fn block<I: IntoIterator<Item = CfaNodeId>>(
        &mut self,
        entry: CfaNodeId,
        nodes: I,
    ) -> Result<BlockId, CfaError> {
        let id = BlockId(self.blocks.len() as u32);
        let nodes: BTreeSet<CfaNodeId> = nodes.into_iter().collect();
        for n in nodes.iter().copied().chain(std::iter::once(entry)) {
            self.check_node(n)?;
        }
        if !nodes.contains(&entry) {
            return Err(CfaError::EntryOutsideBlock { block: id, entry });
        }
        self.blocks.push((entry, nodes));
        Ok(id)
    }

    pub fn build(self, entry: CfaNodeId) -> Result<Cfa, CfaError> {
        self.check_node(entry)?;
        let mut labels = HashMap::new();
        for node in self.graph.node_weights() {
            if labels.insert(node.label.clone(), node.id).is_some() {
                return Err(CfaError::DuplicateLabel(node.label.clone()));
            }
        }

        let mut block_of: HashMap<CfaNodeId, BlockId> = HashMap::new();
        let mut blocks = BTreeMap::new();
        for (i, (block_entry, nodes)) in self.blocks.into_iter().enumerate() {
            let id = BlockId(i as u32);
            for n in &nodes {
                if let Some(first) = block_of.insert(*n, id) {
                    return Err(CfaError::OverlappingBlocks {
                        node: *n,
                        first,
                        second: id,
                    });
                }
            }
            let variables = self
                .graph
                .edge_weights()
                .filter(|e| nodes.contains(&e.predecessor) && nodes.contains(&e.successor))
                .flat_map(|e| e.kind.variables())
                .collect();
            blocks.insert(
                id,
                Block {
                    id,
                    entry: block_entry,
                    nodes,
                    variables,
                },
            );
        }
        if block_of.contains_key(&entry) {
            return Err(CfaError::EntryInsideBlock(entry));
        }
        for e in self.graph.edge_weights() {
            let Some(block) = block_of.get(&e.successor).and_then(|b| blocks.get(b)) else {
                continue;
            };
            if !block.contains(e.predecessor) && e.successor != block.entry {
                return Err(CfaError::BlockEntryViolation {
                    edge: e.id,
                    block: block.id,
                });
            }
        }

        debug!(
            "built CFA with {} nodes, {} edges, {} blocks",
            self.graph.node_count(),
            self.graph.edge_count(),
            blocks.len()
        );
        Ok(Cfa {
            graph: self.graph,
            entry,
            variables: self.variables,
            blocks,
            block_of,
            labels,
        })
    }
}

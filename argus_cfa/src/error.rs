use crate::block::BlockId;
use crate::cfa::{CfaEdgeId, CfaNodeId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CfaError {
    #[error("Node {0} is not part of this CFA")]
    UnknownNode(CfaNodeId),
    #[error("Edge {0} is not part of this CFA")]
    UnknownEdge(CfaEdgeId),
    #[error("No node is labelled `{0}`")]
    UnknownLabel(String),
    #[error("Label `{0}` is used by more than one node")]
    DuplicateLabel(String),
    #[error("Edge {edge} references undeclared variable `{variable}`")]
    UndeclaredVariable { edge: CfaEdgeId, variable: String },
    #[error("Block {block} has entry {entry} which is not one of its nodes")]
    EntryOutsideBlock { block: BlockId, entry: CfaNodeId },
    #[error("Node {node} belongs to both block {first} and block {second}")]
    OverlappingBlocks {
        node: CfaNodeId,
        first: BlockId,
        second: BlockId,
    },
    #[error("Edge {edge} enters block {block} at a node other than its entry")]
    BlockEntryViolation { edge: CfaEdgeId, block: BlockId },
    #[error("The CFA entry {0} may not lie inside a block")]
    EntryInsideBlock(CfaNodeId),
    #[error("Edge sequence is not a walk of the CFA from its entry")]
    NotAWalk,
}

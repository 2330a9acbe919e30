use crate::cfa::CfaNodeId;
use crate::variable::Variable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A single-entry region of the CFA analyzed modularly.
///
/// Control enters a block only through `entry`; any edge from a node inside
/// the block to one outside it leaves the block. `variables` holds every
/// variable referenced by an edge internal to the block, which is what a
/// reducer keeps when abstracting a state down to the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub entry: CfaNodeId,
    pub nodes: BTreeSet<CfaNodeId>,
    pub variables: BTreeSet<Variable>,
}

impl Block {
    pub fn contains(&self, node: CfaNodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn uses(&self, var: &Variable) -> bool {
        self.variables.contains(var)
    }
}

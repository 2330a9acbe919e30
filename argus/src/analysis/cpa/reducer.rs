use argus_cfa::Block;

/// Abstracts states to a block on entry and restores context on exit.
///
/// `reduce` is applied to the successor of an edge entering `block`.
/// `expand` is applied to the state an edge leaves `block` from, before that
/// edge is taken, with `root` being the unreduced state the block was
/// entered with.
pub trait Reducer<S> {
    fn reduce(&self, state: &S, block: &Block) -> S;

    fn expand(&self, root: &S, block: &Block, reduced: &S) -> S;
}

/// A reducer that leaves states untouched.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoOpReducer;

impl<S: Clone> Reducer<S> for NoOpReducer {
    fn reduce(&self, state: &S, _block: &Block) -> S {
        state.clone()
    }

    fn expand(&self, _root: &S, _block: &Block, reduced: &S) -> S {
        reduced.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_cfa::{BlockId, CfaNodeId, Variable};
    use std::collections::BTreeSet;

    #[test]
    fn test_no_op_reducer_identity() {
        let blocks = [
            Block {
                id: BlockId(0),
                entry: CfaNodeId(1),
                nodes: BTreeSet::from([CfaNodeId(1)]),
                variables: BTreeSet::new(),
            },
            Block {
                id: BlockId(3),
                entry: CfaNodeId(4),
                nodes: BTreeSet::from([CfaNodeId(4), CfaNodeId(5)]),
                variables: BTreeSet::from([Variable::new("x")]),
            },
        ];
        for block in &blocks {
            for root in [0i64, -3, 17] {
                let reduced = NoOpReducer.reduce(&root, block);
                assert_eq!(NoOpReducer.expand(&root, block, &reduced), root);
            }
        }
    }
}

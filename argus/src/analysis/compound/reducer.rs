use crate::analysis::compound::state::{CompoundState2, CompoundState3};
use crate::analysis::cpa::reducer::Reducer;
use argus_cfa::Block;

/// Applies one reducer per component.
pub struct CompoundReducer2<R1, R2> {
    pub r1: R1,
    pub r2: R2,
}

impl<S1, S2, R1, R2> Reducer<CompoundState2<S1, S2>> for CompoundReducer2<R1, R2>
where
    R1: Reducer<S1>,
    R2: Reducer<S2>,
{
    fn reduce(&self, state: &CompoundState2<S1, S2>, block: &Block) -> CompoundState2<S1, S2> {
        CompoundState2 {
            s1: self.r1.reduce(&state.s1, block),
            s2: self.r2.reduce(&state.s2, block),
        }
    }

    fn expand(
        &self,
        root: &CompoundState2<S1, S2>,
        block: &Block,
        reduced: &CompoundState2<S1, S2>,
    ) -> CompoundState2<S1, S2> {
        CompoundState2 {
            s1: self.r1.expand(&root.s1, block, &reduced.s1),
            s2: self.r2.expand(&root.s2, block, &reduced.s2),
        }
    }
}

pub struct CompoundReducer3<R1, R2, R3> {
    pub r1: R1,
    pub r2: R2,
    pub r3: R3,
}

impl<S1, S2, S3, R1, R2, R3> Reducer<CompoundState3<S1, S2, S3>> for CompoundReducer3<R1, R2, R3>
where
    R1: Reducer<S1>,
    R2: Reducer<S2>,
    R3: Reducer<S3>,
{
    fn reduce(
        &self,
        state: &CompoundState3<S1, S2, S3>,
        block: &Block,
    ) -> CompoundState3<S1, S2, S3> {
        CompoundState3 {
            s1: self.r1.reduce(&state.s1, block),
            s2: self.r2.reduce(&state.s2, block),
            s3: self.r3.reduce(&state.s3, block),
        }
    }

    fn expand(
        &self,
        root: &CompoundState3<S1, S2, S3>,
        block: &Block,
        reduced: &CompoundState3<S1, S2, S3>,
    ) -> CompoundState3<S1, S2, S3> {
        CompoundState3 {
            s1: self.r1.expand(&root.s1, block, &reduced.s1),
            s2: self.r2.expand(&root.s2, block, &reduced.s2),
            s3: self.r3.expand(&root.s3, block, &reduced.s3),
        }
    }
}

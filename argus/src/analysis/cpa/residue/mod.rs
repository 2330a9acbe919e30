pub mod vec;

use argus_cfa::CfaEdge;
use std::marker::PhantomData;

/// Observer hooks called by the reachability algorithm while it explores.
///
/// A residue accumulates information about the exploration that does not
/// belong in any single abstract state, and hands it back on `finalize`.
pub trait Residue<S> {
    type Output;

    /// Called for every successor computed along `edge`, before merging.
    fn new_state(&mut self, _state: &S, _edge: &CfaEdge, _dest_state: &S) {}

    /// Called when `reached` was merged with a new state into `merged`.
    fn merged_state(&mut self, _reached: &S, _new_state: &S, _merged: &S) {}

    /// Called when `state` is covered by the reached state `covering`.
    fn covered_state(&mut self, _state: &S, _covering: &S) {}

    fn new() -> Self;

    fn finalize(self) -> Self::Output;
}

pub struct EmptyResidue<T>(PhantomData<T>);

impl<T> Residue<T> for EmptyResidue<T> {
    type Output = ();

    fn new() -> Self {
        Self(PhantomData)
    }

    fn finalize(self) -> Self::Output {}
}

pub use self::vec::VecResidue;

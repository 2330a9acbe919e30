use crate::error::Result;
use argus_cfa::Variable;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// What must hold at an ARG state for a counterexample to stay infeasible.
///
/// TRUE carries no information and is the identity of `join`; FALSE means
/// the state is unreachable and absorbs everything it is joined with.
pub trait Interpolant: Clone + Debug + PartialEq + Sized {
    type State;

    /// The conjunction of both interpolants. Two interpolants that disagree
    /// on the same variable are an error.
    fn join(&self, other: &Self) -> Result<Self>;

    fn is_true(&self) -> bool;

    fn is_false(&self) -> bool;

    /// A fresh state consistent with the interpolant, `None` for FALSE.
    fn reconstruct_state(&self) -> Option<Self::State>;

    /// The variables the interpolant talks about.
    fn variables(&self) -> BTreeSet<Variable>;
}

pub trait InterpolantManager {
    type State;
    type Interpolant: Interpolant<State = Self::State>;

    fn create_initial(&self) -> Self::Interpolant {
        self.true_interpolant()
    }

    fn create_interpolant(&self, state: &Self::State) -> Self::Interpolant;

    fn true_interpolant(&self) -> Self::Interpolant;

    fn false_interpolant(&self) -> Self::Interpolant;
}

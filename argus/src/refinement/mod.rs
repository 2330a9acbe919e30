//! Counterexample-guided abstraction refinement.
//!
//! When exploration reaches a target, the [`refiner`] checks whether the
//! paths leading there are feasible. Infeasible ones are explained by
//! [`interpolant`]s computed over an [`tree::InterpolationTree`]; their
//! variables become a precision increment, and [`cegar`] re-explores with
//! the finer precision.

pub mod cegar;
pub mod feasibility;
pub mod interpolant;
pub mod interpolator;
pub mod prefix;
pub mod refiner;
pub mod tree;

#[cfg(test)]
mod tests;

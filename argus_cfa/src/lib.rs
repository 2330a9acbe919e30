//! Control-flow automata consumed by the `argus` analysis engine.
//!
//! A [`Cfa`] is a directed graph of program locations whose edges carry a
//! small integer language: `skip`, assignments, nondeterministic assignments
//! and assumptions. Regions of the graph can be marked as [`Block`]s for
//! block-modular analysis.

mod block;
mod builder;
mod cfa;
mod description;
mod error;
mod expr;
mod variable;

pub use block::{Block, BlockId};
pub use builder::CfaBuilder;
pub use cfa::{Cfa, CfaEdge, CfaEdgeId, CfaNode, CfaNodeId};
pub use description::{BlockDescription, CfaDescription, EdgeDescription};
pub use error::CfaError;
pub use expr::{CmpOp, Condition, EdgeKind, Expr};
pub use variable::Variable;

//! Configurable program analysis over control-flow automata.
//!
//! Analyses implement [`ConfigurableProgramAnalysis`]; tuples of analyses are
//! analyses too. The [`ReachabilityAlgorithm`] explores a [`Cfa`] with them
//! and records an abstract reachability graph, and the [`CegarAlgorithm`]
//! refines the analysis precision from spurious counterexamples until the
//! target locations are shown unreachable or a real path to one is found.
//!
//! [`Cfa`]: argus_cfa::Cfa
//! [`ConfigurableProgramAnalysis`]: analysis::cpa::ConfigurableProgramAnalysis
//! [`ReachabilityAlgorithm`]: analysis::cpa::reachability::ReachabilityAlgorithm
//! [`CegarAlgorithm`]: refinement::cegar::CegarAlgorithm

pub mod analysis;
pub mod config;
mod context;
mod error;
pub mod refinement;
#[cfg(test)]
mod test_util;

pub use argus_cfa as cfa;

pub use config::EngineConfig;
pub use context::{AnalysisContext, CancellationToken};
pub use error::{ArgusError, ErrorKind, Result};
pub use refinement::cegar::{UnknownReason, Verdict};

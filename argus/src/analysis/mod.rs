//! Abstract domains and the machinery that explores a CFA with them.
//!
//! [`cpa`] defines the operator interface and the reachability algorithm,
//! [`arg`] the graph it records. The remaining modules are domains, which
//! [`compound`] combines into products.

pub mod arg;
pub mod bounded_branch;
pub mod compound;
pub mod cpa;
pub mod interval;
pub mod location;
pub mod top;

use crate::analysis::arg::ArgPath;
use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::reachability::{
    ReachabilityAlgorithm, ReachabilityOutcome, ReachabilityStatistics, TargetSpecification,
};
use crate::analysis::cpa::reached::ArgReachedSet;
use crate::analysis::cpa::state::LocationState;
use crate::context::AnalysisContext;
use crate::error::{ArgusError, Result};
use crate::refinement::refiner::{RefinementResult, Refiner};
use argus_cfa::CfaEdgeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use tracing::{info, instrument, warn};

/// How the reached set is rebuilt after a refinement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartStrategy {
    /// Remove the subtrees below the refinement roots and re-expand their
    /// parents.
    Cut,
    /// Discard everything and start over from the initial state.
    Root,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownReason {
    Cancelled,
    /// The refinement budget ran out, or exploration pruned states.
    ResourceLimit,
    /// A domain could not compute a successor.
    TransferFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe(ArgPath),
    Unknown(UnknownReason),
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    pub fn is_unsafe(&self) -> bool {
        matches!(self, Verdict::Unsafe(_))
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Safe => write!(f, "SAFE"),
            Verdict::Unsafe(path) => write!(f, "UNSAFE ({})", path.edge_sequence()),
            Verdict::Unknown(UnknownReason::Cancelled) => write!(f, "UNKNOWN (cancelled)"),
            Verdict::Unknown(UnknownReason::ResourceLimit) => write!(f, "UNKNOWN (resource limit)"),
            Verdict::Unknown(UnknownReason::TransferFailure(reason)) => {
                write!(f, "UNKNOWN ({reason})")
            }
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CegarStatistics {
    pub refinements: usize,
    pub reachability_runs: usize,
    /// Summed over every reachability run.
    pub exploration: ReachabilityStatistics,
}

/// Alternates reachability and refinement until the property is proved,
/// refuted, or the budget runs out.
pub struct CegarAlgorithm<'a, A, T, R>
where
    A: ConfigurableProgramAnalysis,
{
    cpa: &'a A,
    ctx: &'a AnalysisContext<'a>,
    target: &'a T,
    refiner: R,
    reached: Option<ArgReachedSet<A::State, A::Precision>>,
    explained: BTreeSet<Vec<CfaEdgeId>>,
    stats: CegarStatistics,
}

impl<'a, A, T, R> CegarAlgorithm<'a, A, T, R>
where
    A: ConfigurableProgramAnalysis,
    A::State: LocationState,
    T: TargetSpecification<A::State>,
    R: Refiner<A::State, A::Precision>,
{
    pub fn new(cpa: &'a A, ctx: &'a AnalysisContext<'a>, target: &'a T, refiner: R) -> Self {
        Self {
            cpa,
            ctx,
            target,
            refiner,
            reached: None,
            explained: BTreeSet::new(),
            stats: CegarStatistics::default(),
        }
    }

    /// The reached set of the last run, kept for inspection after any
    /// outcome, errors included.
    pub fn reached(&self) -> Option<&ArgReachedSet<A::State, A::Precision>> {
        self.reached.as_ref()
    }

    pub fn statistics(&self) -> &CegarStatistics {
        &self.stats
    }

    #[instrument(skip_all, fields(analysis = %self.cpa.name()))]
    pub fn run(&mut self) -> Result<Verdict> {
        let mut reached = match self.reached.take() {
            Some(reached) => reached,
            None => ReachabilityAlgorithm::new(self.cpa, self.ctx, self.target).initial_reached()?,
        };
        let verdict = self.refinement_loop(&mut reached);
        self.reached = Some(reached);
        if let Ok(verdict) = &verdict {
            info!("{verdict} after {} refinements", self.stats.refinements);
        }
        verdict
    }

    fn refinement_loop(
        &mut self,
        reached: &mut ArgReachedSet<A::State, A::Precision>,
    ) -> Result<Verdict> {
        let ctx = self.ctx;
        let config = &ctx.config;
        loop {
            if ctx.is_cancelled() {
                return Ok(Verdict::Unknown(UnknownReason::Cancelled));
            }
            let mut algorithm = ReachabilityAlgorithm::new(self.cpa, ctx, self.target);
            let outcome = match algorithm.run(reached) {
                Ok(outcome) => outcome,
                Err(err @ ArgusError::TransferFailure { .. }) => {
                    warn!("giving up: {err}");
                    return Ok(Verdict::Unknown(UnknownReason::TransferFailure(
                        err.to_string(),
                    )));
                }
                Err(err) => return Err(err),
            };
            self.record(algorithm.statistics());

            match outcome {
                ReachabilityOutcome::Cancelled => {
                    return Ok(Verdict::Unknown(UnknownReason::Cancelled));
                }
                ReachabilityOutcome::Complete => {
                    if self.stats.exploration.pruned > 0 && config.pruning_is_incomplete {
                        return Ok(Verdict::Unknown(UnknownReason::ResourceLimit));
                    }
                    return Ok(Verdict::Safe);
                }
                ReachabilityOutcome::TargetReached(_) => {}
            }

            if self.stats.refinements >= config.max_refinements {
                warn!("refinement budget of {} exhausted", config.max_refinements);
                return Ok(Verdict::Unknown(UnknownReason::ResourceLimit));
            }
            let targets = reached.targets();
            let plan = match self.refiner.refine(ctx, reached, &targets)? {
                RefinementResult::Feasible(path) => return Ok(Verdict::Unsafe(path)),
                RefinementResult::Refine(plan) => plan,
            };
            if let Some(repeated) = plan.explained.iter().find(|e| self.explained.contains(*e)) {
                return Err(ArgusError::RepeatedCounterexample(repeated.clone()));
            }
            self.explained.extend(plan.explained.iter().cloned());
            self.stats.refinements += 1;
            info!(
                "refinement {}: {} at {} roots",
                self.stats.refinements,
                plan.increment,
                plan.cut_roots.len()
            );
            match config.restart {
                RestartStrategy::Cut => {
                    reached.remove_subtree(&plan.cut_roots, &plan.increment)?;
                }
                RestartStrategy::Root => {
                    reached.restart(&plan.increment)?;
                }
            }
        }
    }

    fn record(&mut self, run: &ReachabilityStatistics) {
        let total = &mut self.stats.exploration;
        total.iterations += run.iterations;
        total.transfers += run.transfers;
        total.merges += run.merges;
        total.covered += run.covered;
        total.pruned += run.pruned;
        total.targets += run.targets;
        self.stats.reachability_runs += 1;
    }
}

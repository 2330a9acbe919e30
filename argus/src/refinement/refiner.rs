use crate::analysis::arg::{ArgPath, ArgStateId, BranchingInfo};
use crate::analysis::cpa::precision::{Precision, PrecisionIncrement};
use crate::analysis::cpa::reached::ArgReachedSet;
use crate::context::AnalysisContext;
use crate::error::{ArgusError, Result};
use crate::refinement::feasibility::StrongestPost;
use crate::refinement::interpolant::InterpolantManager;
use crate::refinement::interpolator::EdgeInterpolator;
use crate::refinement::prefix::{InfeasiblePrefix, PrefixExtractor, PrefixHeuristic, PrefixSelector};
use crate::refinement::tree::{InterpolationTree, TreeBranch};
use argus_cfa::{CfaEdge, CfaEdgeId};
use tracing::{debug, info};

/// What a successful refinement asks the driver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementPlan {
    pub increment: PrecisionIncrement,
    /// ARG states whose subtrees must be re-explored.
    pub cut_roots: Vec<ArgStateId>,
    /// The CFA edge sequences of the counterexamples this plan explains.
    pub explained: Vec<Vec<CfaEdgeId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementResult {
    /// The path is a real counterexample.
    Feasible(ArgPath),
    Refine(RefinementPlan),
}

pub trait Refiner<S, P> {
    /// Analyses the counterexamples ending in `targets`.
    fn refine(
        &mut self,
        ctx: &AnalysisContext<'_>,
        reached: &ArgReachedSet<S, P>,
        targets: &[ArgStateId],
    ) -> Result<RefinementResult>;
}

/// Interpolation-based refinement.
///
/// Every target path is replayed with the strongest post. A feasible path is
/// reported as is. Otherwise one of its infeasible prefixes is picked, and
/// the selected prefixes of all paths form an interpolation tree whose
/// interpolants give the precision increment.
pub struct InterpolationRefiner<'a, SP, M> {
    post: &'a SP,
    manager: &'a M,
    branching: Option<&'a dyn BranchingInfo>,
    heuristic: Option<Box<dyn PrefixHeuristic + 'a>>,
}

impl<'a, SP, M> InterpolationRefiner<'a, SP, M>
where
    SP: StrongestPost,
    M: InterpolantManager<State = SP::State>,
{
    pub fn new(post: &'a SP, manager: &'a M) -> Self {
        Self {
            post,
            manager,
            branching: None,
            heuristic: None,
        }
    }

    /// Resolves states with several parents while extracting paths.
    pub fn with_branching(mut self, branching: &'a dyn BranchingInfo) -> Self {
        self.branching = Some(branching);
        self
    }

    /// Scores prefixes with `heuristic` instead of the configured preference.
    pub fn with_heuristic<H: PrefixHeuristic + 'a>(mut self, heuristic: H) -> Self {
        self.heuristic = Some(Box::new(heuristic));
        self
    }
}

impl<S, P, SP, M> Refiner<S, P> for InterpolationRefiner<'_, SP, M>
where
    S: Clone + PartialEq,
    P: Precision,
    SP: StrongestPost,
    M: InterpolantManager<State = SP::State>,
{
    fn refine(
        &mut self,
        ctx: &AnalysisContext<'_>,
        reached: &ArgReachedSet<S, P>,
        targets: &[ArgStateId],
    ) -> Result<RefinementResult> {
        let preference = ctx.config.prefix_preference;
        let heuristic = self.heuristic.as_deref();
        let selector = PrefixSelector::new(|p: &InfeasiblePrefix| match heuristic {
            Some(h) => h.score(p),
            None => preference.score(p),
        });
        let extractor = PrefixExtractor::new(self.post);

        let mut branches = Vec::with_capacity(targets.len());
        let mut explained = Vec::with_capacity(targets.len());
        for target in targets {
            let path = ArgPath::from_target(reached.arg(), *target, self.branching)?;
            let edges = path
                .edges()
                .iter()
                .map(|id| ctx.cfa.edge(*id).cloned())
                .collect::<std::result::Result<Vec<CfaEdge>, _>>()?;
            let prefixes = extractor.extract(&edges)?;
            let Some(prefix) = selector.select(&prefixes) else {
                info!("counterexample {} is feasible", path.edge_sequence());
                return Ok(RefinementResult::Feasible(path));
            };
            debug!(
                "{} infeasible prefixes for {}, refining along {} edges",
                prefixes.len(),
                path.edge_sequence(),
                prefix.len()
            );
            explained.push(path.edges().to_vec());
            branches.push(TreeBranch {
                path: path.truncated(prefix.len()),
                edges: prefix.edges().to_vec(),
            });
        }

        let interpolator = EdgeInterpolator::new(self.post, self.manager);
        let mut tree = InterpolationTree::new(branches)?;
        tree.compute(&interpolator, ctx.config.interpolation)?;
        let increment = tree.precision_increment(reached.arg())?;
        let cut_roots = tree.refinement_roots();
        if increment.is_empty() || cut_roots.is_empty() {
            return Err(ArgusError::RefinementFailed);
        }
        debug!("precision increment {increment}");
        Ok(RefinementResult::Refine(RefinementPlan {
            increment,
            cut_roots,
            explained,
        }))
    }
}

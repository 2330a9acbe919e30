use crate::analysis::arg::{ArgPath, ArgStateId, FirstParent};
use crate::analysis::bounded_branch::BoundedBranchAnalysis;
use crate::analysis::cpa::operators::MergeOperator;
use crate::analysis::cpa::precision::{Precision, PrecisionIncrement, PrecisionScope};
use crate::analysis::cpa::reachability::{ReachabilityAlgorithm, TargetLocations};
use crate::analysis::cpa::reached::ArgReachedSet;
use crate::analysis::interval::IntervalCpa;
use crate::analysis::interval::refinement::{ValueInterpolant, ValueInterpolantManager, ValuePost};
use crate::analysis::location::LocationAnalysis;
use crate::analysis::top::TopAnalysis;
use crate::config::EngineConfig;
use crate::context::{AnalysisContext, CancellationToken};
use crate::error::{ArgusError, ErrorKind, Result};
use crate::refinement::cegar::{CegarAlgorithm, CegarStatistics, RestartStrategy, UnknownReason, Verdict};
use crate::refinement::interpolant::Interpolant;
use crate::refinement::interpolator::EdgeInterpolator;
use crate::refinement::refiner::{InterpolationRefiner, RefinementPlan, RefinementResult, Refiner};
use crate::refinement::tree::{InterpolationStrategy, InterpolationTree, TreeBranch};
use crate::test_util::{
    counter_cfa, diamond_cfa, fork_cfa, init_tracing, loop_cfa, node, two_round_loop_cfa, unsafe_cfa,
};
use argus_cfa::{Cfa, CmpOp, Variable};
use std::collections::BTreeMap;

/// Runs location, top and interval analyses under CEGAR against `X`.
fn verify(cfa: &Cfa, config: EngineConfig) -> (Verdict, CegarStatistics) {
    init_tracing();
    let ctx = AnalysisContext::new(cfa, config);
    let cpa = (
        LocationAnalysis,
        TopAnalysis::new(),
        IntervalCpa::new(cfa, ctx.config.precision_scope),
    );
    let target = TargetLocations::new([node(cfa, "X")]);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);
    let verdict = cegar.run().unwrap();
    (verdict, *cegar.statistics())
}

fn with_scope(scope: PrecisionScope) -> EngineConfig {
    EngineConfig {
        precision_scope: scope,
        ..EngineConfig::default()
    }
}

#[test]
fn test_spurious_counter_is_safe_after_one_refinement() {
    for scope in [PrecisionScope::Global, PrecisionScope::Location] {
        let (verdict, stats) = verify(&counter_cfa(), with_scope(scope));
        assert_eq!(verdict, Verdict::Safe, "{scope:?}");
        assert_eq!(stats.refinements, 1, "{scope:?}");
        assert_eq!(stats.reachability_runs, 2);
    }
}

#[test]
fn test_restart_and_bottom_up_agree() {
    let config = EngineConfig {
        restart: RestartStrategy::Root,
        interpolation: InterpolationStrategy::BottomUp,
        ..EngineConfig::default()
    };
    let (verdict, stats) = verify(&counter_cfa(), config);
    assert!(verdict.is_safe());
    assert_eq!(stats.refinements, 1);
}

#[test]
fn test_loop_is_safe() {
    let (global, global_stats) = verify(&loop_cfa(), with_scope(PrecisionScope::Global));
    assert!(global.is_safe());
    assert_eq!(global_stats.refinements, 1);

    // the loop counter becomes relevant one location at a time
    let (local, local_stats) = verify(&loop_cfa(), with_scope(PrecisionScope::Location));
    assert!(local.is_safe());
    assert!(local_stats.refinements > global_stats.refinements);
}

#[test]
fn test_two_round_loop_is_safe() {
    let cfa = two_round_loop_cfa(CmpOp::Eq, 5);
    let (global, global_stats) = verify(&cfa, with_scope(PrecisionScope::Global));
    assert_eq!(global, Verdict::Safe);
    assert_eq!(global_stats.refinements, 1);
    assert_eq!(global_stats.reachability_runs, 2);

    let (local, local_stats) = verify(&cfa, with_scope(PrecisionScope::Location));
    assert_eq!(local, Verdict::Safe);
    assert!(local_stats.refinements > 1);
}

#[test]
fn test_widened_loop_is_safe_after_refinement() {
    init_tracing();
    let cfa = two_round_loop_cfa(CmpOp::Lt, 0);
    let ctx = AnalysisContext::new(&cfa, EngineConfig::default());
    let cpa = (
        LocationAnalysis,
        TopAnalysis::new(),
        IntervalCpa::new(&cfa, PrecisionScope::Global).with_merge(MergeOperator::Join),
    );
    let target = TargetLocations::new([node(&cfa, "X")]);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);

    assert_eq!(cegar.run().unwrap(), Verdict::Safe);
    assert_eq!(cegar.statistics().refinements, 1);

    // the loop head was joined with its back edge and widened
    let header = node(&cfa, "L1");
    let v = Variable::new("v");
    let reached = cegar.reached().unwrap();
    let heads: Vec<_> = reached
        .reached()
        .at_location(header)
        .map(|id| reached.arg().node(id).unwrap().state.s3.get(&v))
        .collect();
    assert_eq!(heads.len(), 1);
    assert_eq!(heads[0].lo(), Some(0));
    assert_eq!(heads[0].hi(), None);
    assert!(reached.reached().at_location(node(&cfa, "X")).next().is_none());
}

#[test]
fn test_real_bug_is_reported_with_its_path() {
    init_tracing();
    let cfa = unsafe_cfa();
    let ctx = AnalysisContext::new(&cfa, EngineConfig::default());
    let cpa = (LocationAnalysis, IntervalCpa::new(&cfa, PrecisionScope::Global));
    let target = TargetLocations::new([node(&cfa, "X")]);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);

    let Verdict::Unsafe(path) = cegar.run().unwrap() else {
        panic!("expected a counterexample");
    };
    assert_eq!(cegar.statistics().refinements, 0);
    assert_eq!(path.len(), 3);
    assert!(cfa.is_walk(path.edges()));
    let arg = cegar.reached().unwrap().arg();
    assert_eq!(arg.node(path.root()).unwrap().location, cfa.entry());
    assert_eq!(arg.node(path.target()).unwrap().location, node(&cfa, "X"));
}

#[test]
fn test_both_fork_targets_are_refined_together() {
    init_tracing();
    let cfa = fork_cfa();
    let config = EngineConfig {
        stop_on_first_target: false,
        ..EngineConfig::default()
    };
    let ctx = AnalysisContext::new(&cfa, config);
    let cpa = (LocationAnalysis, IntervalCpa::new(&cfa, PrecisionScope::Location));
    let target = TargetLocations::new([node(&cfa, "X"), node(&cfa, "Y")]);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);
    assert_eq!(cegar.run().unwrap(), Verdict::Safe);
    assert_eq!(cegar.statistics().refinements, 1);
}

fn fork_branches(cfa: &Cfa) -> (ArgReachedSet<impl Clone + PartialEq, impl Precision>, Vec<TreeBranch>) {
    let config = EngineConfig {
        stop_on_first_target: false,
        ..EngineConfig::default()
    };
    let ctx = AnalysisContext::new(cfa, config);
    let cpa = (LocationAnalysis, TopAnalysis::new());
    let target = TargetLocations::new([node(cfa, "X"), node(cfa, "Y")]);
    let mut algorithm = ReachabilityAlgorithm::new(&cpa, &ctx, &target);
    let mut reached = algorithm.initial_reached().unwrap();
    algorithm.run(&mut reached).unwrap();
    let branches = reached
        .targets()
        .iter()
        .map(|t| {
            let path = ArgPath::from_target(reached.arg(), *t, None).unwrap();
            let edges = path
                .edges()
                .iter()
                .map(|e| cfa.edge(*e).unwrap().clone())
                .collect();
            TreeBranch { path, edges }
        })
        .collect();
    (reached, branches)
}

#[test]
fn test_tree_interpolants_do_not_depend_on_branch_order() {
    let cfa = fork_cfa();
    let (reached, branches) = fork_branches(&cfa);
    assert_eq!(branches.len(), 2);
    let shared = branches[0].path.states()[1];
    assert_eq!(branches[1].path.states()[1], shared);
    let interpolator = EdgeInterpolator::new(&ValuePost, &ValueInterpolantManager);
    let v_is_zero = ValueInterpolant::Values(BTreeMap::from([(Variable::new("v"), 0)]));

    for strategy in [InterpolationStrategy::TopDown, InterpolationStrategy::BottomUp] {
        let mut forward = InterpolationTree::new(branches.clone()).unwrap();
        forward.compute(&interpolator, strategy).unwrap();
        let mut backward = InterpolationTree::new(branches.iter().rev().cloned().collect()).unwrap();
        backward.compute(&interpolator, strategy).unwrap();

        let collect = |tree: &InterpolationTree<ValueInterpolant>| {
            tree.interpolants()
                .map(|(id, i)| (*id, i.clone()))
                .collect::<BTreeMap<ArgStateId, ValueInterpolant>>()
        };
        assert_eq!(collect(&forward), collect(&backward), "{strategy:?}");
        assert_eq!(forward.interpolant(shared), Some(&v_is_zero));
        assert!(forward.interpolant(forward.root()).unwrap().is_true());
        assert_eq!(forward.refinement_roots(), vec![shared]);

        let increment = forward.precision_increment(reached.arg()).unwrap();
        assert!(increment.at(node(&cfa, "A")).unwrap().contains(&Variable::new("v")));
        assert!(increment.at(cfa.entry()).is_none());
    }
}

#[test]
fn test_tree_rejects_malformed_branches() {
    let cfa = fork_cfa();
    let (_, branches) = fork_branches(&cfa);
    let mut short = branches[0].clone();
    short.path = short.path.truncated(1);
    let err = InterpolationTree::<ValueInterpolant>::new(vec![short]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineInvariant);
    assert!(InterpolationTree::<ValueInterpolant>::new(vec![]).is_err());
}

#[test]
fn test_merged_paths_need_branching_information() {
    init_tracing();
    let cfa = diamond_cfa();
    let ctx = AnalysisContext::new(&cfa, EngineConfig::default());
    let cpa = (
        LocationAnalysis,
        IntervalCpa::new(&cfa, PrecisionScope::Global)
            .tracking([Variable::new("v")])
            .with_merge(MergeOperator::Join),
    );
    let target = TargetLocations::new([node(&cfa, "X")]);

    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let err = CegarAlgorithm::new(&cpa, &ctx, &target, refiner)
        .run()
        .unwrap_err();
    assert!(matches!(err, ArgusError::AmbiguousPath { .. }));
    assert_eq!(err.kind(), ErrorKind::Path);

    let refiner =
        InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager).with_branching(&FirstParent);
    let verdict = CegarAlgorithm::new(&cpa, &ctx, &target, refiner).run().unwrap();
    let Verdict::Unsafe(path) = verdict else {
        panic!("expected a counterexample, got {verdict}");
    };
    assert_eq!(path.len(), 2);
    assert!(cfa.is_walk(path.edges()));
}

/// Claims every counterexample is spurious without learning anything.
struct Stubborn;

impl<S: Clone + PartialEq, P: Precision> Refiner<S, P> for Stubborn {
    fn refine(
        &mut self,
        _ctx: &AnalysisContext<'_>,
        reached: &ArgReachedSet<S, P>,
        targets: &[ArgStateId],
    ) -> Result<RefinementResult> {
        let path = ArgPath::from_target(reached.arg(), targets[0], None)?;
        Ok(RefinementResult::Refine(RefinementPlan {
            increment: PrecisionIncrement::new(),
            cut_roots: vec![path.target()],
            explained: vec![path.edges().to_vec()],
        }))
    }
}

#[test]
fn test_repeated_counterexample_is_an_error() {
    init_tracing();
    let cfa = counter_cfa();
    let ctx = AnalysisContext::new(&cfa, EngineConfig::default());
    let cpa = (LocationAnalysis, TopAnalysis::new());
    let target = TargetLocations::new([node(&cfa, "X")]);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, Stubborn);
    let err = cegar.run().unwrap_err();
    let ArgusError::RepeatedCounterexample(edges) = &err else {
        panic!("unexpected {err}");
    };
    assert_eq!(edges.len(), 4);
    assert_eq!(err.kind(), ErrorKind::EngineInvariant);
    assert_eq!(cegar.statistics().refinements, 1);
    assert!(cegar.reached().is_some());
}

#[test]
fn test_refinement_budget() {
    let config = EngineConfig {
        max_refinements: 0,
        ..EngineConfig::default()
    };
    let (verdict, stats) = verify(&counter_cfa(), config);
    assert_eq!(verdict, Verdict::Unknown(UnknownReason::ResourceLimit));
    assert_eq!(stats.refinements, 0);
}

#[test]
fn test_cancelled_before_start() {
    let cfa = counter_cfa();
    let token = CancellationToken::new();
    let ctx = AnalysisContext::new(&cfa, EngineConfig::default()).with_cancellation(token.clone());
    token.cancel();
    let cpa = (LocationAnalysis, TopAnalysis::new());
    let target = TargetLocations::new([node(&cfa, "X")]);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);
    assert_eq!(cegar.run().unwrap(), Verdict::Unknown(UnknownReason::Cancelled));
    assert_eq!(cegar.statistics().reachability_runs, 0);
}

#[test]
fn test_pruning_makes_a_complete_run_unknown() {
    for (incomplete, expected) in [
        (true, Verdict::Unknown(UnknownReason::ResourceLimit)),
        (false, Verdict::Safe),
    ] {
        let cfa = counter_cfa();
        let config = EngineConfig {
            pruning_is_incomplete: incomplete,
            ..EngineConfig::default()
        };
        let ctx = AnalysisContext::new(&cfa, config);
        let cpa = (
            LocationAnalysis,
            BoundedBranchAnalysis::new(0),
            IntervalCpa::new(&cfa, PrecisionScope::Global),
        );
        let target = TargetLocations::new([node(&cfa, "X")]);
        let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
        let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);
        assert_eq!(cegar.run().unwrap(), expected);
        assert_eq!(cegar.statistics().exploration.pruned, 1);
    }
}

#[test]
fn test_transfer_failure_is_unknown() {
    // `w` is not known to the interval analysis
    let cfa = fork_cfa();
    let ctx = AnalysisContext::new(&cfa, EngineConfig::default());
    let cpa = (
        LocationAnalysis,
        IntervalCpa::new(&counter_cfa(), PrecisionScope::Global),
    );
    let target = TargetLocations::new([node(&cfa, "X")]);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let verdict = CegarAlgorithm::new(&cpa, &ctx, &target, refiner).run().unwrap();
    assert!(matches!(
        verdict,
        Verdict::Unknown(UnknownReason::TransferFailure(_))
    ));
}

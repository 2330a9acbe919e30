use super::*;
use crate::analysis::cpa::lattice::flat::FlatLattice;
use crate::analysis::cpa::operators::MergeOperator;
use crate::analysis::cpa::state::{AbstractState, LocationState};
use crate::error::ArgusError;
use argus_cfa::{CfaBuilder, EdgeKind};

fn two_edges() -> argus_cfa::Cfa {
    let mut b = CfaBuilder::new();
    let a = b.node("A");
    let c = b.node("B");
    let d = b.node("C");
    b.edge(a, c, EdgeKind::Blank).unwrap();
    b.edge(c, d, EdgeKind::Blank).unwrap();
    b.build(a).unwrap()
}

#[test]
fn test_follows_leaving_edge() {
    let cfa = two_edges();
    let analysis = LocationAnalysis::new();
    let entry = cfa.entry();
    let state = analysis.initial_state(entry);
    let edge = cfa.leaving_edges(entry)[0];
    let successors: Vec<_> = analysis.transfer(&state, &(), edge).unwrap().into_iter().collect();
    assert_eq!(successors.len(), 1);
    assert_eq!(successors[0].location(), Some(edge.successor));
}

#[test]
fn test_foreign_edge_has_no_successor() {
    let cfa = two_edges();
    let analysis = LocationAnalysis::new();
    let state = analysis.initial_state(cfa.entry());
    let second = cfa.edges().find(|e| e.predecessor != cfa.entry()).unwrap();
    let successors: Vec<_> = analysis.transfer(&state, &(), second).unwrap().into_iter().collect();
    assert!(successors.is_empty());
}

#[test]
fn test_top_follows_any_edge() {
    let cfa = two_edges();
    let state = BasicLocationState::top();
    assert_eq!(state.location(), None);
    for edge in cfa.edges() {
        let next: Vec<_> = state.transfer(edge).into_iter().collect();
        assert_eq!(next, vec![BasicLocationState::location(edge.successor)]);
    }
}

#[test]
fn test_join_is_refused() {
    assert!(!BasicLocationState::supports_join());
    let mut reached = BasicLocationState::location(CfaNodeId(0));
    let new = BasicLocationState::location(CfaNodeId(1));
    let err = MergeOperator::Join.merge("location", &mut reached, &new).unwrap_err();
    assert!(matches!(err, ArgusError::PolicyUnsupported { .. }));
    assert_eq!(reached.inner(), &FlatLattice::Value(CfaNodeId(0)));
}

#[test]
fn test_validate_rejects_join_policy() {
    struct JoiningLocation;
    impl ConfigurableProgramAnalysis for JoiningLocation {
        type State = BasicLocationState;
        type Precision = ();

        fn name(&self) -> String {
            "joining-location".to_string()
        }

        fn initial_state(&self, entry: CfaNodeId) -> Self::State {
            BasicLocationState::location(entry)
        }

        fn initial_precision(&self, _entry: CfaNodeId) -> Self::Precision {}

        fn transfer<'a>(
            &'a self,
            state: &'a Self::State,
            _precision: &Self::Precision,
            edge: &CfaEdge,
        ) -> Result<Successor<'a, Self::State>> {
            Ok(state.transfer(edge))
        }

        fn merge_operator(&self) -> MergeOperator {
            MergeOperator::Join
        }
    }

    assert!(LocationAnalysis.validate().is_ok());
    let err = JoiningLocation.validate().unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
}

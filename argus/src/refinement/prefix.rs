use crate::error::Result;
use crate::refinement::feasibility::{FeasibilityChecker, StrongestPost};
use argus_cfa::{CfaEdge, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::trace;

/// A feasible sequence of edges followed by one edge that cannot be taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfeasiblePrefix {
    edges: Vec<CfaEdge>,
}

impl InfeasiblePrefix {
    /// The prefix, ending in its failing edge. Failing edges of earlier
    /// prefixes appear as `skip`.
    pub fn edges(&self) -> &[CfaEdge] {
        &self.edges
    }

    pub fn failing_index(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn failing_edge(&self) -> Option<&CfaEdge> {
        self.edges.last()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        self.edges.iter().flat_map(|e| e.kind.variables()).collect()
    }

    /// Distinct variables per edge, in thousandths.
    pub fn variable_density(&self) -> i64 {
        let edges = self.edges.len().max(1) as i64;
        self.variables().len() as i64 * 1000 / edges
    }
}

/// Finds every infeasible prefix of an edge sequence.
pub struct PrefixExtractor<'a, P> {
    checker: FeasibilityChecker<'a, P>,
}

impl<'a, P: StrongestPost> PrefixExtractor<'a, P> {
    pub fn new(post: &'a P) -> Self {
        Self {
            checker: FeasibilityChecker::new(post),
        }
    }

    /// The prefixes of `edges` in order of their failing edge. Each failing
    /// edge is replaced by `skip` before looking for the next one, so a
    /// feasible `edges` yields nothing.
    pub fn extract(&self, edges: &[CfaEdge]) -> Result<Vec<InfeasiblePrefix>> {
        let mut working = edges.to_vec();
        let mut prefixes = Vec::new();
        while let Some(failing) = self.checker.first_infeasible(&working)? {
            let Some(edge) = working.get(failing) else {
                break;
            };
            let blanked = edge.as_blank();
            prefixes.push(InfeasiblePrefix {
                edges: working[..=failing].to_vec(),
            });
            trace!("infeasible prefix ending at {}", blanked.id);
            working[failing] = blanked;
        }
        Ok(prefixes)
    }
}

/// Scores prefixes; the highest score is refined.
pub trait PrefixHeuristic {
    fn score(&self, prefix: &InfeasiblePrefix) -> i64;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixPreference {
    Shortest,
    Longest,
    HighestVariableDensity,
    LowestVariableDensity,
}

impl PrefixHeuristic for PrefixPreference {
    fn score(&self, prefix: &InfeasiblePrefix) -> i64 {
        match self {
            PrefixPreference::Shortest => -(prefix.len() as i64),
            PrefixPreference::Longest => prefix.len() as i64,
            PrefixPreference::HighestVariableDensity => prefix.variable_density(),
            PrefixPreference::LowestVariableDensity => -prefix.variable_density(),
        }
    }
}

impl<F: Fn(&InfeasiblePrefix) -> i64> PrefixHeuristic for F {
    fn score(&self, prefix: &InfeasiblePrefix) -> i64 {
        self(prefix)
    }
}

pub struct PrefixSelector<H> {
    heuristic: H,
}

impl<H: PrefixHeuristic> PrefixSelector<H> {
    pub fn new(heuristic: H) -> Self {
        Self { heuristic }
    }

    /// The best-scoring prefix; ties go to the earliest.
    pub fn select<'p>(&self, prefixes: &'p [InfeasiblePrefix]) -> Option<&'p InfeasiblePrefix> {
        let mut best: Option<(&InfeasiblePrefix, i64)> = None;
        for prefix in prefixes {
            let score = self.heuristic.score(prefix);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((prefix, score));
            }
        }
        best.map(|(p, _)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::interval::refinement::ValuePost;
    use argus_cfa::{CfaBuilder, CmpOp, EdgeKind, Expr};

    /// `v := 0; [v == 1]; w := 2; [w == 3]`, infeasible twice.
    fn twice_infeasible() -> Vec<CfaEdge> {
        let mut b = CfaBuilder::new();
        b.variable("v");
        b.variable("w");
        let n: Vec<_> = (0..5).map(|i| b.node(format!("N{i}"))).collect();
        let kinds = [
            EdgeKind::assign("v", 0i64),
            EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 1i64),
            EdgeKind::assign("w", 2i64),
            EdgeKind::assume(Expr::var("w"), CmpOp::Eq, 3i64),
        ];
        let ids: Vec<_> = kinds
            .into_iter()
            .enumerate()
            .map(|(i, k)| b.edge(n[i], n[i + 1], k).unwrap())
            .collect();
        let cfa = b.build(n[0]).unwrap();
        ids.iter().map(|id| cfa.edge(*id).unwrap().clone()).collect()
    }

    #[test]
    fn test_extracts_every_failing_edge() {
        let edges = twice_infeasible();
        let prefixes = PrefixExtractor::new(&ValuePost).extract(&edges).unwrap();
        assert_eq!(prefixes.len(), 2);
        assert_eq!(prefixes[0].len(), 2);
        assert_eq!(prefixes[0].failing_edge(), Some(&edges[1]));
        assert_eq!(prefixes[1].len(), 4);
        assert_eq!(prefixes[1].failing_index(), 3);
        assert_eq!(prefixes[1].edges()[1], edges[1].as_blank());
    }

    #[test]
    fn test_feasible_sequence_has_no_prefix() {
        let edges = twice_infeasible();
        let prefixes = PrefixExtractor::new(&ValuePost).extract(&edges[..1]).unwrap();
        assert!(prefixes.is_empty());
    }

    #[test]
    fn test_selection_by_preference() {
        let edges = twice_infeasible();
        let prefixes = PrefixExtractor::new(&ValuePost).extract(&edges).unwrap();
        let pick = |p: PrefixPreference| PrefixSelector::new(p).select(&prefixes).unwrap().len();
        assert_eq!(pick(PrefixPreference::Shortest), 2);
        assert_eq!(pick(PrefixPreference::Longest), 4);
        // {v} over 2 edges against {v, w} over 4 edges
        assert_eq!(prefixes[0].variable_density(), 500);
        assert_eq!(prefixes[1].variable_density(), 500);
        assert_eq!(pick(PrefixPreference::HighestVariableDensity), 2);
        assert_eq!(pick(PrefixPreference::LowestVariableDensity), 2);
    }

    #[test]
    fn test_custom_heuristic_and_ties() {
        let edges = twice_infeasible();
        let prefixes = PrefixExtractor::new(&ValuePost).extract(&edges).unwrap();
        let constant = PrefixSelector::new(|_: &InfeasiblePrefix| 7i64);
        assert_eq!(constant.select(&prefixes), prefixes.first());
        let last_edge = PrefixSelector::new(|p: &InfeasiblePrefix| p.failing_index() as i64);
        assert_eq!(last_edge.select(&prefixes).unwrap().len(), 4);
        assert_eq!(constant.select(&[]), None);
    }
}

use crate::analysis::arg::{ArgStateId, BlockFrame};
use crate::analysis::cpa::ConfigurableProgramAnalysis;
use crate::analysis::cpa::operators::Adjustment;
use crate::analysis::cpa::reached::{ArgReachedSet, WaitlistOrder};
use crate::analysis::cpa::reducer::Reducer;
use crate::analysis::cpa::residue::{EmptyResidue, Residue};
use crate::analysis::cpa::state::{LocationState, StateDisplayWrapper};
use crate::context::AnalysisContext;
use crate::error::{ArgusError, Result};
use argus_cfa::{CfaEdge, CfaNodeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Decides which states violate the property under analysis.
pub trait TargetSpecification<S> {
    fn is_target(&self, state: &S) -> bool;
}

impl<S, F: Fn(&S) -> bool> TargetSpecification<S> for F {
    fn is_target(&self, state: &S) -> bool {
        self(state)
    }
}

/// Every state at one of the given locations is a target.
#[derive(Debug, Clone, Default)]
pub struct TargetLocations(pub BTreeSet<CfaNodeId>);

impl TargetLocations {
    pub fn new<I: IntoIterator<Item = CfaNodeId>>(locations: I) -> Self {
        Self(locations.into_iter().collect())
    }
}

impl<S: LocationState> TargetSpecification<S> for TargetLocations {
    fn is_target(&self, state: &S) -> bool {
        state.location().is_some_and(|l| self.0.contains(&l))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReachabilityOutcome {
    /// The waitlist ran empty.
    Complete,
    /// Exploration stopped after reaching this target state.
    TargetReached(ArgStateId),
    Cancelled,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ReachabilityStatistics {
    pub iterations: usize,
    pub transfers: usize,
    pub merges: usize,
    pub covered: usize,
    pub pruned: usize,
    /// Target markings, including merged replacements of earlier targets.
    pub targets: usize,
}

/// The worklist fixpoint over the operators of a CPA.
///
/// Each iteration pops one state, computes its successors along every
/// leaving edge, merges them into reached siblings, adjusts their precision,
/// and either records them as covered or adds them to the reached set.
pub struct ReachabilityAlgorithm<'a, A, T, R = EmptyResidue<<A as ConfigurableProgramAnalysis>::State>>
where
    A: ConfigurableProgramAnalysis,
{
    cpa: &'a A,
    ctx: &'a AnalysisContext<'a>,
    target: &'a T,
    residue: R,
    rpo: HashMap<CfaNodeId, usize>,
    stats: ReachabilityStatistics,
}

type Candidate<S> = (S, Vec<BlockFrame<S>>);

impl<'a, A, T> ReachabilityAlgorithm<'a, A, T>
where
    A: ConfigurableProgramAnalysis,
    A::State: LocationState,
    T: TargetSpecification<A::State>,
{
    pub fn new(cpa: &'a A, ctx: &'a AnalysisContext<'a>, target: &'a T) -> Self {
        Self::with_residue(cpa, ctx, target)
    }
}

impl<'a, A, T, R> ReachabilityAlgorithm<'a, A, T, R>
where
    A: ConfigurableProgramAnalysis,
    A::State: LocationState,
    T: TargetSpecification<A::State>,
    R: Residue<A::State>,
{
    pub fn with_residue(cpa: &'a A, ctx: &'a AnalysisContext<'a>, target: &'a T) -> Self {
        let rpo = ctx
            .cfa
            .reverse_postorder()
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        Self {
            cpa,
            ctx,
            target,
            residue: R::new(),
            rpo,
            stats: ReachabilityStatistics::default(),
        }
    }

    pub fn statistics(&self) -> &ReachabilityStatistics {
        &self.stats
    }

    pub fn finalize(self) -> R::Output {
        self.residue.finalize()
    }

    fn priority(&self, state: &A::State, location: CfaNodeId) -> i64 {
        match self.ctx.config.waitlist {
            WaitlistOrder::ReversePostorder => {
                let index = self.rpo.get(&location).copied().unwrap_or(self.rpo.len());
                -(index as i64)
            }
            WaitlistOrder::Ranked => self.cpa.rank(state),
            WaitlistOrder::Dfs | WaitlistOrder::Bfs => 0,
        }
    }

    /// A reached set holding only the initial state at the CFA entry.
    pub fn initial_reached(&self) -> Result<ArgReachedSet<A::State, A::Precision>> {
        let entry = self.ctx.cfa.entry();
        let state = self.cpa.initial_state(entry);
        let precision = self.cpa.initial_precision(entry);
        let location = state.location().unwrap_or(entry);
        let priority = self.priority(&state, location);
        let target = self.target.is_target(&state);
        let mut reached = ArgReachedSet::new(self.ctx.config.waitlist);
        let root = reached.add_root(state, location, precision, priority);
        if target {
            reached.mark_target(root, true)?;
        }
        Ok(reached)
    }

    /// Runs the fixpoint until the waitlist is empty, a target is reached
    /// (when configured to stop on the first one), or cancellation.
    #[instrument(skip_all, fields(analysis = %self.cpa.name()))]
    pub fn run(
        &mut self,
        reached: &mut ArgReachedSet<A::State, A::Precision>,
    ) -> Result<ReachabilityOutcome> {
        self.cpa.validate()?;
        let cfa = self.ctx.cfa;
        let stop_on_first = self.ctx.config.stop_on_first_target;
        let mut found_target = !reached.targets().is_empty();
        loop {
            if self.ctx.is_cancelled() {
                debug!("cancelled after {} iterations", self.stats.iterations);
                return Ok(ReachabilityOutcome::Cancelled);
            }
            if found_target && stop_on_first {
                if let Some(target) = reached.targets().first() {
                    debug!("reached target {target}");
                    return Ok(ReachabilityOutcome::TargetReached(*target));
                }
                found_target = false;
            }
            let Some(current) = reached.pop() else {
                break;
            };
            self.stats.iterations += 1;
            let (state, location, scope) = {
                let node = reached.arg().node(current)?;
                (node.state.clone(), node.location, node.scope().to_vec())
            };
            let precision = reached.reached().precision(current)?.clone();
            trace!("expanding {current}: {}", StateDisplayWrapper(&state));

            let mut parent = current;
            for edge in cfa.leaving_edges(location) {
                for (successor, successor_scope) in self.successors(&state, &precision, edge, &scope)? {
                    found_target |= self.process(reached, &mut parent, edge, successor, successor_scope, &precision)?;
                }
            }
        }
        debug!("exploration complete: {:?}", self.stats);
        Ok(match reached.targets().first() {
            Some(target) => ReachabilityOutcome::TargetReached(*target),
            None => ReachabilityOutcome::Complete,
        })
    }

    /// Transfer along `edge`. Leaving a block expands `state` back into its
    /// entry context before the transfer; entering one reduces the successor.
    fn successors(
        &mut self,
        state: &A::State,
        precision: &A::Precision,
        edge: &CfaEdge,
        scope: &[BlockFrame<A::State>],
    ) -> Result<Vec<Candidate<A::State>>> {
        let cfa = self.ctx.cfa;
        let cpa = self.cpa;
        let reducer = cpa.reducer();
        let mut outer_scope = scope.to_vec();
        let expanded;
        let source = match cfa.block_exited_by(edge) {
            Some(block) => match outer_scope.pop() {
                Some(frame) if frame.block == block.id => {
                    expanded = reducer.expand(&frame.root, block, state);
                    &expanded
                }
                _ => {
                    return Err(ArgusError::invariant(format!(
                        "{edge} leaves block {} which was never entered",
                        block.id
                    )));
                }
            },
            None => state,
        };
        let entered = cfa.block_entered_by(edge);
        let mut out = Vec::new();
        for mut successor in cpa.transfer(source, precision, edge)? {
            self.stats.transfers += 1;
            let mut successor_scope = outer_scope.clone();
            if let Some(block) = entered {
                let root = successor;
                successor = reducer.reduce(&root, block);
                successor_scope.push(BlockFrame {
                    block: block.id,
                    root: Arc::new(root),
                });
            }
            self.residue.new_state(state, edge, &successor);
            out.push((successor, successor_scope));
        }
        Ok(out)
    }

    /// Sets the target flag of `id` and counts it. Returns `target`.
    fn note_target(
        &mut self,
        reached: &mut ArgReachedSet<A::State, A::Precision>,
        id: ArgStateId,
        target: bool,
    ) -> Result<bool> {
        reached.mark_target(id, target)?;
        if target {
            self.stats.targets += 1;
        }
        Ok(target)
    }

    /// Merges, adjusts, and stops one successor. Returns whether a state
    /// became a target on the way, be it the candidate itself, a merged
    /// sibling, or the state covering a target candidate.
    fn process(
        &mut self,
        reached: &mut ArgReachedSet<A::State, A::Precision>,
        parent: &mut ArgStateId,
        edge: &CfaEdge,
        candidate: A::State,
        scope: Vec<BlockFrame<A::State>>,
        precision: &A::Precision,
    ) -> Result<bool> {
        let mut found_target = false;
        let location = candidate
            .location()
            .ok_or_else(|| ArgusError::TransferFailure {
                analysis: self.cpa.name(),
                edge: edge.id,
                reason: "successor has no location".to_string(),
            })?;

        for sibling in reached.siblings(location, &scope) {
            let (mut merged, sibling_precision) = {
                let state = reached.arg().node(sibling)?.state.clone();
                (state, reached.reached().precision(sibling)?.clone())
            };
            if self.cpa.merge(&mut merged, &candidate, &sibling_precision)?.merged() {
                self.stats.merges += 1;
                self.residue
                    .merged_state(&reached.arg().node(sibling)?.state, &candidate, &merged);
                let priority = self.priority(&merged, location);
                let target = self.target.is_target(&merged);
                let replacement = reached.replace_merged(sibling, merged, *parent, edge.id, priority)?;
                found_target |= self.note_target(reached, replacement, target)?;
                if sibling == *parent {
                    *parent = replacement;
                }
            }
        }

        let siblings = reached.siblings(location, &scope);
        let sibling_states = siblings
            .iter()
            .map(|id| reached.arg().node(*id).map(|n| &n.state))
            .collect::<Result<Vec<_>>>()?;
        let (candidate, candidate_precision) =
            match self
                .cpa
                .adjust_precision(candidate, precision, &sibling_states)?
            {
                Adjustment::Continue(s, p) => (s, p),
                Adjustment::Break => {
                    self.stats.pruned += 1;
                    trace!("pruned successor along {edge}");
                    return Ok(found_target);
                }
            };

        let covering = self
            .cpa
            .covering_index(&candidate, &sibling_states, &candidate_precision);
        if let Some(index) = covering {
            let by = *siblings.get(index).ok_or_else(|| {
                ArgusError::invariant(format!("covering index {index} is out of range"))
            })?;
            self.stats.covered += 1;
            self.residue.covered_state(&candidate, sibling_states[index]);
            let covers_target = self.target.is_target(&candidate);
            let id = reached.add_covered(*parent, edge.id, candidate, location, scope, by)?;
            trace!("{id} covered by {by}");
            if covers_target && !reached.arg().node(by)?.is_target() {
                debug!("{by} covers the target state {id}");
                found_target |= self.note_target(reached, by, true)?;
            }
            return Ok(found_target);
        }

        let is_target = self.target.is_target(&candidate);
        let priority = self.priority(&candidate, location);
        let id = reached.add_successor(
            *parent,
            edge.id,
            candidate,
            location,
            scope,
            candidate_precision,
            priority,
        )?;
        found_target |= self.note_target(reached, id, is_target)?;
        Ok(found_target)
    }
}

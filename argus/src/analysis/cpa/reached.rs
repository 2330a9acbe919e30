use crate::analysis::arg::{Arg, ArgStateId, BlockFrame};
use crate::analysis::cpa::precision::{Precision, PrecisionIncrement};
use crate::error::{ArgusError, Result};
use argus_cfa::{CfaEdgeId, CfaNodeId};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, VecDeque};
use tracing::{debug, trace};

/// The order in which waiting states are popped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitlistOrder {
    Dfs,
    Bfs,
    /// Lowest reverse-postorder index of the location first.
    ReversePostorder,
    /// Highest analysis-defined rank first.
    Ranked,
}

/// States waiting to be expanded.
///
/// Removal is lazy: every queued entry carries the sequence number it was
/// pushed with, and an entry is live only while `members` maps its id to
/// that number. The queues are compacted once stale entries outnumber the
/// live ones.
#[derive(Debug, Clone)]
pub struct Waitlist {
    order: WaitlistOrder,
    queue: VecDeque<(u64, ArgStateId)>,
    heap: BinaryHeap<(i64, Reverse<u64>, ArgStateId)>,
    members: HashMap<ArgStateId, u64>,
    sequence: u64,
}

const COMPACTION_THRESHOLD: usize = 64;

impl Waitlist {
    pub fn new(order: WaitlistOrder) -> Self {
        Self {
            order,
            queue: VecDeque::new(),
            heap: BinaryHeap::new(),
            members: HashMap::new(),
            sequence: 0,
        }
    }

    pub fn order(&self) -> WaitlistOrder {
        self.order
    }

    /// Adds `id` unless it is already waiting.
    pub fn push(&mut self, id: ArgStateId, priority: i64) {
        if self.members.contains_key(&id) {
            return;
        }
        let seq = self.sequence;
        self.sequence += 1;
        self.members.insert(id, seq);
        match self.order {
            WaitlistOrder::Dfs | WaitlistOrder::Bfs => self.queue.push_back((seq, id)),
            WaitlistOrder::ReversePostorder | WaitlistOrder::Ranked => {
                self.heap.push((priority, Reverse(seq), id));
            }
        }
    }

    pub fn pop(&mut self) -> Option<ArgStateId> {
        loop {
            let (seq, next) = match self.order {
                WaitlistOrder::Dfs => self.queue.pop_back(),
                WaitlistOrder::Bfs => self.queue.pop_front(),
                WaitlistOrder::ReversePostorder | WaitlistOrder::Ranked => {
                    self.heap.pop().map(|(_, Reverse(seq), id)| (seq, id))
                }
            }?;
            if self.members.get(&next) == Some(&seq) {
                self.members.remove(&next);
                return Some(next);
            }
        }
    }

    pub fn remove(&mut self, id: ArgStateId) -> bool {
        let removed = self.members.remove(&id).is_some();
        if removed {
            self.compact_if_stale();
        }
        removed
    }

    pub fn contains(&self, id: ArgStateId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Entries held in the underlying queue, stale ones included.
    pub(crate) fn stored(&self) -> usize {
        self.queue.len() + self.heap.len()
    }

    fn compact_if_stale(&mut self) {
        let stale = self.stored() - self.members.len();
        if stale < COMPACTION_THRESHOLD || stale <= self.members.len() {
            return;
        }
        let members = &self.members;
        self.queue.retain(|(seq, id)| members.get(id) == Some(seq));
        self.heap
            .retain(|(_, Reverse(seq), id)| members.get(id) == Some(seq));
        trace!("compacted waitlist to {} entries", self.stored());
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.heap.clear();
        self.members.clear();
    }
}

#[derive(Debug, Clone)]
pub struct ReachedEntry<P> {
    pub precision: P,
    pub location: CfaNodeId,
    pub priority: i64,
}

/// Reached states with their precision, indexed by location.
#[derive(Debug, Clone)]
pub struct ReachedSet<P> {
    entries: BTreeMap<ArgStateId, ReachedEntry<P>>,
    by_location: HashMap<CfaNodeId, BTreeSet<ArgStateId>>,
    waitlist: Waitlist,
}

impl<P> ReachedSet<P> {
    pub fn new(order: WaitlistOrder) -> Self {
        Self {
            entries: BTreeMap::new(),
            by_location: HashMap::new(),
            waitlist: Waitlist::new(order),
        }
    }

    /// Adds `id` to the reached set and the waitlist.
    pub fn add(&mut self, id: ArgStateId, location: CfaNodeId, precision: P, priority: i64) {
        self.entries.insert(
            id,
            ReachedEntry {
                precision,
                location,
                priority,
            },
        );
        self.by_location.entry(location).or_default().insert(id);
        self.waitlist.push(id, priority);
    }

    pub fn remove(&mut self, id: ArgStateId) -> Option<ReachedEntry<P>> {
        let entry = self.entries.remove(&id)?;
        if let Some(ids) = self.by_location.get_mut(&entry.location) {
            ids.remove(&id);
        }
        self.waitlist.remove(id);
        Some(entry)
    }

    pub fn contains(&self, id: ArgStateId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entry(&self, id: ArgStateId) -> Option<&ReachedEntry<P>> {
        self.entries.get(&id)
    }

    pub fn precision(&self, id: ArgStateId) -> Result<&P> {
        self.entries
            .get(&id)
            .map(|e| &e.precision)
            .ok_or_else(|| ArgusError::invariant(format!("{id} is not in the reached set")))
    }

    /// Reached states at `location`, in creation order.
    pub fn at_location(&self, location: CfaNodeId) -> impl Iterator<Item = ArgStateId> + '_ {
        self.by_location
            .get(&location)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    pub fn ids(&self) -> impl Iterator<Item = ArgStateId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn waitlist(&self) -> &Waitlist {
        &self.waitlist
    }

    pub fn has_waiting(&self) -> bool {
        !self.waitlist.is_empty()
    }

    pub fn pop(&mut self) -> Option<ArgStateId> {
        self.waitlist.pop()
    }

    /// Puts a reached state back on the waitlist.
    pub fn reactivate(&mut self, id: ArgStateId) -> Result<()> {
        let priority = self
            .entries
            .get(&id)
            .map(|e| e.priority)
            .ok_or_else(|| ArgusError::invariant(format!("{id} is not in the reached set")))?;
        self.waitlist.push(id, priority);
        Ok(())
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_location.clear();
        self.waitlist.clear();
    }
}

/// The ARG together with the reached set over its nodes.
///
/// All mutation of either structure goes through this type, so that the two
/// always agree: every reached id names a live, uncovered ARG node.
#[derive(Debug, Clone)]
pub struct ArgReachedSet<S, P> {
    arg: Arg<S>,
    reached: ReachedSet<P>,
}

impl<S: Clone + PartialEq, P: Precision> ArgReachedSet<S, P> {
    pub fn new(order: WaitlistOrder) -> Self {
        Self {
            arg: Arg::new(),
            reached: ReachedSet::new(order),
        }
    }

    pub fn arg(&self) -> &Arg<S> {
        &self.arg
    }

    pub fn reached(&self) -> &ReachedSet<P> {
        &self.reached
    }

    pub fn pop(&mut self) -> Option<ArgStateId> {
        self.reached.pop()
    }

    pub fn add_root(&mut self, state: S, location: CfaNodeId, precision: P, priority: i64) -> ArgStateId {
        let id = self.arg.insert(state, location, Vec::new());
        self.arg.set_root(id);
        self.reached.add(id, location, precision, priority);
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_successor(
        &mut self,
        parent: ArgStateId,
        edge: CfaEdgeId,
        state: S,
        location: CfaNodeId,
        scope: Vec<BlockFrame<S>>,
        precision: P,
        priority: i64,
    ) -> Result<ArgStateId> {
        let id = self.arg.insert(state, location, scope);
        self.arg.link(parent, edge, id)?;
        self.reached.add(id, location, precision, priority);
        Ok(id)
    }

    /// Records a successor that is covered by the reached state `by`.
    pub fn add_covered(
        &mut self,
        parent: ArgStateId,
        edge: CfaEdgeId,
        state: S,
        location: CfaNodeId,
        scope: Vec<BlockFrame<S>>,
        by: ArgStateId,
    ) -> Result<ArgStateId> {
        let id = self.arg.insert(state, location, scope);
        self.arg.link(parent, edge, id)?;
        self.arg.cover(id, by)?;
        Ok(id)
    }

    pub fn mark_target(&mut self, id: ArgStateId, target: bool) -> Result<()> {
        self.arg.set_target(id, target)
    }

    /// Replaces the reached state `old` by a new node holding `merged`.
    ///
    /// The new node inherits every parent, child and covered state of `old`
    /// and additionally gets `(parent, edge)` as a parent, since the merged
    /// state also stands for the candidate that was merged in. It is reached
    /// with `old`'s precision and put on the waitlist.
    pub fn replace_merged(
        &mut self,
        old: ArgStateId,
        merged: S,
        parent: ArgStateId,
        edge: CfaEdgeId,
        priority: i64,
    ) -> Result<ArgStateId> {
        let entry = self
            .reached
            .remove(old)
            .ok_or_else(|| ArgusError::invariant(format!("merged state {old} is not reached")))?;
        let (location, scope) = {
            let node = self.arg.node(old)?;
            (node.location, node.scope.clone())
        };
        let new = self.arg.insert(merged, location, scope);
        self.arg.transplant(old, new)?;
        let parent = if parent == old { new } else { parent };
        self.arg.link(parent, edge, new)?;
        self.reached.add(new, location, entry.precision, priority);
        trace!("replaced {old} by merged state {new}");
        Ok(new)
    }

    /// Reached states at `location` whose block scope equals `scope`.
    pub fn siblings(&self, location: CfaNodeId, scope: &[BlockFrame<S>]) -> Vec<ArgStateId> {
        self.reached
            .at_location(location)
            .filter(|id| self.arg.get(*id).is_some_and(|n| n.scope() == scope))
            .collect()
    }

    pub fn targets(&self) -> Vec<ArgStateId> {
        self.arg.targets()
    }

    /// Removes the ARG below `roots` and re-expands the surviving parents
    /// with refined precision.
    ///
    /// The removed set is every descendant of a root plus every state covered
    /// by a removed state. The parents of removed states that survive are put
    /// back on the waitlist. Returns those parents. If the ARG root itself
    /// would be removed, the whole analysis restarts from the root instead.
    pub fn remove_subtree(
        &mut self,
        roots: &[ArgStateId],
        increment: &PrecisionIncrement,
    ) -> Result<Vec<ArgStateId>> {
        let mut removed = self.arg.descendants(roots);
        let mut frontier: Vec<ArgStateId> = removed.iter().copied().collect();
        while let Some(id) = frontier.pop() {
            if let Some(node) = self.arg.get(id) {
                for covered in node.covers() {
                    if removed.insert(*covered) {
                        frontier.push(*covered);
                    }
                }
            }
        }
        if self.arg.root().is_some_and(|r| removed.contains(&r)) {
            self.restart(increment)?;
            return Ok(self.arg.root().into_iter().collect());
        }

        let mut survivors = BTreeSet::new();
        for id in &removed {
            for (parent, _) in self.arg.node(*id)?.parents() {
                if !removed.contains(parent) {
                    survivors.insert(*parent);
                }
            }
        }
        for id in &survivors {
            if !self.reached.contains(*id) {
                return Err(ArgusError::invariant(format!(
                    "parent {id} of a removed state is not reached"
                )));
            }
        }

        for id in &removed {
            self.reached.remove(*id);
            self.arg.remove(*id)?;
        }
        for id in &survivors {
            if let Some(entry) = self.reached.entries.get_mut(id) {
                entry.precision = entry.precision.refine(increment);
            }
            self.reached.reactivate(*id)?;
        }
        debug!(
            "removed {} ARG states, re-expanding {} parents",
            removed.len(),
            survivors.len()
        );
        Ok(survivors.into_iter().collect())
    }

    /// Discards everything and starts over from the root state with its
    /// precision refined by `increment`.
    pub fn restart(&mut self, increment: &PrecisionIncrement) -> Result<ArgStateId> {
        let root = self
            .arg
            .root()
            .ok_or_else(|| ArgusError::invariant("cannot restart without a root"))?;
        let node = self.arg.node(root)?;
        let state = node.state.clone();
        let location = node.location;
        let entry = self
            .reached
            .entry(root)
            .ok_or_else(|| ArgusError::invariant(format!("root {root} is not reached")))?;
        let precision = entry.precision.refine(increment);
        let priority = entry.priority;
        self.arg.clear();
        self.reached.clear();
        debug!("restarting exploration from the root");
        Ok(self.add_root(state, location, precision, priority))
    }
}

use argus_cfa::{CfaNodeId, Variable};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Display, Formatter};

/// Per-domain analysis precision. Refinement derives a new value.
pub trait Precision: Clone + Debug + PartialEq {
    fn refine(&self, increment: &PrecisionIncrement) -> Self;
}

impl Precision for () {
    fn refine(&self, _: &PrecisionIncrement) -> Self {}
}

impl<A: Precision, B: Precision> Precision for (A, B) {
    fn refine(&self, increment: &PrecisionIncrement) -> Self {
        (self.0.refine(increment), self.1.refine(increment))
    }
}

impl<A: Precision, B: Precision, C: Precision> Precision for (A, B, C) {
    fn refine(&self, increment: &PrecisionIncrement) -> Self {
        (
            self.0.refine(increment),
            self.1.refine(increment),
            self.2.refine(increment),
        )
    }
}

/// Variables to start tracking, keyed by the location the refiner found
/// them relevant at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecisionIncrement {
    entries: BTreeMap<CfaNodeId, BTreeSet<Variable>>,
}

impl PrecisionIncrement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<I: IntoIterator<Item = Variable>>(&mut self, location: CfaNodeId, vars: I) {
        let mut vars = vars.into_iter().peekable();
        if vars.peek().is_some() {
            self.entries.entry(location).or_default().extend(vars);
        }
    }

    pub fn extend(&mut self, other: &PrecisionIncrement) {
        for (loc, vars) in &other.entries {
            self.add(*loc, vars.iter().copied());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn at(&self, location: CfaNodeId) -> Option<&BTreeSet<Variable>> {
        self.entries.get(&location)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CfaNodeId, &BTreeSet<Variable>)> {
        self.entries.iter()
    }

    /// Every variable mentioned at any location.
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.entries.values().flatten().copied().collect()
    }
}

impl Display for PrecisionIncrement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.entries
                .iter()
                .map(|(loc, vars)| format!("{loc}: [{}]", vars.iter().join(", ")))
                .join(", ")
        )
    }
}

/// Whether a refined variable is tracked everywhere or only where the
/// refiner found it relevant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrecisionScope {
    Global,
    Location,
}

/// A set of tracked variables, either global or per location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePrecision {
    scope: PrecisionScope,
    global: BTreeSet<Variable>,
    local: BTreeMap<CfaNodeId, BTreeSet<Variable>>,
}

impl VariablePrecision {
    /// A precision tracking nothing.
    pub fn empty(scope: PrecisionScope) -> Self {
        Self {
            scope,
            global: BTreeSet::new(),
            local: BTreeMap::new(),
        }
    }

    /// A precision tracking `vars` at every location, independent of scope.
    pub fn tracking<I: IntoIterator<Item = Variable>>(scope: PrecisionScope, vars: I) -> Self {
        Self {
            scope,
            global: vars.into_iter().collect(),
            local: BTreeMap::new(),
        }
    }

    pub fn scope(&self) -> PrecisionScope {
        self.scope
    }

    pub fn tracks(&self, var: &Variable, location: CfaNodeId) -> bool {
        self.global.contains(var)
            || self
                .local
                .get(&location)
                .is_some_and(|vars| vars.contains(var))
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.local.values().all(BTreeSet::is_empty)
    }
}

impl Precision for VariablePrecision {
    fn refine(&self, increment: &PrecisionIncrement) -> Self {
        let mut refined = self.clone();
        match self.scope {
            PrecisionScope::Global => refined.global.extend(increment.variables()),
            PrecisionScope::Location => {
                for (loc, vars) in increment.iter() {
                    refined.local.entry(*loc).or_default().extend(vars.iter().copied());
                }
            }
        }
        refined
    }
}

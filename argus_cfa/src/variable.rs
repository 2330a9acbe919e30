use internment::Intern;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// A program variable, identified by its interned name.
///
/// Interning keeps variables `Copy` so that abstract states and precisions can
/// hold them in ordered collections without cloning strings.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Variable(Intern<String>);

impl Variable {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self(Intern::new(name.as_ref().to_string()))
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Self(Intern::new(value))
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Variable> for String {
    fn from(value: Variable) -> Self {
        value.name().to_string()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Debug for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Variable({})", self.name())
    }
}

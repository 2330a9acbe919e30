use crate::variable::Variable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Integer expressions appearing on assignment and assumption edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Const(i64),
    Var(Variable),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn var<V: Into<Variable>>(v: V) -> Self {
        Expr::Var(v.into())
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Expr::Add(Box::new(left), Box::new(right))
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Expr::Sub(Box::new(left), Box::new(right))
    }

    pub fn mul(left: Expr, right: Expr) -> Self {
        Expr::Mul(Box::new(left), Box::new(right))
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    pub fn as_var(&self) -> Option<Variable> {
        match self {
            Expr::Var(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<i64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(v) => {
                out.insert(*v);
            }
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
            Expr::Neg(a) => a.collect_variables(out),
        }
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    /// Printed without parentheses as an operand. A negated constant or
    /// variable counts.
    fn is_atomic(&self) -> bool {
        match self {
            Expr::Const(_) | Expr::Var(_) => true,
            Expr::Neg(inner) => matches!(**inner, Expr::Const(_) | Expr::Var(_)),
            _ => false,
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Const(value)
    }
}

impl From<Variable> for Expr {
    fn from(value: Variable) -> Self {
        Expr::Var(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn negate(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Ge => CmpOp::Lt,
        }
    }

    /// The operator obtained by swapping the operands: `a < b` iff `b > a`.
    pub fn flip(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ne => CmpOp::Ne,
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
        }
    }

    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// A binary comparison used by assumption edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub op: CmpOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Condition {
    pub fn new<L: Into<Expr>, R: Into<Expr>>(lhs: L, op: CmpOp, rhs: R) -> Self {
        Self {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn negated(&self) -> Self {
        Self {
            op: self.op.negate(),
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
        }
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = self.lhs.variables();
        self.rhs.collect_variables(&mut out);
        out
    }
}

/// The operation performed when an edge is taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EdgeKind {
    #[default]
    Blank,
    Assign {
        var: Variable,
        expr: Expr,
    },
    /// Nondeterministic assignment.
    Havoc {
        var: Variable,
    },
    Assume(Condition),
}

impl EdgeKind {
    pub fn assign<V: Into<Variable>, E: Into<Expr>>(var: V, expr: E) -> Self {
        EdgeKind::Assign {
            var: var.into(),
            expr: expr.into(),
        }
    }

    pub fn havoc<V: Into<Variable>>(var: V) -> Self {
        EdgeKind::Havoc { var: var.into() }
    }

    pub fn assume<L: Into<Expr>, R: Into<Expr>>(lhs: L, op: CmpOp, rhs: R) -> Self {
        EdgeKind::Assume(Condition::new(lhs, op, rhs))
    }

    pub fn is_assume(&self) -> bool {
        matches!(self, EdgeKind::Assume(_))
    }

    /// Every variable read or written by this operation.
    pub fn variables(&self) -> BTreeSet<Variable> {
        match self {
            EdgeKind::Blank => BTreeSet::new(),
            EdgeKind::Assign { var, expr } => {
                let mut out = expr.variables();
                out.insert(*var);
                out
            }
            EdgeKind::Havoc { var } => BTreeSet::from([*var]),
            EdgeKind::Assume(cond) => cond.variables(),
        }
    }
}

fn fmt_operand(e: &Expr, f: &mut Formatter<'_>) -> std::fmt::Result {
    if e.is_atomic() {
        write!(f, "{e}")
    } else {
        write!(f, "({e})")
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Add(a, b) => {
                fmt_operand(a, f)?;
                write!(f, " + ")?;
                fmt_operand(b, f)
            }
            Expr::Sub(a, b) => {
                fmt_operand(a, f)?;
                write!(f, " - ")?;
                fmt_operand(b, f)
            }
            Expr::Mul(a, b) => {
                fmt_operand(a, f)?;
                write!(f, " * ")?;
                fmt_operand(b, f)
            }
            Expr::Neg(a) => {
                write!(f, "-")?;
                fmt_operand(a, f)
            }
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Blank => write!(f, "skip"),
            EdgeKind::Assign { var, expr } => write!(f, "{var} := {expr}"),
            EdgeKind::Havoc { var } => write!(f, "{var} := *"),
            EdgeKind::Assume(cond) => write!(f, "[{cond}]"),
        }
    }
}

//! Fixtures shared by the unit tests.

use argus_cfa::{Cfa, CfaBuilder, CfaNodeId, CmpOp, EdgeKind, Expr};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn node(cfa: &Cfa, label: &str) -> CfaNodeId {
    cfa.node_by_label(label).unwrap()
}

fn increment(var: &str) -> EdgeKind {
    EdgeKind::assign(var, Expr::add(Expr::var(var), 1i64.into()))
}

/// `E -[v := 0]-> L1 -[v := v + 1]-> L2 -[v := v + 1]-> L3 -[v == 5]-> X`
pub fn counter_cfa() -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("v");
    let e = b.node("E");
    let l1 = b.node("L1");
    let l2 = b.node("L2");
    let l3 = b.node("L3");
    let x = b.node("X");
    b.edge(e, l1, EdgeKind::assign("v", 0i64)).unwrap();
    b.edge(l1, l2, increment("v")).unwrap();
    b.edge(l2, l3, increment("v")).unwrap();
    b.edge(l3, x, EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 5i64)).unwrap();
    b.build(e).unwrap()
}

/// A counting loop whose exit can never reach `X`:
/// `E -[i := 0]-> L`, `L -[i < 3]-> B -[i := i + 1]-> L`,
/// `L -[i >= 3]-> D -[i < 0]-> X`.
pub fn loop_cfa() -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("i");
    let e = b.node("E");
    let l = b.node("L");
    let body = b.node("B");
    let d = b.node("D");
    let x = b.node("X");
    b.edge(e, l, EdgeKind::assign("i", 0i64)).unwrap();
    b.edge(l, body, EdgeKind::assume(Expr::var("i"), CmpOp::Lt, 3i64)).unwrap();
    b.edge(body, l, increment("i")).unwrap();
    b.edge(l, d, EdgeKind::assume(Expr::var("i"), CmpOp::Ge, 3i64)).unwrap();
    b.edge(d, x, EdgeKind::assume(Expr::var("i"), CmpOp::Lt, 0i64)).unwrap();
    b.build(e).unwrap()
}

/// `E -[v := 0]-> L1 -[v := v + 1]-> L2 -[v == 1]-> X`, a real bug.
pub fn unsafe_cfa() -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("v");
    let e = b.node("E");
    let l1 = b.node("L1");
    let l2 = b.node("L2");
    let x = b.node("X");
    b.edge(e, l1, EdgeKind::assign("v", 0i64)).unwrap();
    b.edge(l1, l2, increment("v")).unwrap();
    b.edge(l2, x, EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 1i64)).unwrap();
    b.build(e).unwrap()
}

/// Two infeasible target paths sharing the prefix `E -> A`:
/// `E -[v := 0]-> A`, `A -[w := 1]-> B -[v == 1]-> X`,
/// `A -[w := 2]-> C -[v == 2]-> Y`.
pub fn fork_cfa() -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("v");
    b.variable("w");
    let e = b.node("E");
    let a = b.node("A");
    let bb = b.node("B");
    let c = b.node("C");
    let x = b.node("X");
    let y = b.node("Y");
    b.edge(e, a, EdgeKind::assign("v", 0i64)).unwrap();
    b.edge(a, bb, EdgeKind::assign("w", 1i64)).unwrap();
    b.edge(a, c, EdgeKind::assign("w", 2i64)).unwrap();
    b.edge(bb, x, EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 1i64)).unwrap();
    b.edge(c, y, EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 2i64)).unwrap();
    b.build(e).unwrap()
}

/// `E -[w := 7]-> P -[v := 1]-> B0 -[v := v + 1]-> B1 -[skip]-> Q -[w == 7]-> R`
/// with `{B0, B1}` a block that only uses `v`.
pub fn block_cfa() -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("v");
    b.variable("w");
    let e = b.node("E");
    let p = b.node("P");
    let b0 = b.node("B0");
    let b1 = b.node("B1");
    let q = b.node("Q");
    let r = b.node("R");
    b.edge(e, p, EdgeKind::assign("w", 7i64)).unwrap();
    b.edge(p, b0, EdgeKind::assign("v", 1i64)).unwrap();
    b.edge(b0, b1, increment("v")).unwrap();
    b.edge(b1, q, EdgeKind::Blank).unwrap();
    b.edge(q, r, EdgeKind::assume(Expr::var("w"), CmpOp::Eq, 7i64)).unwrap();
    b.block(b0, [b0, b1]).unwrap();
    b.build(e).unwrap()
}

/// `E -[v := 0]-> A`, `E -[v := 1]-> A`, `A -[skip]-> X`.
pub fn diamond_cfa() -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("v");
    let e = b.node("E");
    let a = b.node("A");
    let x = b.node("X");
    b.edge(e, a, EdgeKind::assign("v", 0i64)).unwrap();
    b.edge(e, a, EdgeKind::assign("v", 1i64)).unwrap();
    b.edge(a, x, EdgeKind::Blank).unwrap();
    b.build(e).unwrap()
}

/// A loop that increments `v` twice before leaving towards `X`:
/// `E -[v := 0]-> L1`, `L1 -[v < 2]-> H -[v := v + 1]-> L1`,
/// `L1 -[v >= 2]-> L2 -[v op c]-> X`.
pub fn two_round_loop_cfa(op: CmpOp, c: i64) -> Cfa {
    let mut b = CfaBuilder::new();
    b.variable("v");
    let e = b.node("E");
    let l1 = b.node("L1");
    let h = b.node("H");
    let l2 = b.node("L2");
    let x = b.node("X");
    b.edge(e, l1, EdgeKind::assign("v", 0i64)).unwrap();
    b.edge(l1, h, EdgeKind::assume(Expr::var("v"), CmpOp::Lt, 2i64)).unwrap();
    b.edge(h, l1, increment("v")).unwrap();
    b.edge(l1, l2, EdgeKind::assume(Expr::var("v"), CmpOp::Ge, 2i64)).unwrap();
    b.edge(l2, x, EdgeKind::assume(Expr::var("v"), op, c)).unwrap();
    b.build(e).unwrap()
}

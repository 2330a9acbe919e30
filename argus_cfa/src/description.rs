use crate::builder::CfaBuilder;
use crate::cfa::{Cfa, CfaNodeId};
use crate::error::CfaError;
use crate::expr::EdgeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A label-based, serializable description of a CFA.
///
/// Nodes are created in the order they first appear: `nodes` first, then the
/// endpoints of `edges`. The entry must be one of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfaDescription {
    pub entry: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeDescription>,
    #[serde(default)]
    pub blocks: Vec<BlockDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDescription {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub op: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDescription {
    pub entry: String,
    pub nodes: Vec<String>,
}

impl CfaDescription {
    pub fn build(&self) -> Result<Cfa, CfaError> {
        let mut builder = CfaBuilder::new();
        let mut ids: HashMap<&str, CfaNodeId> = HashMap::new();
        for v in &self.variables {
            builder.variable(v.as_str());
        }
        let labels = self
            .nodes
            .iter()
            .chain(self.edges.iter().flat_map(|e| [&e.from, &e.to]));
        for label in labels {
            if !ids.contains_key(label.as_str()) {
                ids.insert(label.as_str(), builder.node(label.as_str()));
            }
        }
        let lookup = |label: &String| {
            ids.get(label.as_str())
                .copied()
                .ok_or_else(|| CfaError::UnknownLabel(label.clone()))
        };
        for edge in &self.edges {
            builder.edge(lookup(&edge.from)?, lookup(&edge.to)?, edge.op.clone())?;
        }
        for block in &self.blocks {
            let nodes = block.nodes.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
            builder.block(lookup(&block.entry)?, nodes)?;
        }
        builder.build(lookup(&self.entry)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{CmpOp, Expr};

    #[test]
    fn test_build_from_description() {
        let desc = CfaDescription {
            entry: "E".into(),
            variables: vec!["v".into()],
            nodes: vec![],
            edges: vec![
                EdgeDescription {
                    from: "E".into(),
                    to: "L".into(),
                    op: EdgeKind::assign("v", 0i64),
                },
                EdgeDescription {
                    from: "L".into(),
                    to: "X".into(),
                    op: EdgeKind::assume(Expr::var("v"), CmpOp::Eq, 5i64),
                },
            ],
            blocks: vec![],
        };
        let cfa = desc.build().unwrap();
        assert_eq!(cfa.node_count(), 3);
        let x = cfa.node_by_label("X").unwrap();
        let into_x = cfa.entering_edges(x);
        assert_eq!(into_x.len(), 1);
        assert_eq!(into_x[0].kind.to_string(), "[v == 5]");
    }

    #[test]
    fn test_unknown_entry_label() {
        let desc = CfaDescription {
            entry: "nowhere".into(),
            nodes: vec!["E".into()],
            ..Default::default()
        };
        assert_eq!(
            desc.build().unwrap_err(),
            CfaError::UnknownLabel("nowhere".into())
        );
    }
}

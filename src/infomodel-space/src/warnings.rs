//! Tolerated anomalies collected while the graph is mutated.

use std::fmt;

use serde::{Deserialize, Serialize};

use infomodel_core::{NodeId, QualifiedName};

/// A structural anomaly that was tolerated instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ModelWarning {
    /// A hierarchical child was added next to a sibling with the same browse name.
    DuplicateBrowseName {
        parent: NodeId,
        browse_name: QualifiedName,
    },
    /// A reference points at a node that was never created.
    UnresolvedReference {
        source: NodeId,
        reference_type: NodeId,
        target: NodeId,
    },
    /// A composed string id was taken, so a numeric id was assigned instead.
    NodeIdFallback { requested: NodeId, assigned: NodeId },
    /// An instance declaration was not cloned.
    SkippedInstanceDeclaration { declaration: NodeId, reason: String },
    /// An instance declaration was reached again on its own expansion path.
    InstantiationCycle { declaration: NodeId },
}

impl fmt::Display for ModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBrowseName {
                parent,
                browse_name,
            } => write!(f, "duplicate browse name {browse_name} under {parent}"),
            Self::UnresolvedReference {
                source,
                reference_type,
                target,
            } => write!(
                f,
                "unresolved reference {source} --{reference_type}--> {target}"
            ),
            Self::NodeIdFallback {
                requested,
                assigned,
            } => write!(f, "node id {requested} is taken, assigned {assigned}"),
            Self::SkippedInstanceDeclaration {
                declaration,
                reason,
            } => write!(f, "skipped instance declaration {declaration}: {reason}"),
            Self::InstantiationCycle { declaration } => {
                write!(f, "instance declaration {declaration} is recursive, not expanded")
            }
        }
    }
}

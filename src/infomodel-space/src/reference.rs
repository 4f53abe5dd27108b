//! Directed, typed references between nodes.

use serde::{Deserialize, Serialize};

use infomodel_core::NodeId;

/// A reference record stored on the node that owns it.
///
/// `is_forward` is seen from the owning node: a forward record on A pointing
/// at B is mirrored by an inverse record on B pointing at A.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// The ReferenceType node.
    pub reference_type: NodeId,
    /// Direction seen from the owning node.
    pub is_forward: bool,
    /// The peer node.
    pub target: NodeId,
}

impl Reference {
    /// Create a forward reference.
    pub fn forward(reference_type: NodeId, target: NodeId) -> Self {
        Self {
            reference_type,
            is_forward: true,
            target,
        }
    }

    /// Create an inverse reference.
    pub fn inverse(reference_type: NodeId, target: NodeId) -> Self {
        Self {
            reference_type,
            is_forward: false,
            target,
        }
    }

    /// The mirrored record as stored on the peer, which points back at `owner`.
    pub fn mirrored(&self, owner: &NodeId) -> Self {
        Self {
            reference_type: self.reference_type.clone(),
            is_forward: !self.is_forward,
            target: owner.clone(),
        }
    }
}

/// The references owned by one node, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceList {
    references: Vec<Reference>,
}

impl ReferenceList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns false if an identical record exists.
    pub fn insert(&mut self, reference: Reference) -> bool {
        if self.references.contains(&reference) {
            return false;
        }
        self.references.push(reference);
        true
    }

    /// Remove a record. Returns false if it was not present.
    pub fn remove(&mut self, reference: &Reference) -> bool {
        let before = self.references.len();
        self.references.retain(|r| r != reference);
        self.references.len() != before
    }

    /// Remove every record pointing at `peer`, returning them.
    pub fn remove_peer(&mut self, peer: &NodeId) -> Vec<Reference> {
        let (removed, kept) = std::mem::take(&mut self.references)
            .into_iter()
            .partition(|r| &r.target == peer);
        self.references = kept;
        removed
    }

    /// Check whether an identical record exists.
    pub fn contains(&self, reference: &Reference) -> bool {
        self.references.contains(reference)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.references.clear();
    }
}

impl<'a> IntoIterator for &'a ReferenceList {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.references.iter()
    }
}

//! Node and reference mutation.
//!
//! Every reference is stored twice: on its owner as given and mirrored on the
//! peer. When the peer does not exist yet the mirrored record is parked in
//! the pending table and attached once the peer is created.

use std::collections::HashSet;

use log::{debug, trace};

use common_config::BrowseNamePolicy;
use common_error::{ModelError, ModelResult, ensure};
use infomodel_core::well_known::{ReferenceTypeIds, ns0};
use infomodel_core::{LocalizedText, NodeClass, NodeId, QualifiedName};

use crate::address_space::AddressSpace;
use crate::node::{NodeSpec, UaNode};
use crate::reference::{Reference, ReferenceList};
use crate::warnings::ModelWarning;

/// A hierarchical child whose browse name is already used under its parent.
struct NameConflict {
    parent: NodeId,
    browse_name: QualifiedName,
}

impl AddressSpace {
    /// Create a node and its references, returning the node id.
    ///
    /// Without an explicit id the next free numeric id in the spec's
    /// namespace (or its browse name's namespace) is allocated. Records parked
    /// for this id by earlier forward references are attached.
    pub fn create_node(&mut self, spec: NodeSpec) -> ModelResult<NodeId> {
        self.ensure_live()?;
        let NodeSpec {
            node_id,
            namespace,
            browse_name,
            display_name,
            description,
            attributes,
            references,
        } = spec;

        let node_id = match node_id {
            Some(id) => {
                ensure!(!self.nodes.contains_key(&id), DuplicateNodeId: "{}", id);
                self.namespaces.get(id.namespace)?;
                id
            }
            None => self.build_node_id(None, namespace.unwrap_or(browse_name.namespace_index))?,
        };
        for reference in &references {
            self.check_reference_type(&reference.reference_type)?;
        }

        let pending = self.pending.get(&node_id).cloned().unwrap_or_default();
        let conflicts =
            self.creation_conflicts(&node_id, &browse_name, references.iter().chain(&pending))?;
        self.apply_policy(&conflicts)?;

        let class = attributes.node_class();
        let display_name =
            display_name.unwrap_or_else(|| LocalizedText::new(browse_name.name.clone()));
        self.nodes.insert(
            node_id.clone(),
            UaNode {
                node_id: node_id.clone(),
                browse_name: browse_name.clone(),
                display_name,
                description,
                attributes,
                references: ReferenceList::new(),
            },
        );
        self.browse_names
            .entry(browse_name)
            .or_default()
            .push(node_id.clone());
        debug!("Created {class} node {node_id}");

        if let Some(records) = self.pending.remove(&node_id) {
            trace!("Attaching {} pending references to {node_id}", records.len());
            if let Some(node) = self.nodes.get_mut(&node_id) {
                for record in records {
                    node.references.insert(record);
                }
            }
        }
        for reference in references {
            self.insert_reference(&node_id, reference);
        }
        for conflict in conflicts {
            self.warn(ModelWarning::DuplicateBrowseName {
                parent: conflict.parent,
                browse_name: conflict.browse_name,
            });
        }
        if class == NodeClass::DataType {
            self.invalidate_data_type_cache();
        }
        Ok(node_id)
    }

    /// Add a reference from `source` to `target`, plus its mirrored record.
    ///
    /// Adding an existing reference is a no-op. A missing end is tolerated:
    /// its record is attached when the node is created.
    pub fn add_reference(
        &mut self,
        source: &NodeId,
        reference_type: &NodeId,
        target: &NodeId,
        is_forward: bool,
    ) -> ModelResult<()> {
        self.ensure_live()?;
        self.check_reference_type(reference_type)?;
        let record = Reference {
            reference_type: reference_type.clone(),
            is_forward,
            target: target.clone(),
        };
        if self.has_record(source, &record) {
            return Ok(());
        }

        let mut conflict = None;
        if self.is_hierarchical(reference_type)? {
            let (parent, child) = if is_forward {
                (source, target)
            } else {
                (target, source)
            };
            if let Some(child_node) = self.nodes.get(child) {
                if self.has_child_named(parent, &child_node.browse_name, child)? {
                    conflict = Some(NameConflict {
                        parent: parent.clone(),
                        browse_name: child_node.browse_name.clone(),
                    });
                }
            }
        }
        self.apply_policy(conflict.as_slice())?;

        self.insert_reference(source, record);
        if let Some(conflict) = conflict {
            self.warn(ModelWarning::DuplicateBrowseName {
                parent: conflict.parent,
                browse_name: conflict.browse_name,
            });
        }
        Ok(())
    }

    /// Remove a reference and its mirrored record. Returns whether anything
    /// was removed; a missing reference is a no-op.
    pub fn remove_reference(
        &mut self,
        source: &NodeId,
        reference_type: &NodeId,
        target: &NodeId,
        is_forward: bool,
    ) -> ModelResult<bool> {
        self.ensure_live()?;
        let record = Reference {
            reference_type: reference_type.clone(),
            is_forward,
            target: target.clone(),
        };
        let removed_here = self.remove_record(source, &record);
        let removed_there = self.remove_record(target, &record.mirrored(source));
        if removed_here || removed_there {
            trace!("Removed reference {source} --{reference_type}--> {target}");
        }
        Ok(removed_here || removed_there)
    }

    /// References of `node_id` in one direction whose type is
    /// `reference_type`, or a subtype of it when `include_subtypes` is set.
    pub fn find_references(
        &self,
        node_id: &NodeId,
        reference_type: &NodeId,
        is_forward: bool,
        include_subtypes: bool,
    ) -> ModelResult<Vec<Reference>> {
        self.ensure_live()?;
        let node = self.require_node(node_id)?;
        let mut found = Vec::new();
        for reference in node.references.iter().filter(|r| r.is_forward == is_forward) {
            if self.reference_type_matches(&reference.reference_type, reference_type, include_subtypes)? {
                found.push(reference.clone());
            }
        }
        Ok(found)
    }

    /// Delete a node and every reference touching it.
    ///
    /// Children aggregated only by the deleted node (forward `Aggregates`
    /// subtypes) are deleted with it. Deleting an unknown node is a no-op.
    pub fn delete_node(&mut self, node_id: &NodeId) -> ModelResult<()> {
        self.ensure_live()?;
        if !self.nodes.contains_key(node_id) {
            debug!("Node {node_id} is already deleted");
            self.pending.remove(node_id);
            return Ok(());
        }
        let doomed = self.deletion_set(node_id)?;
        let mut data_types_touched = false;
        for id in doomed.iter().rev() {
            if let Some(node) = self.unlink_node(id) {
                data_types_touched |= node.node_class() == NodeClass::DataType;
            }
        }
        if data_types_touched {
            self.invalidate_data_type_cache();
        }
        debug!("Deleted {node_id} ({} nodes)", doomed.len());
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    pub(crate) fn check_reference_type(&self, reference_type: &NodeId) -> ModelResult<()> {
        match self.nodes.get(reference_type) {
            Some(node) if node.node_class() == NodeClass::ReferenceType => Ok(()),
            Some(node) => Err(ModelError::unknown_reference_type(format!(
                "{reference_type} is a {}",
                node.node_class()
            ))),
            None => Err(ModelError::unknown_reference_type(reference_type.to_string())),
        }
    }

    pub(crate) fn is_hierarchical(&self, reference_type: &NodeId) -> ModelResult<bool> {
        self.is_subtype_of(reference_type, &Self::hierarchical_references())
    }

    pub(crate) fn reference_type_matches(
        &self,
        candidate: &NodeId,
        wanted: &NodeId,
        include_subtypes: bool,
    ) -> ModelResult<bool> {
        if candidate == wanted {
            return Ok(true);
        }
        if !include_subtypes {
            return Ok(false);
        }
        self.is_subtype_of(candidate, wanted)
    }

    fn has_record(&self, owner: &NodeId, record: &Reference) -> bool {
        match self.nodes.get(owner) {
            Some(node) => node.references.contains(record),
            None => self
                .pending
                .get(owner)
                .is_some_and(|records| records.contains(record)),
        }
    }

    /// Store `record` on `owner` and its mirror on the peer, parking either
    /// side whose node does not exist.
    pub(crate) fn insert_reference(&mut self, owner: &NodeId, record: Reference) -> bool {
        let mirrored = record.mirrored(owner);
        let peer = record.target.clone();
        trace!(
            "Adding reference {owner} --{}{}--> {peer}",
            if record.is_forward { "" } else { "!" },
            record.reference_type
        );
        let inserted = self.store_record(owner, record);
        self.store_record(&peer, mirrored);
        inserted
    }

    fn store_record(&mut self, owner: &NodeId, record: Reference) -> bool {
        match self.nodes.get_mut(owner) {
            Some(node) => node.references.insert(record),
            None => {
                let records = self.pending.entry(owner.clone()).or_default();
                if records.contains(&record) {
                    false
                } else {
                    records.push(record);
                    true
                }
            }
        }
    }

    fn remove_record(&mut self, owner: &NodeId, record: &Reference) -> bool {
        match self.nodes.get_mut(owner) {
            Some(node) => node.references.remove(record),
            None => {
                let Some(records) = self.pending.get_mut(owner) else {
                    return false;
                };
                let before = records.len();
                records.retain(|r| r != record);
                let removed = records.len() != before;
                if records.is_empty() {
                    self.pending.remove(owner);
                }
                removed
            }
        }
    }

    /// Remove a node and the mirrors of all its records, without cascading.
    pub(crate) fn unlink_node(&mut self, node_id: &NodeId) -> Option<UaNode> {
        let node = self.nodes.remove(node_id)?;
        for record in &node.references {
            self.remove_record(&record.target, &record.mirrored(node_id));
        }
        if let Some(ids) = self.browse_names.get_mut(&node.browse_name) {
            ids.retain(|id| id != node_id);
            if ids.is_empty() {
                self.browse_names.remove(&node.browse_name);
            }
        }
        self.pending.remove(node_id);
        debug!("Unlinked node {node_id}");
        Some(node)
    }

    /// The node plus every aggregated child that no surviving node aggregates.
    fn deletion_set(&self, root: &NodeId) -> ModelResult<Vec<NodeId>> {
        let aggregates = ns0(ReferenceTypeIds::AGGREGATES);
        let mut doomed = vec![root.clone()];
        let mut seen: HashSet<NodeId> = HashSet::from([root.clone()]);
        let mut cursor = 0;
        while let Some(current) = doomed.get(cursor).cloned() {
            cursor += 1;
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for record in node.references.iter().filter(|r| r.is_forward) {
                if seen.contains(&record.target)
                    || !self.reference_type_matches(&record.reference_type, &aggregates, true)?
                {
                    continue;
                }
                let Some(child) = self.nodes.get(&record.target) else {
                    continue;
                };
                let mut owned = true;
                for parent_ref in child.references.iter().filter(|r| !r.is_forward) {
                    if !seen.contains(&parent_ref.target)
                        && self.reference_type_matches(&parent_ref.reference_type, &aggregates, true)?
                    {
                        owned = false;
                        break;
                    }
                }
                if owned {
                    seen.insert(record.target.clone());
                    doomed.push(record.target.clone());
                }
            }
        }
        Ok(doomed)
    }

    /// Check whether `parent` already has a hierarchical child other than
    /// `except` browsing as `name`.
    pub(crate) fn has_child_named(
        &self,
        parent: &NodeId,
        name: &QualifiedName,
        except: &NodeId,
    ) -> ModelResult<bool> {
        let Some(parent) = self.nodes.get(parent) else {
            return Ok(false);
        };
        for record in parent
            .references
            .iter()
            .filter(|r| r.is_forward && &r.target != except)
        {
            let same_name = self
                .nodes
                .get(&record.target)
                .is_some_and(|child| &child.browse_name == name);
            if same_name && self.is_hierarchical(&record.reference_type)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Browse name conflicts the new node `node_id` named `browse_name` would
    /// cause through `records` (seen from the new node).
    fn creation_conflicts<'r>(
        &self,
        node_id: &NodeId,
        browse_name: &QualifiedName,
        records: impl Iterator<Item = &'r Reference>,
    ) -> ModelResult<Vec<NameConflict>> {
        let mut conflicts = Vec::new();
        let mut child_names: Vec<&QualifiedName> = Vec::new();
        for record in records {
            if !self.nodes.contains_key(&record.target) || !self.is_hierarchical(&record.reference_type)? {
                continue;
            }
            if record.is_forward {
                let Some(child) = self.nodes.get(&record.target) else {
                    continue;
                };
                if child_names.contains(&&child.browse_name) {
                    conflicts.push(NameConflict {
                        parent: node_id.clone(),
                        browse_name: child.browse_name.clone(),
                    });
                }
                child_names.push(&child.browse_name);
            } else if self.has_child_named(&record.target, browse_name, node_id)? {
                conflicts.push(NameConflict {
                    parent: record.target.clone(),
                    browse_name: browse_name.clone(),
                });
            }
        }
        Ok(conflicts)
    }

    fn apply_policy(&self, conflicts: &[NameConflict]) -> ModelResult<()> {
        match (self.config.naming.duplicate_browse_names, conflicts.first()) {
            (BrowseNamePolicy::Reject, Some(conflict)) => Err(ModelError::duplicate_browse_name(
                format!("{} under {}", conflict.browse_name, conflict.parent),
            )),
            _ => Ok(()),
        }
    }
}

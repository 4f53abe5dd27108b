//! Directional browsing and browse-name navigation.

use serde::{Deserialize, Serialize};

use common_error::{ModelError, ModelResult};
use infomodel_core::well_known::{ReferenceTypeIds, ns0};
use infomodel_core::{LocalizedText, NodeClass, NodeClassMask, NodeId, QualifiedName, StatusCode};

use crate::address_space::AddressSpace;
use crate::node::UaNode;

/// Which records of a node to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrowseDirection {
    #[default]
    Forward,
    Inverse,
    Both,
}

impl BrowseDirection {
    fn accepts(self, is_forward: bool) -> bool {
        match self {
            Self::Forward => is_forward,
            Self::Inverse => !is_forward,
            Self::Both => true,
        }
    }
}

/// What to browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseDescription {
    pub node_id: NodeId,
    pub direction: BrowseDirection,
    /// Only follow references of this type; `None` follows everything.
    pub reference_type: Option<NodeId>,
    pub include_subtypes: bool,
    /// Only report targets of these classes; empty reports all.
    pub node_class_mask: NodeClassMask,
}

impl BrowseDescription {
    /// Browse every forward reference of `node_id`.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            direction: BrowseDirection::Forward,
            reference_type: None,
            include_subtypes: true,
            node_class_mask: NodeClassMask::empty(),
        }
    }

    #[must_use]
    pub fn with_direction(mut self, direction: BrowseDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_reference_type(mut self, reference_type: NodeId, include_subtypes: bool) -> Self {
        self.reference_type = Some(reference_type);
        self.include_subtypes = include_subtypes;
        self
    }

    #[must_use]
    pub fn with_node_class_mask(mut self, mask: NodeClassMask) -> Self {
        self.node_class_mask = mask;
        self
    }
}

/// One reference reported by browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDescription {
    pub reference_type: NodeId,
    pub is_forward: bool,
    pub node_id: NodeId,
    pub browse_name: QualifiedName,
    pub display_name: LocalizedText,
    pub node_class: NodeClass,
    pub type_definition: Option<NodeId>,
}

/// Outcome of browsing one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseResult {
    pub status: StatusCode,
    pub references: Vec<ReferenceDescription>,
}

impl BrowseResult {
    fn bad(status: StatusCode) -> Self {
        Self {
            status,
            references: Vec::new(),
        }
    }
}

impl AddressSpace {
    /// Browse one node. Failures are reported through the result status.
    ///
    /// References are reported in insertion order. Targets that have not been
    /// created yet are skipped.
    pub fn browse(&self, description: &BrowseDescription) -> BrowseResult {
        match self.try_browse(description) {
            Ok(references) => BrowseResult {
                status: StatusCode::GOOD,
                references,
            },
            Err(err) => BrowseResult::bad(StatusCode::from(&err)),
        }
    }

    fn try_browse(&self, description: &BrowseDescription) -> ModelResult<Vec<ReferenceDescription>> {
        self.ensure_live()?;
        let node = self.require_node(&description.node_id)?;
        if let Some(reference_type) = &description.reference_type {
            self.check_reference_type(reference_type)?;
        }

        let mut references = Vec::new();
        for record in node
            .references
            .iter()
            .filter(|r| description.direction.accepts(r.is_forward))
        {
            if let Some(wanted) = &description.reference_type {
                if !self.reference_type_matches(
                    &record.reference_type,
                    wanted,
                    description.include_subtypes,
                )? {
                    continue;
                }
            }
            let Some(target) = self.nodes.get(&record.target) else {
                continue;
            };
            if !description.node_class_mask.accepts(target.node_class()) {
                continue;
            }
            references.push(ReferenceDescription {
                reference_type: record.reference_type.clone(),
                is_forward: record.is_forward,
                node_id: target.node_id.clone(),
                browse_name: target.browse_name.clone(),
                display_name: target.display_name.clone(),
                node_class: target.node_class(),
                type_definition: target
                    .forward_target(ReferenceTypeIds::HAS_TYPE_DEFINITION)
                    .cloned(),
            });
        }
        Ok(references)
    }

    /// Forward children of `node_id` through `reference_type` or its subtypes.
    pub fn children(&self, node_id: &NodeId, reference_type: &NodeId) -> ModelResult<Vec<&UaNode>> {
        let mut children = Vec::new();
        for record in self.find_references(node_id, reference_type, true, true)? {
            if let Some(child) = self.nodes.get(&record.target) {
                children.push(child);
            }
        }
        Ok(children)
    }

    fn child_through(
        &self,
        node_id: &NodeId,
        name: &QualifiedName,
        reference_type: u32,
    ) -> Option<NodeId> {
        self.children(node_id, &ns0(reference_type))
            .ok()?
            .into_iter()
            .find(|child| child.browse_name == *name || name_matches_any_namespace(child, name))
            .map(|child| child.node_id.clone())
    }

    /// A hierarchical child by browse name.
    ///
    /// A name given in namespace 0 also matches children in other
    /// namespaces, so `"Speed"` finds `2:Speed`.
    pub fn child_by_name(&self, node_id: &NodeId, name: impl Into<QualifiedName>) -> Option<NodeId> {
        self.child_through(node_id, &name.into(), ReferenceTypeIds::HIERARCHICAL_REFERENCES)
    }

    /// A HasComponent child by browse name.
    pub fn component_by_name(&self, node_id: &NodeId, name: impl Into<QualifiedName>) -> Option<NodeId> {
        self.child_through(node_id, &name.into(), ReferenceTypeIds::HAS_COMPONENT)
    }

    /// A HasProperty child by browse name.
    pub fn property_by_name(&self, node_id: &NodeId, name: impl Into<QualifiedName>) -> Option<NodeId> {
        self.child_through(node_id, &name.into(), ReferenceTypeIds::HAS_PROPERTY)
    }

    /// Follow hierarchical forward references from `start` by browse name.
    pub fn translate_browse_path(&self, start: &NodeId, path: &[QualifiedName]) -> ModelResult<NodeId> {
        self.ensure_live()?;
        self.require_node(start)?;
        let mut current = start.clone();
        for (depth, name) in path.iter().enumerate() {
            current = self
                .child_through(&current, name, ReferenceTypeIds::HIERARCHICAL_REFERENCES)
                .ok_or_else(|| {
                    ModelError::unknown_node(format!(
                        "{start} has no path element {name} at depth {depth}"
                    ))
                })?;
        }
        Ok(current)
    }
}

fn name_matches_any_namespace(child: &UaNode, name: &QualifiedName) -> bool {
    name.namespace_index == 0 && child.browse_name.name == name.name
}

#[cfg(test)]
mod tests {
    use infomodel_core::well_known::{DataTypeIds, ObjectIds, ObjectTypeIds};

    use super::*;
    use crate::node::NodeSpec;

    fn plant() -> (AddressSpace, NodeId, NodeId, NodeId) {
        let mut space = AddressSpace::with_core_model();
        let ns = space.register_namespace("urn:plant").unwrap();
        let pump = space
            .create_node(
                NodeSpec::object(QualifiedName::new(ns, "Pump"))
                    .organized_by(ns0(ObjectIds::OBJECTS_FOLDER))
                    .type_definition(ns0(ObjectTypeIds::BASE_OBJECT_TYPE)),
            )
            .unwrap();
        let speed = space
            .create_node(
                NodeSpec::variable(QualifiedName::new(ns, "Speed"), ns0(DataTypeIds::DOUBLE))
                    .component_of(pump.clone()),
            )
            .unwrap();
        let serial = space
            .create_node(
                NodeSpec::variable(QualifiedName::new(ns, "Serial"), ns0(DataTypeIds::STRING))
                    .property_of(pump.clone()),
            )
            .unwrap();
        (space, pump, speed, serial)
    }

    #[test]
    fn test_browse_forward_in_insertion_order() {
        let (space, pump, speed, serial) = plant();
        let result = space.browse(&BrowseDescription::new(pump.clone()));

        assert_eq!(result.status, StatusCode::GOOD);
        let targets: Vec<_> = result.references.iter().map(|r| r.node_id.clone()).collect();
        assert_eq!(
            targets,
            vec![ns0(ObjectTypeIds::BASE_OBJECT_TYPE), speed, serial]
        );
    }

    #[test]
    fn test_browse_filters() {
        let (space, pump, speed, _) = plant();

        let components = space.browse(
            &BrowseDescription::new(pump.clone())
                .with_reference_type(ns0(ReferenceTypeIds::HAS_COMPONENT), false),
        );
        assert_eq!(components.references.len(), 1);
        assert_eq!(components.references[0].node_id, speed);

        let aggregated = space.browse(
            &BrowseDescription::new(pump.clone())
                .with_reference_type(ns0(ReferenceTypeIds::AGGREGATES), true)
                .with_node_class_mask(NodeClassMask::VARIABLE),
        );
        assert_eq!(aggregated.references.len(), 2);

        let parents = space.browse(
            &BrowseDescription::new(pump).with_direction(BrowseDirection::Inverse),
        );
        assert_eq!(parents.references.len(), 1);
        assert_eq!(parents.references[0].node_id, ns0(ObjectIds::OBJECTS_FOLDER));
        assert!(!parents.references[0].is_forward);
    }

    #[test]
    fn test_browse_unknown_node() {
        let (space, ..) = plant();
        let result = space.browse(&BrowseDescription::new(NodeId::numeric(1, 77_777)));
        assert_eq!(result.status, StatusCode::BAD_NODE_ID_UNKNOWN);
        assert!(result.references.is_empty());

        let result = space.browse(
            &BrowseDescription::new(ns0(ObjectIds::ROOT_FOLDER))
                .with_reference_type(ns0(DataTypeIds::DOUBLE), true),
        );
        assert_eq!(result.status, StatusCode::BAD_REFERENCE_TYPE_ID_INVALID);
    }

    #[test]
    fn test_child_lookups() {
        let (space, pump, speed, serial) = plant();
        assert_eq!(space.child_by_name(&pump, "Speed"), Some(speed.clone()));
        assert_eq!(space.component_by_name(&pump, "1:Speed"), Some(speed));
        assert_eq!(space.component_by_name(&pump, "Serial"), None);
        assert_eq!(space.property_by_name(&pump, "Serial"), Some(serial.clone()));

        let found = space
            .translate_browse_path(
                &ns0(ObjectIds::OBJECTS_FOLDER),
                &[QualifiedName::new(1, "Pump"), QualifiedName::new(1, "Serial")],
            )
            .unwrap();
        assert_eq!(found, serial);
        assert!(space
            .translate_browse_path(&ns0(ObjectIds::OBJECTS_FOLDER), &[QualifiedName::from("Missing")])
            .is_err());
    }
}

//! Nodes and their class-specific attributes.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use infomodel_core::well_known::{ReferenceTypeIds, ns0};
use infomodel_core::{
    AccessLevel, DataValue, DateTime, LocalizedText, NodeClass, NodeId, QualifiedName, Variant,
};

use crate::data_types::DataTypeDefinition;
use crate::method::MethodHandler;
use crate::reference::{Reference, ReferenceList};
use crate::value::ValueSource;

/// A node in the address space.
#[derive(Debug, Clone)]
pub struct UaNode {
    pub(crate) node_id: NodeId,
    pub(crate) browse_name: QualifiedName,
    pub(crate) display_name: LocalizedText,
    pub(crate) description: Option<LocalizedText>,
    pub(crate) attributes: NodeAttributes,
    pub(crate) references: ReferenceList,
}

impl UaNode {
    /// The node id.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The node class, derived from the attribute set.
    pub fn node_class(&self) -> NodeClass {
        self.attributes.node_class()
    }

    /// The browse name.
    pub fn browse_name(&self) -> &QualifiedName {
        &self.browse_name
    }

    /// The display name.
    pub fn display_name(&self) -> &LocalizedText {
        &self.display_name
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&LocalizedText> {
        self.description.as_ref()
    }

    /// Class-specific attributes.
    pub fn attributes(&self) -> &NodeAttributes {
        &self.attributes
    }

    /// References owned by this node, in insertion order.
    pub fn references(&self) -> &ReferenceList {
        &self.references
    }

    /// Variable attributes, if this is a Variable.
    pub fn as_variable(&self) -> Option<&VariableAttributes> {
        match &self.attributes {
            NodeAttributes::Variable(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub(crate) fn as_variable_mut(&mut self) -> Option<&mut VariableAttributes> {
        match &mut self.attributes {
            NodeAttributes::Variable(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Method attributes, if this is a Method.
    pub fn as_method(&self) -> Option<&MethodAttributes> {
        match &self.attributes {
            NodeAttributes::Method(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// The `IsAbstract` attribute for type nodes; `None` for instances.
    pub fn is_abstract(&self) -> Option<bool> {
        match &self.attributes {
            NodeAttributes::ObjectType { is_abstract }
            | NodeAttributes::DataType(DataTypeAttributes { is_abstract, .. })
            | NodeAttributes::ReferenceType(ReferenceTypeAttributes { is_abstract, .. })
            | NodeAttributes::VariableType(VariableTypeAttributes { is_abstract, .. }) => {
                Some(*is_abstract)
            }
            _ => None,
        }
    }

    /// The target of the first forward reference of exactly `reference_type`.
    pub(crate) fn forward_target(&self, reference_type: u32) -> Option<&NodeId> {
        self.references
            .iter()
            .find(|r| r.is_forward && r.reference_type.is_ns0(reference_type))
            .map(|r| &r.target)
    }

    /// The target of the first inverse reference of exactly `reference_type`.
    pub(crate) fn inverse_target(&self, reference_type: u32) -> Option<&NodeId> {
        self.references
            .iter()
            .find(|r| !r.is_forward && r.reference_type.is_ns0(reference_type))
            .map(|r| &r.target)
    }
}

/// Class-specific attributes. The variant determines the node class.
#[derive(Debug, Clone)]
pub enum NodeAttributes {
    Object { event_notifier: u8 },
    Variable(VariableAttributes),
    Method(MethodAttributes),
    ObjectType { is_abstract: bool },
    VariableType(VariableTypeAttributes),
    ReferenceType(ReferenceTypeAttributes),
    DataType(DataTypeAttributes),
    View { contains_no_loops: bool, event_notifier: u8 },
}

impl NodeAttributes {
    /// The node class these attributes belong to.
    pub fn node_class(&self) -> NodeClass {
        match self {
            Self::Object { .. } => NodeClass::Object,
            Self::Variable(_) => NodeClass::Variable,
            Self::Method(_) => NodeClass::Method,
            Self::ObjectType { .. } => NodeClass::ObjectType,
            Self::VariableType(_) => NodeClass::VariableType,
            Self::ReferenceType(_) => NodeClass::ReferenceType,
            Self::DataType(_) => NodeClass::DataType,
            Self::View { .. } => NodeClass::View,
        }
    }
}

/// Attributes of a Variable node.
#[derive(Debug, Clone)]
pub struct VariableAttributes {
    pub data_type: NodeId,
    pub value_rank: i32,
    pub array_dimensions: Option<Vec<u32>>,
    pub access_level: AccessLevel,
    pub historizing: bool,
    pub minimum_sampling_interval: Option<f64>,
    pub(crate) value: ValueBinding,
    pub(crate) clock: SourceClock,
}

impl VariableAttributes {
    /// Scalar attributes of the given data type, readable, holding an empty value.
    pub fn new(data_type: NodeId) -> Self {
        Self {
            data_type,
            value_rank: -1,
            array_dimensions: None,
            access_level: AccessLevel::default(),
            historizing: false,
            minimum_sampling_interval: None,
            value: ValueBinding::default(),
            clock: SourceClock::default(),
        }
    }

    /// How the value is produced.
    pub fn value(&self) -> &ValueBinding {
        &self.value
    }

    /// The static value, if the variable is not bound to a source.
    pub fn static_value(&self) -> Option<&DataValue> {
        match &self.value {
            ValueBinding::Static(value) => Some(value),
            ValueBinding::Bound(_) => None,
        }
    }
}

/// Where a variable's value comes from.
#[derive(Clone)]
pub enum ValueBinding {
    /// A stored value replaced by writes.
    Static(DataValue),
    /// An external accessor.
    Bound(Arc<dyn ValueSource>),
}

impl Default for ValueBinding {
    fn default() -> Self {
        Self::Static(DataValue::default())
    }
}

impl fmt::Debug for ValueBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Bound(_) => f.write_str("Bound(..)"),
        }
    }
}

/// Per-variable source timestamp clock.
///
/// Every tick is strictly later than the previous one, even when the wall
/// clock has not advanced or has gone backwards.
#[derive(Debug, Default)]
pub struct SourceClock {
    last: AtomicI64,
}

impl SourceClock {
    /// Issue the next timestamp: `max(now, last + 1ns)`.
    pub fn tick(&self) -> DateTime {
        let now = DateTime::now().as_nanos();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        DateTime::from_nanos(now.max(previous.saturating_add(1)))
    }

    /// Record an externally supplied timestamp so later ticks stay after it.
    pub fn observe(&self, stamp: DateTime) {
        self.last.fetch_max(stamp.as_nanos(), Ordering::AcqRel);
    }

    /// The last issued timestamp.
    pub fn last(&self) -> DateTime {
        DateTime::from_nanos(self.last.load(Ordering::Acquire))
    }
}

impl Clone for SourceClock {
    fn clone(&self) -> Self {
        Self {
            last: AtomicI64::new(self.last.load(Ordering::Acquire)),
        }
    }
}

/// Attributes of a Method node.
#[derive(Clone, Default)]
pub struct MethodAttributes {
    pub executable: bool,
    pub(crate) handler: Option<Arc<dyn MethodHandler>>,
}

impl MethodAttributes {
    /// Check whether a handler is bound.
    pub fn is_bound(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for MethodAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodAttributes")
            .field("executable", &self.executable)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Attributes of a VariableType node.
#[derive(Debug, Clone)]
pub struct VariableTypeAttributes {
    pub data_type: NodeId,
    pub value_rank: i32,
    pub array_dimensions: Option<Vec<u32>>,
    pub is_abstract: bool,
    /// Default value copied into instances.
    pub value: Variant,
}

/// Attributes of a ReferenceType node.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTypeAttributes {
    pub is_abstract: bool,
    pub symmetric: bool,
    pub inverse_name: Option<LocalizedText>,
}

/// Attributes of a DataType node.
#[derive(Debug, Clone, Default)]
pub struct DataTypeAttributes {
    pub is_abstract: bool,
    pub definition: Option<DataTypeDefinition>,
}

/// Description of a node to create.
///
/// References are recorded from the new node's point of view; the address
/// space stores the mirrored record on each peer.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub(crate) node_id: Option<NodeId>,
    pub(crate) namespace: Option<u16>,
    pub(crate) browse_name: QualifiedName,
    pub(crate) display_name: Option<LocalizedText>,
    pub(crate) description: Option<LocalizedText>,
    pub(crate) attributes: NodeAttributes,
    pub(crate) references: Vec<Reference>,
}

impl NodeSpec {
    /// Create a spec with the given attributes.
    pub fn new(browse_name: impl Into<QualifiedName>, attributes: NodeAttributes) -> Self {
        Self {
            node_id: None,
            namespace: None,
            browse_name: browse_name.into(),
            display_name: None,
            description: None,
            attributes,
            references: Vec::new(),
        }
    }

    pub fn object(browse_name: impl Into<QualifiedName>) -> Self {
        Self::new(browse_name, NodeAttributes::Object { event_notifier: 0 })
    }

    pub fn variable(browse_name: impl Into<QualifiedName>, data_type: NodeId) -> Self {
        Self::new(
            browse_name,
            NodeAttributes::Variable(VariableAttributes::new(data_type)),
        )
    }

    pub fn method(browse_name: impl Into<QualifiedName>) -> Self {
        Self::new(
            browse_name,
            NodeAttributes::Method(MethodAttributes {
                executable: true,
                handler: None,
            }),
        )
    }

    pub fn object_type(browse_name: impl Into<QualifiedName>) -> Self {
        Self::new(browse_name, NodeAttributes::ObjectType { is_abstract: false })
    }

    pub fn variable_type(browse_name: impl Into<QualifiedName>, data_type: NodeId) -> Self {
        Self::new(
            browse_name,
            NodeAttributes::VariableType(VariableTypeAttributes {
                data_type,
                value_rank: -2,
                array_dimensions: None,
                is_abstract: false,
                value: Variant::Empty,
            }),
        )
    }

    pub fn reference_type(browse_name: impl Into<QualifiedName>) -> Self {
        Self::new(
            browse_name,
            NodeAttributes::ReferenceType(ReferenceTypeAttributes::default()),
        )
    }

    pub fn data_type(browse_name: impl Into<QualifiedName>) -> Self {
        Self::new(browse_name, NodeAttributes::DataType(DataTypeAttributes::default()))
    }

    pub fn view(browse_name: impl Into<QualifiedName>) -> Self {
        Self::new(
            browse_name,
            NodeAttributes::View {
                contains_no_loops: true,
                event_notifier: 0,
            },
        )
    }

    /// Request an explicit node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Allocate the id in `namespace` instead of the browse name's namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: u16) -> Self {
        self.namespace = Some(namespace);
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<LocalizedText>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<LocalizedText>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set `IsAbstract` on a type node. Ignored for instances.
    #[must_use]
    pub fn with_abstract(mut self, value: bool) -> Self {
        match &mut self.attributes {
            NodeAttributes::ObjectType { is_abstract }
            | NodeAttributes::DataType(DataTypeAttributes { is_abstract, .. })
            | NodeAttributes::ReferenceType(ReferenceTypeAttributes { is_abstract, .. })
            | NodeAttributes::VariableType(VariableTypeAttributes { is_abstract, .. }) => {
                *is_abstract = value;
            }
            _ => {}
        }
        self
    }

    /// Set the value of a Variable, or the default value of a VariableType.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Variant>) -> Self {
        match &mut self.attributes {
            NodeAttributes::Variable(attrs) => {
                attrs.value = ValueBinding::Static(DataValue::new(value.into()));
            }
            NodeAttributes::VariableType(attrs) => attrs.value = value.into(),
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn with_value_rank(mut self, rank: i32) -> Self {
        match &mut self.attributes {
            NodeAttributes::Variable(attrs) => attrs.value_rank = rank,
            NodeAttributes::VariableType(attrs) => attrs.value_rank = rank,
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn with_array_dimensions(mut self, dimensions: Vec<u32>) -> Self {
        match &mut self.attributes {
            NodeAttributes::Variable(attrs) => attrs.array_dimensions = Some(dimensions),
            NodeAttributes::VariableType(attrs) => attrs.array_dimensions = Some(dimensions),
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        if let NodeAttributes::Variable(attrs) = &mut self.attributes {
            attrs.access_level = access_level;
        }
        self
    }

    #[must_use]
    pub fn with_executable(mut self, executable: bool) -> Self {
        if let NodeAttributes::Method(attrs) = &mut self.attributes {
            attrs.executable = executable;
        }
        self
    }

    #[must_use]
    pub fn with_definition(mut self, definition: DataTypeDefinition) -> Self {
        if let NodeAttributes::DataType(attrs) = &mut self.attributes {
            attrs.definition = Some(definition);
        }
        self
    }

    #[must_use]
    pub fn with_inverse_name(mut self, inverse_name: impl Into<LocalizedText>) -> Self {
        if let NodeAttributes::ReferenceType(attrs) = &mut self.attributes {
            attrs.inverse_name = Some(inverse_name.into());
        }
        self
    }

    #[must_use]
    pub fn symmetric(mut self) -> Self {
        if let NodeAttributes::ReferenceType(attrs) = &mut self.attributes {
            attrs.symmetric = true;
        }
        self
    }

    /// Place the node under `parent` with an Organizes reference.
    #[must_use]
    pub fn organized_by(self, parent: NodeId) -> Self {
        self.reference(ns0(ReferenceTypeIds::ORGANIZES), parent, false)
    }

    /// Make the node a component of `parent`.
    #[must_use]
    pub fn component_of(self, parent: NodeId) -> Self {
        self.reference(ns0(ReferenceTypeIds::HAS_COMPONENT), parent, false)
    }

    /// Make the node a property of `parent`.
    #[must_use]
    pub fn property_of(self, parent: NodeId) -> Self {
        self.reference(ns0(ReferenceTypeIds::HAS_PROPERTY), parent, false)
    }

    #[must_use]
    pub fn type_definition(self, type_id: NodeId) -> Self {
        self.reference(ns0(ReferenceTypeIds::HAS_TYPE_DEFINITION), type_id, true)
    }

    /// Declare the node a subtype of `supertype`.
    #[must_use]
    pub fn subtype_of(self, supertype: NodeId) -> Self {
        self.reference(ns0(ReferenceTypeIds::HAS_SUBTYPE), supertype, false)
    }

    /// Tag the node with a modelling rule object.
    #[must_use]
    pub fn modelling_rule(self, rule: NodeId) -> Self {
        self.reference(ns0(ReferenceTypeIds::HAS_MODELLING_RULE), rule, true)
    }

    /// Add an arbitrary reference, seen from the new node.
    #[must_use]
    pub fn reference(mut self, reference_type: NodeId, target: NodeId, is_forward: bool) -> Self {
        self.references.push(Reference {
            reference_type,
            is_forward,
            target,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infomodel_core::well_known::DataTypeIds;

    #[test]
    fn test_spec_builders() {
        let spec = NodeSpec::variable("Speed", ns0(DataTypeIds::DOUBLE))
            .with_value(1.5f64)
            .with_access_level(AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE)
            .component_of(NodeId::numeric(1, 1000));

        assert_eq!(spec.attributes.node_class(), NodeClass::Variable);
        assert_eq!(spec.references.len(), 1);
        assert!(!spec.references[0].is_forward);

        let NodeAttributes::Variable(attrs) = &spec.attributes else {
            panic!("expected variable attributes");
        };
        assert_eq!(
            attrs.static_value().map(|v| v.value.clone()),
            Some(Variant::Double(1.5))
        );
        assert!(attrs.access_level.contains(AccessLevel::CURRENT_WRITE));
    }

    #[test]
    fn test_with_abstract_ignored_on_instances() {
        let spec = NodeSpec::object("Pump").with_abstract(true);
        assert!(matches!(spec.attributes, NodeAttributes::Object { .. }));

        let spec = NodeSpec::object_type("PumpType").with_abstract(true);
        assert!(matches!(
            spec.attributes,
            NodeAttributes::ObjectType { is_abstract: true }
        ));
    }

    #[test]
    fn test_source_clock_strictly_increasing() {
        let clock = SourceClock::default();
        let mut previous = clock.tick();
        for _ in 0..1000 {
            let next = clock.tick();
            assert!(next > previous);
            previous = next;
        }
        assert_eq!(clock.last(), previous);
    }

    #[test]
    fn test_source_clock_ahead_of_wall_clock() {
        let clock = SourceClock {
            last: AtomicI64::new(i64::MAX - 10),
        };
        let t1 = clock.tick();
        let t2 = clock.tick();
        assert!(t2 > t1);
    }
}

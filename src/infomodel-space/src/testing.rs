//! Fixtures and assertions shared by unit and integration tests.

use std::collections::HashMap;

use infomodel_core::well_known::{
    DataTypeIds, ObjectIds, ObjectTypeIds, ReferenceTypeIds, VariableTypeIds, ns0,
};
use infomodel_core::{NodeId, QualifiedName, Variant};

use crate::address_space::AddressSpace;
use crate::instantiate::ModellingRule;
use crate::node::NodeSpec;

/// Namespace URI of the fixture type library.
pub const MACHINES_URI: &str = "urn:infomodel:machines";

/// Fixture builder over an address space holding the core model.
///
/// Nodes are tracked under short names so tests can refer to them without
/// rebuilding browse paths.
pub struct ModelFixture {
    space: AddressSpace,
    namespace: u16,
    nodes: HashMap<String, NodeId>,
}

impl ModelFixture {
    /// A core model plus the fixture namespace, with no types declared.
    pub fn new() -> Self {
        let mut space = AddressSpace::with_core_model();
        let namespace = space
            .register_namespace(MACHINES_URI)
            .expect("a fresh address space accepts namespaces");
        Self {
            space,
            namespace,
            nodes: HashMap::new(),
        }
    }

    /// A small machine type library.
    ///
    /// ```text
    /// MotorType
    ///   Speed        Variable Double   Mandatory
    ///   SerialNumber Property String   Mandatory
    ///   Temperature  Variable Double   Optional
    /// MachineType
    ///   Motor        Object MotorType  Mandatory
    ///   Status       Variable Int32    Mandatory
    ///   Start        Method            Mandatory
    ///   Diagnostics  Object FolderType Optional
    ///     ErrorCount Variable UInt32   Mandatory
    ///     LastError  Variable String   Optional
    /// PumpType : MachineType
    ///   FlowRate     Variable Double   Mandatory
    /// ```
    pub fn machine_library() -> Self {
        let mut fixture = Self::new();
        let base_object = ns0(ObjectTypeIds::BASE_OBJECT_TYPE);
        let double = ns0(DataTypeIds::DOUBLE);

        let motor = fixture.add_object_type("MotorType", base_object.clone());
        fixture.add_variable(&motor, "MotorType.Speed", "Speed", double.clone(), ModellingRule::Mandatory);
        fixture.add_property(
            &motor,
            "MotorType.SerialNumber",
            "SerialNumber",
            ns0(DataTypeIds::STRING),
            ModellingRule::Mandatory,
        );
        fixture.add_variable(
            &motor,
            "MotorType.Temperature",
            "Temperature",
            double.clone(),
            ModellingRule::Optional,
        );

        let machine = fixture.add_object_type("MachineType", base_object);
        fixture.add_object(&machine, "MachineType.Motor", "Motor", motor, ModellingRule::Mandatory);
        fixture.add_variable(
            &machine,
            "MachineType.Status",
            "Status",
            ns0(DataTypeIds::INT32),
            ModellingRule::Mandatory,
        );
        fixture.add_method(&machine, "MachineType.Start", "Start", ModellingRule::Mandatory);
        let diagnostics = fixture.add_object(
            &machine,
            "MachineType.Diagnostics",
            "Diagnostics",
            ns0(ObjectTypeIds::FOLDER_TYPE),
            ModellingRule::Optional,
        );
        fixture.add_variable(
            &diagnostics,
            "MachineType.Diagnostics.ErrorCount",
            "ErrorCount",
            ns0(DataTypeIds::UINT32),
            ModellingRule::Mandatory,
        );
        fixture.add_variable(
            &diagnostics,
            "MachineType.Diagnostics.LastError",
            "LastError",
            ns0(DataTypeIds::STRING),
            ModellingRule::Optional,
        );

        let pump = fixture.add_object_type("PumpType", machine);
        fixture.add_variable(&pump, "PumpType.FlowRate", "FlowRate", double, ModellingRule::Mandatory);

        fixture
    }

    /// Declare an ObjectType in the fixture namespace.
    pub fn add_object_type(&mut self, name: &str, supertype: NodeId) -> NodeId {
        let spec = NodeSpec::object_type(self.qualified(name))
            .subtype_of(supertype)
            .reference(ns0(ReferenceTypeIds::ORGANIZES), ns0(ObjectIds::OBJECT_TYPES_FOLDER), false);
        self.create(name, spec)
    }

    /// Declare a data variable under `parent` with a modelling rule.
    pub fn add_variable(
        &mut self,
        parent: &NodeId,
        key: &str,
        name: &str,
        data_type: NodeId,
        rule: ModellingRule,
    ) -> NodeId {
        let spec = NodeSpec::variable(self.qualified(name), data_type)
            .component_of(parent.clone())
            .type_definition(ns0(VariableTypeIds::BASE_DATA_VARIABLE_TYPE))
            .modelling_rule(rule.node_id());
        self.create(key, spec)
    }

    /// Declare a property under `parent` with a modelling rule.
    pub fn add_property(
        &mut self,
        parent: &NodeId,
        key: &str,
        name: &str,
        data_type: NodeId,
        rule: ModellingRule,
    ) -> NodeId {
        let spec = NodeSpec::variable(self.qualified(name), data_type)
            .property_of(parent.clone())
            .type_definition(ns0(VariableTypeIds::PROPERTY_TYPE))
            .modelling_rule(rule.node_id());
        self.create(key, spec)
    }

    /// Declare an object component under `parent` with a modelling rule.
    pub fn add_object(
        &mut self,
        parent: &NodeId,
        key: &str,
        name: &str,
        type_definition: NodeId,
        rule: ModellingRule,
    ) -> NodeId {
        let spec = NodeSpec::object(self.qualified(name))
            .component_of(parent.clone())
            .type_definition(type_definition)
            .modelling_rule(rule.node_id());
        self.create(key, spec)
    }

    /// Declare a method under `parent` with a modelling rule.
    pub fn add_method(&mut self, parent: &NodeId, key: &str, name: &str, rule: ModellingRule) -> NodeId {
        let spec = NodeSpec::method(self.qualified(name))
            .component_of(parent.clone())
            .modelling_rule(rule.node_id());
        self.create(key, spec)
    }

    /// Create an arbitrary node and track it under `key`.
    pub fn create(&mut self, key: &str, spec: NodeSpec) -> NodeId {
        let id = self
            .space
            .create_node(spec)
            .unwrap_or_else(|err| panic!("fixture node {key} could not be created: {err}"));
        self.nodes.insert(key.to_string(), id.clone());
        id
    }

    /// A name in the fixture namespace.
    pub fn qualified(&self, name: &str) -> QualifiedName {
        QualifiedName::new(self.namespace, name)
    }

    /// Look up a tracked node.
    ///
    /// # Panics
    /// If nothing was tracked under `key`.
    pub fn node_id(&self, key: &str) -> NodeId {
        self.nodes
            .get(key)
            .cloned()
            .unwrap_or_else(|| panic!("fixture has no node named {key}"))
    }

    pub fn namespace(&self) -> u16 {
        self.namespace
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut AddressSpace {
        &mut self.space
    }

    pub fn into_space(self) -> AddressSpace {
        self.space
    }
}

impl Default for ModelFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Chained assertions over an address space.
pub struct ModelAssertions<'a> {
    space: &'a AddressSpace,
}

impl<'a> ModelAssertions<'a> {
    pub fn new(space: &'a AddressSpace) -> Self {
        Self { space }
    }

    pub fn assert_node_count(self, expected: usize) -> Self {
        assert_eq!(
            self.space.node_count(),
            expected,
            "Expected {} nodes, found {}",
            expected,
            self.space.node_count()
        );
        self
    }

    pub fn assert_has_child(self, parent: &NodeId, name: &str) -> Self {
        assert!(
            self.space.child_by_name(parent, name).is_some(),
            "{parent} should have a child named {name}"
        );
        self
    }

    pub fn assert_no_child(self, parent: &NodeId, name: &str) -> Self {
        assert!(
            self.space.child_by_name(parent, name).is_none(),
            "{parent} should not have a child named {name}"
        );
        self
    }

    pub fn assert_value(self, node_id: &NodeId, expected: &Variant) -> Self {
        let value = self
            .space
            .node(node_id)
            .and_then(|node| node.as_variable())
            .and_then(|attrs| attrs.static_value())
            .map(|value| &value.value);
        assert_eq!(value, Some(expected), "Unexpected value of {node_id}");
        self
    }

    /// Every reference record is mirrored by its inverse on the peer node.
    pub fn assert_references_mirrored(self) -> Self {
        for node in self.space.nodes() {
            for reference in node.references() {
                let Some(peer) = self.space.node(&reference.target) else {
                    continue;
                };
                let mirrored = reference.mirrored(node.node_id());
                assert!(
                    peer.references().contains(&mirrored),
                    "{} has {:?} but {} lacks the inverse",
                    node.node_id(),
                    reference,
                    peer.node_id()
                );
            }
        }
        self
    }
}

//! The standard namespace skeleton.
//!
//! A full node set loader is out of scope; this declares the part of
//! namespace 0 that the type system, instantiation and browse rely on.

use log::debug;

use common_config::ModelConfig;
use common_error::{ModelError, ModelResult};
use infomodel_core::well_known::{
    DataTypeIds, ObjectIds, ObjectTypeIds, ReferenceTypeIds, VariableTypeIds, ns0,
};
use infomodel_core::{NodeId, QualifiedName};

use crate::address_space::AddressSpace;
use crate::node::NodeSpec;

struct ReferenceTypeDecl {
    id: u32,
    name: &'static str,
    supertype: Option<u32>,
    is_abstract: bool,
    symmetric: bool,
    inverse_name: Option<&'static str>,
}

const fn rt(
    id: u32,
    name: &'static str,
    supertype: Option<u32>,
    is_abstract: bool,
    symmetric: bool,
    inverse_name: Option<&'static str>,
) -> ReferenceTypeDecl {
    ReferenceTypeDecl {
        id,
        name,
        supertype,
        is_abstract,
        symmetric,
        inverse_name,
    }
}

#[rustfmt::skip]
const REFERENCE_TYPES: &[ReferenceTypeDecl] = &[
    rt(ReferenceTypeIds::REFERENCES, "References", None, true, true, None),
    rt(ReferenceTypeIds::NON_HIERARCHICAL_REFERENCES, "NonHierarchicalReferences", Some(ReferenceTypeIds::REFERENCES), true, false, None),
    rt(ReferenceTypeIds::HIERARCHICAL_REFERENCES, "HierarchicalReferences", Some(ReferenceTypeIds::REFERENCES), true, false, Some("InverseHierarchicalReferences")),
    rt(ReferenceTypeIds::HAS_CHILD, "HasChild", Some(ReferenceTypeIds::HIERARCHICAL_REFERENCES), true, false, Some("ChildOf")),
    rt(ReferenceTypeIds::ORGANIZES, "Organizes", Some(ReferenceTypeIds::HIERARCHICAL_REFERENCES), false, false, Some("OrganizedBy")),
    rt(ReferenceTypeIds::HAS_EVENT_SOURCE, "HasEventSource", Some(ReferenceTypeIds::HIERARCHICAL_REFERENCES), false, false, Some("EventSourceOf")),
    rt(ReferenceTypeIds::HAS_NOTIFIER, "HasNotifier", Some(ReferenceTypeIds::HAS_EVENT_SOURCE), false, false, Some("NotifierOf")),
    rt(ReferenceTypeIds::AGGREGATES, "Aggregates", Some(ReferenceTypeIds::HAS_CHILD), true, false, Some("AggregatedBy")),
    rt(ReferenceTypeIds::HAS_SUBTYPE, "HasSubtype", Some(ReferenceTypeIds::HAS_CHILD), false, false, Some("SubtypeOf")),
    rt(ReferenceTypeIds::HAS_COMPONENT, "HasComponent", Some(ReferenceTypeIds::AGGREGATES), false, false, Some("ComponentOf")),
    rt(ReferenceTypeIds::HAS_ORDERED_COMPONENT, "HasOrderedComponent", Some(ReferenceTypeIds::HAS_COMPONENT), false, false, Some("OrderedComponentOf")),
    rt(ReferenceTypeIds::HAS_PROPERTY, "HasProperty", Some(ReferenceTypeIds::AGGREGATES), false, false, Some("PropertyOf")),
    rt(ReferenceTypeIds::HAS_MODELLING_RULE, "HasModellingRule", Some(ReferenceTypeIds::NON_HIERARCHICAL_REFERENCES), false, false, Some("ModellingRuleOf")),
    rt(ReferenceTypeIds::HAS_ENCODING, "HasEncoding", Some(ReferenceTypeIds::NON_HIERARCHICAL_REFERENCES), false, false, Some("EncodingOf")),
    rt(ReferenceTypeIds::HAS_DESCRIPTION, "HasDescription", Some(ReferenceTypeIds::NON_HIERARCHICAL_REFERENCES), false, false, Some("DescriptionOf")),
    rt(ReferenceTypeIds::HAS_TYPE_DEFINITION, "HasTypeDefinition", Some(ReferenceTypeIds::NON_HIERARCHICAL_REFERENCES), false, false, Some("TypeDefinitionOf")),
    rt(ReferenceTypeIds::GENERATES_EVENT, "GeneratesEvent", Some(ReferenceTypeIds::NON_HIERARCHICAL_REFERENCES), false, false, Some("GeneratedBy")),
];

/// `(id, name, supertype, abstract)`
#[rustfmt::skip]
const DATA_TYPES: &[(u32, &str, Option<u32>, bool)] = &[
    (DataTypeIds::BASE_DATA_TYPE, "BaseDataType", None, true),
    (DataTypeIds::NUMBER, "Number", Some(DataTypeIds::BASE_DATA_TYPE), true),
    (DataTypeIds::INTEGER, "Integer", Some(DataTypeIds::NUMBER), true),
    (DataTypeIds::UINTEGER, "UInteger", Some(DataTypeIds::NUMBER), true),
    (DataTypeIds::BOOLEAN, "Boolean", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::SBYTE, "SByte", Some(DataTypeIds::INTEGER), false),
    (DataTypeIds::INT16, "Int16", Some(DataTypeIds::INTEGER), false),
    (DataTypeIds::INT32, "Int32", Some(DataTypeIds::INTEGER), false),
    (DataTypeIds::INT64, "Int64", Some(DataTypeIds::INTEGER), false),
    (DataTypeIds::BYTE, "Byte", Some(DataTypeIds::UINTEGER), false),
    (DataTypeIds::UINT16, "UInt16", Some(DataTypeIds::UINTEGER), false),
    (DataTypeIds::UINT32, "UInt32", Some(DataTypeIds::UINTEGER), false),
    (DataTypeIds::UINT64, "UInt64", Some(DataTypeIds::UINTEGER), false),
    (DataTypeIds::FLOAT, "Float", Some(DataTypeIds::NUMBER), false),
    (DataTypeIds::DOUBLE, "Double", Some(DataTypeIds::NUMBER), false),
    (DataTypeIds::STRING, "String", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::DATE_TIME, "DateTime", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::GUID, "Guid", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::BYTE_STRING, "ByteString", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::NODE_ID, "NodeId", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::STATUS_CODE, "StatusCode", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::QUALIFIED_NAME, "QualifiedName", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::LOCALIZED_TEXT, "LocalizedText", Some(DataTypeIds::BASE_DATA_TYPE), false),
    (DataTypeIds::STRUCTURE, "Structure", Some(DataTypeIds::BASE_DATA_TYPE), true),
    (DataTypeIds::ENUMERATION, "Enumeration", Some(DataTypeIds::BASE_DATA_TYPE), true),
    (DataTypeIds::UNION, "Union", Some(DataTypeIds::STRUCTURE), true),
];

const MODELLING_RULES: &[(u32, &str)] = &[
    (ObjectIds::MODELLING_RULE_MANDATORY, "Mandatory"),
    (ObjectIds::MODELLING_RULE_OPTIONAL, "Optional"),
    (ObjectIds::MODELLING_RULE_EXPOSES_ITS_ARRAY, "ExposesItsArray"),
    (ObjectIds::MODELLING_RULE_OPTIONAL_PLACEHOLDER, "OptionalPlaceholder"),
    (ObjectIds::MODELLING_RULE_MANDATORY_PLACEHOLDER, "MandatoryPlaceholder"),
];

/// `(id, name, parent folder)`
const FOLDERS: &[(u32, &str, Option<u32>)] = &[
    (ObjectIds::ROOT_FOLDER, "Root", None),
    (ObjectIds::OBJECTS_FOLDER, "Objects", Some(ObjectIds::ROOT_FOLDER)),
    (ObjectIds::TYPES_FOLDER, "Types", Some(ObjectIds::ROOT_FOLDER)),
    (ObjectIds::VIEWS_FOLDER, "Views", Some(ObjectIds::ROOT_FOLDER)),
    (ObjectIds::OBJECT_TYPES_FOLDER, "ObjectTypes", Some(ObjectIds::TYPES_FOLDER)),
    (ObjectIds::VARIABLE_TYPES_FOLDER, "VariableTypes", Some(ObjectIds::TYPES_FOLDER)),
    (ObjectIds::DATA_TYPES_FOLDER, "DataTypes", Some(ObjectIds::TYPES_FOLDER)),
    (ObjectIds::REFERENCE_TYPES_FOLDER, "ReferenceTypes", Some(ObjectIds::TYPES_FOLDER)),
];

impl AddressSpace {
    /// Create an address space holding the standard namespace skeleton:
    /// reference, object, variable and data type trees, modelling rules
    /// and the Root folder hierarchy.
    pub fn with_core_model() -> Self {
        Self::with_core_model_and_config(ModelConfig::default())
    }

    /// [`with_core_model`](Self::with_core_model) with explicit configuration.
    pub fn with_core_model_and_config(config: ModelConfig) -> Self {
        let mut space = Self::with_config(config);
        if let Err(err) = space.load_core_model() {
            // The skeleton is static; failing here means the tables are wrong.
            log::error!("Core model is inconsistent: {err}");
        }
        space
    }

    fn load_core_model(&mut self) -> ModelResult<()> {
        let has_subtype = ns0(ReferenceTypeIds::HAS_SUBTYPE);

        // Reference types first, without references: creating any reference
        // requires its type to exist.
        for decl in REFERENCE_TYPES {
            let mut spec = NodeSpec::reference_type(decl.name)
                .with_node_id(ns0(decl.id))
                .with_abstract(decl.is_abstract);
            if decl.symmetric {
                spec = spec.symmetric();
            }
            if let Some(inverse) = decl.inverse_name {
                spec = spec.with_inverse_name(inverse);
            }
            self.create_node(spec)?;
        }
        for decl in REFERENCE_TYPES {
            if let Some(supertype) = decl.supertype {
                self.add_reference(&ns0(supertype), &has_subtype, &ns0(decl.id), true)?;
            }
        }

        self.declare(
            NodeSpec::object_type("BaseObjectType"),
            ObjectTypeIds::BASE_OBJECT_TYPE,
        )?;
        self.declare(
            NodeSpec::object_type("FolderType").subtype_of(ns0(ObjectTypeIds::BASE_OBJECT_TYPE)),
            ObjectTypeIds::FOLDER_TYPE,
        )?;
        self.declare(
            NodeSpec::object_type("ModellingRuleType")
                .subtype_of(ns0(ObjectTypeIds::BASE_OBJECT_TYPE)),
            ObjectTypeIds::MODELLING_RULE_TYPE,
        )?;

        let base_data_type = ns0(DataTypeIds::BASE_DATA_TYPE);
        self.declare(
            NodeSpec::variable_type("BaseVariableType", base_data_type.clone()).with_abstract(true),
            VariableTypeIds::BASE_VARIABLE_TYPE,
        )?;
        self.declare(
            NodeSpec::variable_type("BaseDataVariableType", base_data_type.clone())
                .subtype_of(ns0(VariableTypeIds::BASE_VARIABLE_TYPE)),
            VariableTypeIds::BASE_DATA_VARIABLE_TYPE,
        )?;
        self.declare(
            NodeSpec::variable_type("PropertyType", base_data_type)
                .subtype_of(ns0(VariableTypeIds::BASE_VARIABLE_TYPE)),
            VariableTypeIds::PROPERTY_TYPE,
        )?;

        for &(id, name, supertype, is_abstract) in DATA_TYPES {
            let mut spec = NodeSpec::data_type(name).with_abstract(is_abstract);
            if let Some(supertype) = supertype {
                spec = spec.subtype_of(ns0(supertype));
            }
            self.declare(spec, id)?;
        }

        for &(id, name) in MODELLING_RULES {
            self.declare(
                NodeSpec::object(name).type_definition(ns0(ObjectTypeIds::MODELLING_RULE_TYPE)),
                id,
            )?;
        }

        for &(id, name, parent) in FOLDERS {
            let mut spec = NodeSpec::object(name).type_definition(ns0(ObjectTypeIds::FOLDER_TYPE));
            if let Some(parent) = parent {
                spec = spec.organized_by(ns0(parent));
            }
            self.declare(spec, id)?;
        }

        let organizes = ns0(ReferenceTypeIds::ORGANIZES);
        for (folder, root) in [
            (ObjectIds::OBJECT_TYPES_FOLDER, ObjectTypeIds::BASE_OBJECT_TYPE),
            (ObjectIds::VARIABLE_TYPES_FOLDER, VariableTypeIds::BASE_VARIABLE_TYPE),
            (ObjectIds::DATA_TYPES_FOLDER, DataTypeIds::BASE_DATA_TYPE),
            (ObjectIds::REFERENCE_TYPES_FOLDER, ReferenceTypeIds::REFERENCES),
        ] {
            self.add_reference(&ns0(folder), &organizes, &ns0(root), true)?;
        }

        if !self.warnings.is_empty() {
            return Err(ModelError::internal(format!(
                "core model produced {} warnings",
                self.warnings.len()
            )));
        }
        debug!("Core model loaded ({} nodes)", self.node_count());
        Ok(())
    }

    fn declare(&mut self, spec: NodeSpec, id: u32) -> ModelResult<NodeId> {
        self.create_node(spec.with_node_id(ns0(id)))
    }

    /// The standard namespace node with this browse name, if any.
    pub fn core_node(&self, name: &str) -> Option<NodeId> {
        self.find_nodes_by_browse_name(&QualifiedName::new(0, name))
            .into_iter()
            .map(|node| node.node_id().clone())
            .find(|id| id.namespace == 0)
    }
}

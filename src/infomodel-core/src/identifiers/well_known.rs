//! Numeric identifiers of standard-namespace nodes.

use super::NodeId;

/// Standard object ids.
pub struct ObjectIds;

impl ObjectIds {
    pub const MODELLING_RULE_MANDATORY: u32 = 78;
    pub const MODELLING_RULE_OPTIONAL: u32 = 80;
    pub const MODELLING_RULE_EXPOSES_ITS_ARRAY: u32 = 83;
    pub const MODELLING_RULE_OPTIONAL_PLACEHOLDER: u32 = 11508;
    pub const MODELLING_RULE_MANDATORY_PLACEHOLDER: u32 = 11510;
    pub const ROOT_FOLDER: u32 = 84;
    pub const OBJECTS_FOLDER: u32 = 85;
    pub const TYPES_FOLDER: u32 = 86;
    pub const VIEWS_FOLDER: u32 = 87;
    pub const OBJECT_TYPES_FOLDER: u32 = 88;
    pub const VARIABLE_TYPES_FOLDER: u32 = 89;
    pub const DATA_TYPES_FOLDER: u32 = 90;
    pub const REFERENCE_TYPES_FOLDER: u32 = 91;
}

/// Standard object type ids.
pub struct ObjectTypeIds;

impl ObjectTypeIds {
    pub const BASE_OBJECT_TYPE: u32 = 58;
    pub const FOLDER_TYPE: u32 = 61;
    pub const MODELLING_RULE_TYPE: u32 = 77;
}

/// Standard variable type ids.
pub struct VariableTypeIds;

impl VariableTypeIds {
    pub const BASE_VARIABLE_TYPE: u32 = 62;
    pub const BASE_DATA_VARIABLE_TYPE: u32 = 63;
    pub const PROPERTY_TYPE: u32 = 68;
}

/// Standard reference type ids.
pub struct ReferenceTypeIds;

impl ReferenceTypeIds {
    pub const REFERENCES: u32 = 31;
    pub const NON_HIERARCHICAL_REFERENCES: u32 = 32;
    pub const HIERARCHICAL_REFERENCES: u32 = 33;
    pub const HAS_CHILD: u32 = 34;
    pub const ORGANIZES: u32 = 35;
    pub const HAS_EVENT_SOURCE: u32 = 36;
    pub const HAS_MODELLING_RULE: u32 = 37;
    pub const HAS_ENCODING: u32 = 38;
    pub const HAS_DESCRIPTION: u32 = 39;
    pub const HAS_TYPE_DEFINITION: u32 = 40;
    pub const GENERATES_EVENT: u32 = 41;
    pub const AGGREGATES: u32 = 44;
    pub const HAS_SUBTYPE: u32 = 45;
    pub const HAS_PROPERTY: u32 = 46;
    pub const HAS_COMPONENT: u32 = 47;
    pub const HAS_NOTIFIER: u32 = 48;
    pub const HAS_ORDERED_COMPONENT: u32 = 49;
}

/// Standard data type ids.
pub struct DataTypeIds;

impl DataTypeIds {
    pub const BOOLEAN: u32 = 1;
    pub const SBYTE: u32 = 2;
    pub const BYTE: u32 = 3;
    pub const INT16: u32 = 4;
    pub const UINT16: u32 = 5;
    pub const INT32: u32 = 6;
    pub const UINT32: u32 = 7;
    pub const INT64: u32 = 8;
    pub const UINT64: u32 = 9;
    pub const FLOAT: u32 = 10;
    pub const DOUBLE: u32 = 11;
    pub const STRING: u32 = 12;
    pub const DATE_TIME: u32 = 13;
    pub const GUID: u32 = 14;
    pub const BYTE_STRING: u32 = 15;
    pub const NODE_ID: u32 = 17;
    pub const STATUS_CODE: u32 = 19;
    pub const QUALIFIED_NAME: u32 = 20;
    pub const LOCALIZED_TEXT: u32 = 21;
    pub const STRUCTURE: u32 = 22;
    pub const BASE_DATA_TYPE: u32 = 24;
    pub const NUMBER: u32 = 26;
    pub const INTEGER: u32 = 27;
    pub const UINTEGER: u32 = 28;
    pub const ENUMERATION: u32 = 29;
    pub const UNION: u32 = 12756;
}

/// Shorthand for a standard-namespace numeric node id.
pub const fn ns0(id: u32) -> NodeId {
    NodeId::ns0(id)
}

/// The roots every subtype chain must end in.
pub const TYPE_ROOTS: [u32; 4] = [
    ObjectTypeIds::BASE_OBJECT_TYPE,
    VariableTypeIds::BASE_VARIABLE_TYPE,
    DataTypeIds::BASE_DATA_TYPE,
    ReferenceTypeIds::REFERENCES,
];

/// Check whether `id` is one of the fixed type roots.
pub fn is_type_root(id: &NodeId) -> bool {
    id.namespace == 0 && id.as_numeric().is_some_and(|n| TYPE_ROOTS.contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_roots() {
        assert!(is_type_root(&ns0(ObjectTypeIds::BASE_OBJECT_TYPE)));
        assert!(is_type_root(&ns0(ReferenceTypeIds::REFERENCES)));
        assert!(!is_type_root(&ns0(ObjectTypeIds::FOLDER_TYPE)));
        assert!(!is_type_root(&NodeId::numeric(1, 58)));
    }
}

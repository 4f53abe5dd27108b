//! Built-in type ids.

use serde::{Deserialize, Serialize};

use crate::identifiers::{NodeId, well_known::DataTypeIds};

/// The built-in types values are tagged with.
///
/// Discriminants are the OPC UA built-in type ids, which double as the
/// numeric ids of the corresponding standard DataType nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BuiltinType {
    Null = 0,
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    NodeId = 17,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    ExtensionObject = 22,
    /// Any value (the BaseDataType and abstract numeric families).
    Variant = 24,
}

impl BuiltinType {
    /// Check if this type is numeric.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// Check if this type is an integer type.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// Check if this type is a floating point type.
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Map a standard data type id to its built-in type.
    ///
    /// Structure and Union map to `ExtensionObject`, Enumeration to `Int32`,
    /// and the abstract roots to `Variant`.
    pub const fn from_data_type_id(id: u32) -> Option<Self> {
        Some(match id {
            DataTypeIds::BOOLEAN => Self::Boolean,
            DataTypeIds::SBYTE => Self::SByte,
            DataTypeIds::BYTE => Self::Byte,
            DataTypeIds::INT16 => Self::Int16,
            DataTypeIds::UINT16 => Self::UInt16,
            DataTypeIds::INT32 => Self::Int32,
            DataTypeIds::UINT32 => Self::UInt32,
            DataTypeIds::INT64 => Self::Int64,
            DataTypeIds::UINT64 => Self::UInt64,
            DataTypeIds::FLOAT => Self::Float,
            DataTypeIds::DOUBLE => Self::Double,
            DataTypeIds::STRING => Self::String,
            DataTypeIds::DATE_TIME => Self::DateTime,
            DataTypeIds::GUID => Self::Guid,
            DataTypeIds::BYTE_STRING => Self::ByteString,
            DataTypeIds::NODE_ID => Self::NodeId,
            DataTypeIds::STATUS_CODE => Self::StatusCode,
            DataTypeIds::QUALIFIED_NAME => Self::QualifiedName,
            DataTypeIds::LOCALIZED_TEXT => Self::LocalizedText,
            DataTypeIds::STRUCTURE | DataTypeIds::UNION => Self::ExtensionObject,
            DataTypeIds::ENUMERATION => Self::Int32,
            DataTypeIds::BASE_DATA_TYPE
            | DataTypeIds::NUMBER
            | DataTypeIds::INTEGER
            | DataTypeIds::UINTEGER => Self::Variant,
            _ => return None,
        })
    }

    /// The standard DataType node of this built-in type.
    pub const fn data_type_id(self) -> NodeId {
        match self {
            Self::Variant => NodeId::ns0(DataTypeIds::BASE_DATA_TYPE),
            Self::ExtensionObject => NodeId::ns0(DataTypeIds::STRUCTURE),
            other => NodeId::ns0(other as u32),
        }
    }

    /// Get the display name for this type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::ByteString => "ByteString",
            Self::NodeId => "NodeId",
            Self::StatusCode => "StatusCode",
            Self::QualifiedName => "QualifiedName",
            Self::LocalizedText => "LocalizedText",
            Self::ExtensionObject => "ExtensionObject",
            Self::Variant => "Variant",
        }
    }

    /// Check if a value of this type is accepted where `target` is declared.
    pub fn is_assignable_to(self, target: Self) -> bool {
        self == target || target == Self::Variant || self == Self::Null
    }
}

impl std::fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_families() {
        assert!(BuiltinType::UInt32.is_integer());
        assert!(BuiltinType::Double.is_floating());
        assert!(BuiltinType::Float.is_numeric());
        assert!(!BuiltinType::String.is_numeric());
        assert!(!BuiltinType::Boolean.is_numeric());
    }

    #[test]
    fn test_data_type_ids() {
        assert_eq!(BuiltinType::from_data_type_id(7), Some(BuiltinType::UInt32));
        assert_eq!(
            BuiltinType::from_data_type_id(DataTypeIds::UNION),
            Some(BuiltinType::ExtensionObject)
        );
        assert_eq!(
            BuiltinType::from_data_type_id(DataTypeIds::ENUMERATION),
            Some(BuiltinType::Int32)
        );
        assert_eq!(BuiltinType::from_data_type_id(16), None);
        assert_eq!(BuiltinType::Int32.data_type_id(), NodeId::ns0(6));
        assert_eq!(BuiltinType::Variant.data_type_id(), NodeId::ns0(24));
    }

    #[test]
    fn test_assignability() {
        assert!(BuiltinType::Int32.is_assignable_to(BuiltinType::Variant));
        assert!(BuiltinType::Null.is_assignable_to(BuiltinType::Double));
        assert!(!BuiltinType::Int32.is_assignable_to(BuiltinType::UInt32));
    }
}

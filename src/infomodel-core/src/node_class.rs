//! Node classes and attribute bit masks.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The class of a node. Every node has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Object,
    Variable,
    Method,
    ObjectType,
    VariableType,
    ReferenceType,
    DataType,
    View,
}

impl NodeClass {
    /// Check if this class is one of the type classes.
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::ObjectType | Self::VariableType | Self::ReferenceType | Self::DataType
        )
    }

    /// Check if nodes of this class can be instantiated from.
    pub const fn is_instantiable_type(self) -> bool {
        matches!(self, Self::ObjectType | Self::VariableType)
    }

    /// Check if this class carries a value attribute.
    pub const fn has_value(self) -> bool {
        matches!(self, Self::Variable | Self::VariableType)
    }

    /// The mask bit selecting this class.
    pub const fn mask(self) -> NodeClassMask {
        match self {
            Self::Object => NodeClassMask::OBJECT,
            Self::Variable => NodeClassMask::VARIABLE,
            Self::Method => NodeClassMask::METHOD,
            Self::ObjectType => NodeClassMask::OBJECT_TYPE,
            Self::VariableType => NodeClassMask::VARIABLE_TYPE,
            Self::ReferenceType => NodeClassMask::REFERENCE_TYPE,
            Self::DataType => NodeClassMask::DATA_TYPE,
            Self::View => NodeClassMask::VIEW,
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags! {
    /// Node class filter used by browse. An empty mask selects every class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NodeClassMask: u32 {
        const OBJECT = 1;
        const VARIABLE = 2;
        const METHOD = 4;
        const OBJECT_TYPE = 8;
        const VARIABLE_TYPE = 16;
        const REFERENCE_TYPE = 32;
        const DATA_TYPE = 64;
        const VIEW = 128;
    }
}

impl NodeClassMask {
    /// Check whether the mask selects `class`.
    pub fn accepts(self, class: NodeClass) -> bool {
        self.is_empty() || self.contains(class.mask())
    }
}

bitflags! {
    /// Access level of a variable's value attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AccessLevel: u8 {
        const CURRENT_READ = 1;
        const CURRENT_WRITE = 2;
        const HISTORY_READ = 4;
        const HISTORY_WRITE = 8;
        const SEMANTIC_CHANGE = 16;
        const STATUS_WRITE = 32;
        const TIMESTAMP_WRITE = 64;
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        Self::CURRENT_READ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_classes() {
        assert!(NodeClass::ObjectType.is_type());
        assert!(NodeClass::DataType.is_type());
        assert!(!NodeClass::Object.is_type());
        assert!(NodeClass::VariableType.is_instantiable_type());
        assert!(!NodeClass::ReferenceType.is_instantiable_type());
    }

    #[test]
    fn test_mask_accepts() {
        let mask = NodeClassMask::OBJECT | NodeClassMask::VARIABLE;
        assert!(mask.accepts(NodeClass::Object));
        assert!(mask.accepts(NodeClass::Variable));
        assert!(!mask.accepts(NodeClass::Method));
        assert!(NodeClassMask::empty().accepts(NodeClass::View));
    }

    #[test]
    fn test_default_access_level() {
        let level = AccessLevel::default();
        assert!(level.contains(AccessLevel::CURRENT_READ));
        assert!(!level.contains(AccessLevel::CURRENT_WRITE));
    }
}

//! Structured values described by a DataType definition.

use serde::{Deserialize, Serialize};

use super::Variant;
use crate::identifiers::NodeId;

/// A value of a structure or union data type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtensionObject {
    /// The DataType node describing the body (null for a null object).
    pub type_id: NodeId,
    /// The decoded body.
    pub body: ExtensionBody,
}

/// Body of an extension object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ExtensionBody {
    /// No body.
    #[default]
    None,
    /// Ordered fields. Bit `i` of `encoding_mask` is set when the `i`-th
    /// optional field is present.
    Structure {
        fields: Vec<(String, Variant)>,
        encoding_mask: u32,
    },
    /// At most one selected field. `switch_field` is 1-based, 0 means none.
    Union {
        switch_field: u32,
        field: Option<(String, Variant)>,
    },
}

impl ExtensionObject {
    /// A null extension object.
    pub fn null() -> Self {
        Self::default()
    }

    /// Check if this is a null extension object.
    pub fn is_null(&self) -> bool {
        matches!(self.body, ExtensionBody::None)
    }

    /// Look up a field value by name.
    pub fn field(&self, name: &str) -> Option<&Variant> {
        match &self.body {
            ExtensionBody::None => None,
            ExtensionBody::Structure { fields, .. } => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            ExtensionBody::Union { field, .. } => field
                .as_ref()
                .filter(|(n, _)| n == name)
                .map(|(_, v)| v),
        }
    }

    /// Names of the fields present in the body, in order.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.body {
            ExtensionBody::None => Vec::new(),
            ExtensionBody::Structure { fields, .. } => {
                fields.iter().map(|(n, _)| n.as_str()).collect()
            }
            ExtensionBody::Union { field, .. } => {
                field.iter().map(|(n, _)| n.as_str()).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_object() {
        let eo = ExtensionObject::null();
        assert!(eo.is_null());
        assert!(eo.type_id.is_null());
        assert_eq!(eo.field("x"), None);
    }

    #[test]
    fn test_field_lookup() {
        let eo = ExtensionObject {
            type_id: NodeId::numeric(1, 3000),
            body: ExtensionBody::Structure {
                fields: vec![
                    ("X".to_string(), Variant::Double(1.0)),
                    ("Y".to_string(), Variant::Double(2.0)),
                ],
                encoding_mask: 0,
            },
        };
        assert_eq!(eo.field("Y"), Some(&Variant::Double(2.0)));
        assert_eq!(eo.field_names(), vec!["X", "Y"]);

        let union = ExtensionObject {
            type_id: NodeId::numeric(1, 3001),
            body: ExtensionBody::Union {
                switch_field: 2,
                field: Some(("Text".to_string(), Variant::from("a"))),
            },
        };
        assert_eq!(union.field("Text"), Some(&Variant::from("a")));
        assert_eq!(union.field("Number"), None);
    }
}

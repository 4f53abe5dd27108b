//! Structural DataType definitions and extension object construction.
//!
//! A DataType's definition is resolved into a [`DataTypeShape`] the first
//! time it is needed and memoized per DataType id. Field types stay node ids
//! and are resolved on demand, so self-referential structures never expand
//! eagerly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use log::trace;
use serde::{Deserialize, Serialize};

use common_error::{ModelError, ModelResult, ensure, field_err};
use infomodel_core::{
    BuiltinType, DateTime, ExtensionBody, ExtensionObject, Guid, LocalizedText, NodeClass, NodeId,
    QualifiedName, StatusCode, Variant,
};

use crate::address_space::AddressSpace;
use crate::hierarchy::standard_builtin;
use crate::node::NodeAttributes;

/// Structural definition attached to a DataType node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataTypeDefinition {
    Structure(StructureDefinition),
    Enumeration(EnumDefinition),
}

/// Kind of a structured data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StructureType {
    #[default]
    Structure,
    StructureWithOptionalFields,
    Union,
}

/// Ordered fields of a structure or union.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructureDefinition {
    pub structure_type: StructureType,
    pub fields: Vec<StructureField>,
}

impl StructureDefinition {
    pub fn new(structure_type: StructureType, fields: Vec<StructureField>) -> Self {
        Self {
            structure_type,
            fields,
        }
    }

    fn field(&self, name: &str) -> Option<(usize, &StructureField)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

/// One field of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureField {
    pub name: String,
    pub data_type: NodeId,
    /// -1 for scalars, 1 or more for arrays.
    pub value_rank: i32,
    /// Only meaningful in `StructureWithOptionalFields`.
    pub is_optional: bool,
}

impl StructureField {
    /// A mandatory scalar field.
    pub fn new(name: impl Into<String>, data_type: NodeId) -> Self {
        Self {
            name: name.into(),
            data_type,
            value_rank: -1,
            is_optional: false,
        }
    }

    #[must_use]
    pub fn array(mut self) -> Self {
        self.value_rank = 1;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Named values of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub fields: Vec<EnumField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumField {
    pub name: String,
    pub value: i64,
}

impl EnumDefinition {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = (S, i64)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| EnumField {
                    name: name.into(),
                    value,
                })
                .collect(),
        }
    }

    /// The name of `value`, if it is defined.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.value == value)
            .map(|f| f.name.as_str())
    }
}

/// The resolved, constructible shape of a DataType.
#[derive(Debug, Clone, PartialEq)]
pub enum DataTypeShape {
    /// Values are plain built-ins.
    Builtin(BuiltinType),
    /// Values are `Int32` restricted to the definition.
    Enumeration {
        data_type: NodeId,
        definition: EnumDefinition,
    },
    /// Values are extension objects.
    Structure {
        data_type: NodeId,
        definition: StructureDefinition,
    },
}

/// Input tree for [`AddressSpace::construct_extension_object`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInit {
    Value(Variant),
    Structure(Vec<(String, FieldInit)>),
    Array(Vec<FieldInit>),
}

impl FieldInit {
    /// A leaf value.
    pub fn value(value: impl Into<Variant>) -> Self {
        Self::Value(value.into())
    }

    /// Nested structure fields.
    pub fn structure<S: Into<String>>(fields: impl IntoIterator<Item = (S, FieldInit)>) -> Self {
        Self::Structure(fields.into_iter().map(|(n, f)| (n.into(), f)).collect())
    }

    fn describe(&self) -> String {
        match self {
            Self::Value(v) => v.type_name(),
            Self::Structure(_) => "a structure".to_string(),
            Self::Array(_) => "an array".to_string(),
        }
    }
}

impl AddressSpace {
    /// Resolve the shape of `data_type`, memoized per id.
    ///
    /// A DataType without its own definition inherits the nearest
    /// supertype's; a chain reaching a standard built-in resolves to that
    /// built-in.
    pub fn resolve_data_type_definition(&self, data_type: &NodeId) -> ModelResult<Arc<DataTypeShape>> {
        self.ensure_live()?;
        if let Some(shape) = self
            .data_type_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(data_type)
        {
            return Ok(Arc::clone(shape));
        }
        let shape = Arc::new(self.resolve_shape(data_type)?);
        trace!("Resolved data type {data_type}");
        self.data_type_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(data_type.clone(), Arc::clone(&shape));
        Ok(shape)
    }

    fn resolve_shape(&self, data_type: &NodeId) -> ModelResult<DataTypeShape> {
        if let Some(builtin) = standard_builtin(data_type) {
            return Ok(DataTypeShape::Builtin(builtin));
        }
        match self.nodes.get(data_type) {
            Some(node) if node.node_class() == NodeClass::DataType => {}
            _ => return Err(ModelError::unknown_data_type(data_type.to_string())),
        }
        let chain = std::iter::once(data_type.clone()).chain(self.supertype_chain(data_type)?);
        for id in chain {
            if let Some(builtin) = standard_builtin(&id) {
                return Ok(DataTypeShape::Builtin(builtin));
            }
            let Some(node) = self.nodes.get(&id) else {
                break;
            };
            if let NodeAttributes::DataType(attrs) = &node.attributes {
                match &attrs.definition {
                    Some(DataTypeDefinition::Structure(definition)) => {
                        return Ok(DataTypeShape::Structure {
                            data_type: data_type.clone(),
                            definition: definition.clone(),
                        });
                    }
                    Some(DataTypeDefinition::Enumeration(definition)) => {
                        return Ok(DataTypeShape::Enumeration {
                            data_type: data_type.clone(),
                            definition: definition.clone(),
                        });
                    }
                    None => {}
                }
            }
        }
        Err(ModelError::unknown_data_type(format!(
            "{data_type} has no definition and no built-in supertype"
        )))
    }

    /// Build a value of the structured type `data_type` from `fields`.
    ///
    /// Absent mandatory fields take defaults, absent optional fields are left
    /// out of the encoding mask, and a union takes at most one field.
    pub fn construct_extension_object<S: Into<String>>(
        &self,
        data_type: &NodeId,
        fields: impl IntoIterator<Item = (S, FieldInit)>,
    ) -> ModelResult<ExtensionObject> {
        self.ensure_live()?;
        let fields = fields.into_iter().map(|(n, f)| (n.into(), f)).collect();
        let mut path = vec![data_type.clone()];
        self.build_structure(data_type, fields, &mut path)
    }

    fn build_structure(
        &self,
        data_type: &NodeId,
        fields: Vec<(String, FieldInit)>,
        path: &mut Vec<NodeId>,
    ) -> ModelResult<ExtensionObject> {
        let shape = self.resolve_data_type_definition(data_type)?;
        let DataTypeShape::Structure { definition, .. } = shape.as_ref() else {
            field_err!("{} is not a structured data type", data_type);
        };
        for (name, _) in &fields {
            ensure!(
                definition.field(name).is_some(),
                FieldTypeMismatch: "{} has no field {}",
                data_type,
                name
            );
        }

        let body = match definition.structure_type {
            StructureType::Union => {
                ensure!(
                    fields.len() <= 1,
                    FieldTypeMismatch: "union {} takes one field, got {}",
                    data_type,
                    fields.len()
                );
                match fields.into_iter().next() {
                    None => ExtensionBody::Union {
                        switch_field: 0,
                        field: None,
                    },
                    Some((name, init)) => {
                        let (index, field) = definition
                            .field(&name)
                            .ok_or_else(|| ModelError::internal("checked field vanished"))?;
                        let value = self.build_field(field, init, path)?;
                        ExtensionBody::Union {
                            switch_field: u32::try_from(index + 1)
                                .map_err(|_| ModelError::field_mismatch("too many union fields"))?,
                            field: Some((name, value)),
                        }
                    }
                }
            }
            structure_type => {
                let with_optionals = structure_type == StructureType::StructureWithOptionalFields;
                let mut provided: HashMap<String, FieldInit> = HashMap::new();
                for (name, init) in fields {
                    ensure!(
                        !provided.contains_key(&name),
                        FieldTypeMismatch: "field {} given twice",
                        name
                    );
                    provided.insert(name, init);
                }
                let mut values = Vec::with_capacity(definition.fields.len());
                let mut encoding_mask = 0u32;
                let mut optional_bit = 0u32;
                for field in &definition.fields {
                    let init = provided.remove(&field.name);
                    if with_optionals && field.is_optional {
                        let bit = optional_bit;
                        optional_bit += 1;
                        if let Some(init) = init {
                            encoding_mask |= 1u32.checked_shl(bit).ok_or_else(|| {
                                ModelError::field_mismatch(format!(
                                    "{data_type} has more than 32 optional fields"
                                ))
                            })?;
                            values.push((field.name.clone(), self.build_field(field, init, path)?));
                        }
                        continue;
                    }
                    let value = match init {
                        Some(init) => self.build_field(field, init, path)?,
                        None => self.default_field(field, path)?,
                    };
                    values.push((field.name.clone(), value));
                }
                ExtensionBody::Structure {
                    fields: values,
                    encoding_mask,
                }
            }
        };
        Ok(ExtensionObject {
            type_id: data_type.clone(),
            body,
        })
    }

    fn build_field(
        &self,
        field: &StructureField,
        init: FieldInit,
        path: &mut Vec<NodeId>,
    ) -> ModelResult<Variant> {
        let is_array = matches!(init, FieldInit::Array(_) | FieldInit::Value(Variant::Array(_)));
        if field.value_rank >= 0 && !is_array {
            field_err!("field {} expects an array, got {}", field.name, init.describe());
        }
        if field.value_rank == -1 && is_array {
            field_err!("field {} expects a scalar, got {}", field.name, init.describe());
        }
        if !is_array {
            return self.build_scalar(field, init, path);
        }
        let elements = match init {
            FieldInit::Array(items) => items,
            FieldInit::Value(Variant::Array(array)) => {
                array.values.into_iter().map(FieldInit::Value).collect()
            }
            other => field_err!("field {} expects an array, got {}", field.name, other.describe()),
        };
        let element_type = self.builtin_type_of(&field.data_type)?;
        let values = elements
            .into_iter()
            .map(|element| self.build_scalar(field, element, path))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Variant::array(element_type, values))
    }

    fn build_scalar(
        &self,
        field: &StructureField,
        init: FieldInit,
        path: &mut Vec<NodeId>,
    ) -> ModelResult<Variant> {
        let shape = self.resolve_data_type_definition(&field.data_type)?;
        match (shape.as_ref(), init) {
            (DataTypeShape::Builtin(BuiltinType::ExtensionObject), FieldInit::Value(value)) => {
                match value {
                    Variant::Empty => Ok(ExtensionObject::null().into()),
                    value @ Variant::ExtensionObject(_) => Ok(value),
                    other => field_err!(
                        "field {} expects an extension object, got {}",
                        field.name,
                        other.type_name()
                    ),
                }
            }
            (DataTypeShape::Builtin(builtin), FieldInit::Value(value)) => value
                .cast(*builtin)
                .map_err(|e| ModelError::field_mismatch(format!("field {}: {e}", field.name))),
            (DataTypeShape::Enumeration { definition, .. }, FieldInit::Value(value)) => {
                let Some(raw) = value.as_i64() else {
                    field_err!(
                        "field {} expects an enumeration value, got {}",
                        field.name,
                        value.type_name()
                    );
                };
                ensure!(
                    definition.name_of(raw).is_some(),
                    FieldTypeMismatch: "{} is not a value of {}",
                    raw,
                    field.data_type
                );
                let raw = i32::try_from(raw).map_err(|_| {
                    ModelError::field_mismatch(format!("enumeration value {raw} exceeds Int32"))
                })?;
                Ok(Variant::Int32(raw))
            }
            (DataTypeShape::Structure { .. }, FieldInit::Structure(fields)) => {
                path.push(field.data_type.clone());
                let built = self.build_structure(&field.data_type, fields, path);
                path.pop();
                Ok(built?.into())
            }
            (DataTypeShape::Structure { .. }, FieldInit::Value(Variant::ExtensionObject(eo))) => {
                ensure!(
                    eo.is_null() || self.is_subtype_of(&eo.type_id, &field.data_type)?,
                    FieldTypeMismatch: "field {} expects {}, got {}",
                    field.name,
                    field.data_type,
                    eo.type_id
                );
                Ok(Variant::ExtensionObject(eo))
            }
            (_, init) => field_err!(
                "field {} of type {} cannot take {}",
                field.name,
                field.data_type,
                init.describe()
            ),
        }
    }

    fn default_field(&self, field: &StructureField, path: &mut Vec<NodeId>) -> ModelResult<Variant> {
        if field.value_rank >= 0 {
            return Ok(Variant::array(self.builtin_type_of(&field.data_type)?, Vec::new()));
        }
        let shape = self.resolve_data_type_definition(&field.data_type)?;
        match shape.as_ref() {
            DataTypeShape::Builtin(builtin) => Ok(default_value(*builtin)),
            DataTypeShape::Enumeration { definition, .. } => {
                let first = definition.fields.first().map_or(0, |f| f.value);
                Ok(Variant::Int32(i32::try_from(first).unwrap_or_default()))
            }
            DataTypeShape::Structure { .. } if path.contains(&field.data_type) => {
                Ok(ExtensionObject::null().into())
            }
            DataTypeShape::Structure { .. } => {
                path.push(field.data_type.clone());
                let built = self.build_structure(&field.data_type, Vec::new(), path);
                path.pop();
                Ok(built?.into())
            }
        }
    }
}

/// The zero value of a built-in type.
pub fn default_value(builtin: BuiltinType) -> Variant {
    match builtin {
        BuiltinType::Null | BuiltinType::Variant => Variant::Empty,
        BuiltinType::Boolean => Variant::Boolean(false),
        BuiltinType::SByte => Variant::SByte(0),
        BuiltinType::Byte => Variant::Byte(0),
        BuiltinType::Int16 => Variant::Int16(0),
        BuiltinType::UInt16 => Variant::UInt16(0),
        BuiltinType::Int32 => Variant::Int32(0),
        BuiltinType::UInt32 => Variant::UInt32(0),
        BuiltinType::Int64 => Variant::Int64(0),
        BuiltinType::UInt64 => Variant::UInt64(0),
        BuiltinType::Float => Variant::Float(0.0),
        BuiltinType::Double => Variant::Double(0.0),
        BuiltinType::String => Variant::String(String::new()),
        BuiltinType::DateTime => Variant::DateTime(DateTime::from_nanos(0)),
        BuiltinType::Guid => Variant::Guid(Guid::nil()),
        BuiltinType::ByteString => Variant::ByteString(Vec::new()),
        BuiltinType::NodeId => NodeId::null().into(),
        BuiltinType::StatusCode => Variant::StatusCode(StatusCode::GOOD),
        BuiltinType::QualifiedName => QualifiedName::new(0, "").into(),
        BuiltinType::LocalizedText => LocalizedText::default().into(),
        BuiltinType::ExtensionObject => ExtensionObject::null().into(),
    }
}

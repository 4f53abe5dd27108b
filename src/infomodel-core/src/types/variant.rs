//! Runtime value representation.

use serde::{Deserialize, Serialize};

use common_error::{ModelError, ModelResult};

use super::{BuiltinType, DateTime, ExtensionObject, StatusCode};
use crate::identifiers::{Guid, LocalizedText, NodeId, QualifiedName};

/// A runtime value tagged with its built-in type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime),
    Guid(Guid),
    ByteString(Vec<u8>),
    NodeId(Box<NodeId>),
    StatusCode(StatusCode),
    QualifiedName(Box<QualifiedName>),
    LocalizedText(Box<LocalizedText>),
    ExtensionObject(Box<ExtensionObject>),
    /// Array or matrix of values sharing one element type.
    Array(Box<Array>),
}

/// Array payload of a `Variant`.
///
/// Values are stored flat. When `dimensions` is present the array is a
/// row-major matrix and the product of the dimensions equals `values.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    /// Element type.
    pub value_type: BuiltinType,
    /// Flattened elements.
    pub values: Vec<Variant>,
    /// Matrix dimensions, if any.
    pub dimensions: Option<Vec<u32>>,
}

impl Array {
    /// Create a one-dimensional array.
    pub fn new(value_type: BuiltinType, values: Vec<Variant>) -> Self {
        Self {
            value_type,
            values,
            dimensions: None,
        }
    }

    /// Create a matrix, validating that the dimensions cover every element.
    pub fn matrix(
        value_type: BuiltinType,
        values: Vec<Variant>,
        dimensions: Vec<u32>,
    ) -> ModelResult<Self> {
        let expected = dimensions
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(*d as usize));
        if dimensions.is_empty() || expected != Some(values.len()) {
            return Err(ModelError::index_out_of_range(format!(
                "dimensions {dimensions:?} do not cover {} values",
                values.len()
            )));
        }
        Ok(Self {
            value_type,
            values,
            dimensions: Some(dimensions),
        })
    }

    /// The effective dimensions: explicit ones, or `[len]`.
    pub fn dimensions(&self) -> Vec<u32> {
        self.dimensions
            .clone()
            .unwrap_or_else(|| vec![self.values.len() as u32])
    }

    /// Whether the dimensions cover exactly the stored elements.
    pub fn is_well_formed(&self) -> bool {
        match &self.dimensions {
            None => true,
            Some(dims) => {
                !dims.is_empty()
                    && dims
                        .iter()
                        .try_fold(1usize, |acc, d| acc.checked_mul(*d as usize))
                        == Some(self.values.len())
            }
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dimensions.as_ref().map_or(1, Vec::len)
    }
}

impl Variant {
    /// Create a one-dimensional array value.
    pub fn array(value_type: BuiltinType, values: Vec<Variant>) -> Self {
        Self::Array(Box::new(Array::new(value_type, values)))
    }

    /// Check if this value is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Check if this value is an array or matrix.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// The built-in type of the value (the element type for arrays).
    pub fn builtin_type(&self) -> BuiltinType {
        match self {
            Self::Empty => BuiltinType::Null,
            Self::Boolean(_) => BuiltinType::Boolean,
            Self::SByte(_) => BuiltinType::SByte,
            Self::Byte(_) => BuiltinType::Byte,
            Self::Int16(_) => BuiltinType::Int16,
            Self::UInt16(_) => BuiltinType::UInt16,
            Self::Int32(_) => BuiltinType::Int32,
            Self::UInt32(_) => BuiltinType::UInt32,
            Self::Int64(_) => BuiltinType::Int64,
            Self::UInt64(_) => BuiltinType::UInt64,
            Self::Float(_) => BuiltinType::Float,
            Self::Double(_) => BuiltinType::Double,
            Self::String(_) => BuiltinType::String,
            Self::DateTime(_) => BuiltinType::DateTime,
            Self::Guid(_) => BuiltinType::Guid,
            Self::ByteString(_) => BuiltinType::ByteString,
            Self::NodeId(_) => BuiltinType::NodeId,
            Self::StatusCode(_) => BuiltinType::StatusCode,
            Self::QualifiedName(_) => BuiltinType::QualifiedName,
            Self::LocalizedText(_) => BuiltinType::LocalizedText,
            Self::ExtensionObject(_) => BuiltinType::ExtensionObject,
            Self::Array(array) => array.value_type,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Array(array) => format!("Array<{}>", array.value_type),
            other => other.builtin_type().name().to_string(),
        }
    }

    /// Try to get the array payload.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get any integer value as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::SByte(v) => Some(i64::from(v)),
            Self::Byte(v) => Some(i64::from(v)),
            Self::Int16(v) => Some(i64::from(v)),
            Self::UInt16(v) => Some(i64::from(v)),
            Self::Int32(v) => Some(i64::from(v)),
            Self::UInt32(v) => Some(i64::from(v)),
            Self::Int64(v) => Some(v),
            Self::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Try to get any numeric value as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(f64::from(v)),
            Self::Double(v) => Some(v),
            Self::UInt64(v) => Some(v as f64),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the extension object.
    pub fn as_extension_object(&self) -> Option<&ExtensionObject> {
        match self {
            Self::ExtensionObject(eo) => Some(eo),
            _ => None,
        }
    }
}

macro_rules! variant_from {
    ($($ty:ty => $variant:ident, $builtin:ident;)*) => {
        $(
            impl From<$ty> for Variant {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }

            impl From<Vec<$ty>> for Variant {
                fn from(values: Vec<$ty>) -> Self {
                    Self::array(
                        BuiltinType::$builtin,
                        values.into_iter().map(Variant::from).collect(),
                    )
                }
            }
        )*
    };
}

variant_from! {
    bool => Boolean, Boolean;
    i8 => SByte, SByte;
    i16 => Int16, Int16;
    u16 => UInt16, UInt16;
    i32 => Int32, Int32;
    u32 => UInt32, UInt32;
    i64 => Int64, Int64;
    u64 => UInt64, UInt64;
    f32 => Float, Float;
    f64 => Double, Double;
    String => String, String;
    DateTime => DateTime, DateTime;
    Guid => Guid, Guid;
    NodeId => NodeId, NodeId;
    StatusCode => StatusCode, StatusCode;
    QualifiedName => QualifiedName, QualifiedName;
    LocalizedText => LocalizedText, LocalizedText;
    ExtensionObject => ExtensionObject, ExtensionObject;
}

impl From<u8> for Variant {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Array> for Variant {
    fn from(array: Array) -> Self {
        Self::Array(Box::new(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Variant::from(42u32), Variant::UInt32(42));
        assert_eq!(Variant::from(-3i64).as_i64(), Some(-3));
        assert_eq!(Variant::from(2.5f64).as_f64(), Some(2.5));
        assert_eq!(Variant::from("hello").as_str(), Some("hello"));
        assert!(Variant::Empty.is_empty());
        assert!(Variant::default().is_empty());
    }

    #[test]
    fn test_array_from_vec() {
        let value = Variant::from(vec![42u32, 23]);
        let array = value.as_array().unwrap();
        assert_eq!(array.value_type, BuiltinType::UInt32);
        assert_eq!(array.values, vec![Variant::UInt32(42), Variant::UInt32(23)]);
        assert_eq!(array.dimensions(), vec![2]);
        assert_eq!(value.builtin_type(), BuiltinType::UInt32);
        assert_eq!(value.type_name(), "Array<UInt32>");
    }

    #[test]
    fn test_matrix_dimensions() {
        let values: Vec<Variant> = (0..6).map(Variant::Int32).collect();
        let matrix = Array::matrix(BuiltinType::Int32, values.clone(), vec![2, 3]).unwrap();
        assert_eq!(matrix.rank(), 2);
        assert_eq!(matrix.dimensions(), vec![2, 3]);

        assert!(Array::matrix(BuiltinType::Int32, values.clone(), vec![4, 2]).is_err());
        assert!(Array::matrix(BuiltinType::Int32, values, vec![]).is_err());
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Variant::Empty.type_name(), "Null");
        assert_eq!(Variant::Boolean(true).type_name(), "Boolean");
        assert_eq!(Variant::Int32(42).type_name(), "Int32");
    }
}

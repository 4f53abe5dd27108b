//! Value reinterpretation between built-in types.
//!
//! Numeric values widen and narrow within the numeric families as long as the
//! value survives the trip; every other conversion is an
//! `IncompatibleDataType` error.

use common_error::{ModelError, ModelResult, incompatible_err};

use super::{Array, BuiltinType, ExtensionObject, Variant};

impl Variant {
    /// Reinterpret this value under `target`.
    ///
    /// Arrays are cast element-wise and keep their dimensions. An empty value
    /// cast to `ExtensionObject` becomes a null extension object; cast to any
    /// other type it stays empty.
    pub fn cast(&self, target: BuiltinType) -> ModelResult<Variant> {
        match self {
            Self::Array(array) => {
                let values = array
                    .values
                    .iter()
                    .map(|v| cast_scalar(v, target))
                    .collect::<ModelResult<Vec<_>>>()?;
                let value_type = if target == BuiltinType::Variant {
                    array.value_type
                } else {
                    target
                };
                Ok(Array {
                    value_type,
                    values,
                    dimensions: array.dimensions.clone(),
                }
                .into())
            }
            scalar => cast_scalar(scalar, target),
        }
    }

    /// Check if the value may be stored where `target` is declared without
    /// conversion.
    pub fn is_assignable_to(&self, target: BuiltinType) -> bool {
        match self {
            Self::Array(array) => {
                array.value_type.is_assignable_to(target)
                    || array
                        .values
                        .iter()
                        .all(|v| v.builtin_type().is_assignable_to(target))
            }
            scalar => scalar.builtin_type().is_assignable_to(target),
        }
    }
}

fn cast_scalar(value: &Variant, target: BuiltinType) -> ModelResult<Variant> {
    let source = value.builtin_type();
    if target == BuiltinType::Variant || source == target {
        return Ok(value.clone());
    }
    match value {
        Variant::Empty if target == BuiltinType::ExtensionObject => {
            Ok(Variant::ExtensionObject(Box::new(ExtensionObject::null())))
        }
        Variant::Empty => Ok(Variant::Empty),
        _ if source.is_numeric() && target.is_numeric() => cast_numeric(value, target),
        _ => incompatible_err!("cannot reinterpret {} as {target}", value.type_name()),
    }
}

fn cast_numeric(value: &Variant, target: BuiltinType) -> ModelResult<Variant> {
    if target.is_floating() {
        let f = value
            .as_f64()
            .ok_or_else(|| ModelError::incompatible(format!("{} is not numeric", value.type_name())))?;
        return Ok(match target {
            BuiltinType::Float => {
                let narrowed = f as f32;
                if f.is_finite() && narrowed.is_infinite() {
                    incompatible_err!("{f} does not fit in Float");
                }
                Variant::Float(narrowed)
            }
            _ => Variant::Double(f),
        });
    }

    let wide: i128 = match *value {
        Variant::Float(f) => float_to_integer(f64::from(f))?,
        Variant::Double(f) => float_to_integer(f)?,
        Variant::UInt64(v) => i128::from(v),
        _ => value.as_i64().map(i128::from).ok_or_else(|| {
            ModelError::incompatible(format!("{} is not numeric", value.type_name()))
        })?,
    };
    let out_of_range = || ModelError::incompatible(format!("{wide} does not fit in {target}"));
    Ok(match target {
        BuiltinType::SByte => Variant::SByte(i8::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::Byte => Variant::Byte(u8::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::Int16 => Variant::Int16(i16::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::UInt16 => Variant::UInt16(u16::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::Int32 => Variant::Int32(i32::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::UInt32 => Variant::UInt32(u32::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::Int64 => Variant::Int64(i64::try_from(wide).map_err(|_| out_of_range())?),
        BuiltinType::UInt64 => Variant::UInt64(u64::try_from(wide).map_err(|_| out_of_range())?),
        other => incompatible_err!("{other} is not an integer type"),
    })
}

fn float_to_integer(f: f64) -> ModelResult<i128> {
    // Floats only narrow to integers when nothing is lost.
    if !f.is_finite() || f.fract() != 0.0 || f.abs() > 1.0e20 {
        incompatible_err!("{f} is not representable as an integer");
    }
    Ok(f as i128)
}

/// Check a value against a declared value rank and array dimensions.
///
/// Value ranks: `-3` scalar or one dimension, `-2` any, `-1` scalar,
/// `0` one or more dimensions, `n > 0` exactly `n` dimensions. A declared
/// dimension of 0 means unbounded.
pub fn check_value_rank(value: &Variant, value_rank: i32, array_dimensions: Option<&[u32]>) -> bool {
    let array = match value {
        Variant::Empty => return true,
        Variant::Array(array) => array,
        _ => return matches!(value_rank, -3 | -2 | -1),
    };
    if !array.is_well_formed() {
        return false;
    }
    let rank_ok = match value_rank {
        -2 | 0 => true,
        -3 => array.rank() == 1,
        -1 => false,
        n if n > 0 => array.rank() == n as usize,
        _ => false,
    };
    if !rank_ok {
        return false;
    }
    match array_dimensions {
        Some(declared) if declared.len() == array.rank() => declared
            .iter()
            .zip(array.dimensions())
            .all(|(max, actual)| *max == 0 || actual <= *max),
        _ => true,
    }
}

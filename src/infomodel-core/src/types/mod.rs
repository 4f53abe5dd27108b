//! Type system for node values.
//!
//! This module defines the `Variant` enum for runtime values, `BuiltinType`
//! for the built-in type ids values are tagged with, and the coercion rules
//! that reinterpret a value under a different built-in type.

mod builtin;
mod coerce;
mod data_value;
mod extension_object;
mod numeric_range;
mod status;
mod variant;

pub use builtin::BuiltinType;
pub use coerce::check_value_rank;
pub use data_value::{DataValue, DateTime};
pub use extension_object::{ExtensionBody, ExtensionObject};
pub use numeric_range::NumericRange;
pub use status::StatusCode;
pub use variant::{Array, Variant};

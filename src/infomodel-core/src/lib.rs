//! Core data model for the information-model engine.
//!
//! This crate provides the value-level building blocks the address space is
//! made of:
//! - `NodeId`, `QualifiedName` and `LocalizedText` identifiers
//! - `NodeClass`, `NodeClassMask` and `AccessLevel`
//! - `Variant`, `DataValue`, `StatusCode` and the coercion rules between
//!   built-in types
//! - `ExtensionObject` values and `NumericRange` selectors

pub mod identifiers;
pub mod node_class;
pub mod types;

#[cfg(test)]
mod proptest_utils;

// Re-export commonly used types
pub use identifiers::{
    Guid, Identifier, LocalizedText, NodeId, QualifiedName, well_known,
};
pub use node_class::{AccessLevel, NodeClass, NodeClassMask};
pub use types::{
    Array, BuiltinType, DataValue, DateTime, ExtensionBody, ExtensionObject, NumericRange,
    StatusCode, Variant, check_value_rank,
};

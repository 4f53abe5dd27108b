//! Core error types for the information-model engine.

use thiserror::Error;

/// Result type alias using `ModelError`.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Core error type for address-space operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Text did not match any node identifier form.
    #[error("InvalidIdentifierSyntax: {0}")]
    InvalidIdentifierSyntax(String),

    /// A reference type id does not resolve to a ReferenceType node.
    #[error("UnknownReferenceType: {0}")]
    UnknownReferenceType(String),

    /// A subtype chain loops or never reaches a root.
    #[error("TypeHierarchyCycle: {0}")]
    TypeHierarchyCycle(String),

    /// A data type is missing or cannot be resolved to a shape.
    #[error("UnknownDataType: {0}")]
    UnknownDataType(String),

    /// A supplied structure field does not match the schema.
    #[error("FieldTypeMismatch: {0}")]
    FieldTypeMismatch(String),

    /// A type's mandatory structure cannot be instantiated.
    #[error("ModellingRuleViolation: {0}")]
    ModellingRuleViolation(String),

    /// A numeric range selects outside the value's dimensions.
    #[error("IndexOutOfRange: {0}")]
    IndexOutOfRange(String),

    /// A numeric range could not be parsed or is malformed.
    #[error("InvalidIndexRange: {0}")]
    InvalidIndexRange(String),

    /// No coercion path exists between two data types.
    #[error("IncompatibleDataType: {0}")]
    IncompatibleDataType(String),

    /// The address space has been disposed.
    #[error("AddressSpaceDisposed: the address space has been disposed")]
    AddressSpaceDisposed,

    /// A node id does not resolve to a node.
    #[error("UnknownNode: {0}")]
    UnknownNode(String),

    /// A namespace uri or index is not registered.
    #[error("UnknownNamespace: {0}")]
    UnknownNamespace(String),

    /// The node exists but has the wrong node class for the operation.
    #[error("InvalidNodeClass: {0}")]
    InvalidNodeClass(String),

    /// A node id is already taken.
    #[error("DuplicateNodeId: {0}")]
    DuplicateNodeId(String),

    /// A sibling with the same browse name exists and the policy rejects it.
    #[error("DuplicateBrowseName: {0}")]
    DuplicateBrowseName(String),

    /// Internal error (bug in the engine).
    #[error("InternalError: {0}")]
    InternalError(String),
}

impl ModelError {
    /// Create a new `InvalidIdentifierSyntax` error.
    pub fn invalid_identifier<S: Into<String>>(msg: S) -> Self {
        Self::InvalidIdentifierSyntax(msg.into())
    }

    /// Create a new `UnknownReferenceType` error.
    pub fn unknown_reference_type<S: Into<String>>(msg: S) -> Self {
        Self::UnknownReferenceType(msg.into())
    }

    /// Create a new `TypeHierarchyCycle` error.
    pub fn hierarchy_cycle<S: Into<String>>(msg: S) -> Self {
        Self::TypeHierarchyCycle(msg.into())
    }

    /// Create a new `UnknownDataType` error.
    pub fn unknown_data_type<S: Into<String>>(msg: S) -> Self {
        Self::UnknownDataType(msg.into())
    }

    /// Create a new `FieldTypeMismatch` error.
    pub fn field_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::FieldTypeMismatch(msg.into())
    }

    /// Create a new `ModellingRuleViolation` error.
    pub fn modelling_rule<S: Into<String>>(msg: S) -> Self {
        Self::ModellingRuleViolation(msg.into())
    }

    /// Create a new `IndexOutOfRange` error.
    pub fn index_out_of_range<S: Into<String>>(msg: S) -> Self {
        Self::IndexOutOfRange(msg.into())
    }

    /// Create a new `InvalidIndexRange` error.
    pub fn invalid_index_range<S: Into<String>>(msg: S) -> Self {
        Self::InvalidIndexRange(msg.into())
    }

    /// Create a new `IncompatibleDataType` error.
    pub fn incompatible<S: Into<String>>(msg: S) -> Self {
        Self::IncompatibleDataType(msg.into())
    }

    /// Create a new `UnknownNode` error.
    pub fn unknown_node<S: Into<String>>(msg: S) -> Self {
        Self::UnknownNode(msg.into())
    }

    /// Create a new `UnknownNamespace` error.
    pub fn unknown_namespace<S: Into<String>>(msg: S) -> Self {
        Self::UnknownNamespace(msg.into())
    }

    /// Create a new `InvalidNodeClass` error.
    pub fn invalid_node_class<S: Into<String>>(msg: S) -> Self {
        Self::InvalidNodeClass(msg.into())
    }

    /// Create a new `DuplicateNodeId` error.
    pub fn duplicate_node_id<S: Into<String>>(msg: S) -> Self {
        Self::DuplicateNodeId(msg.into())
    }

    /// Create a new `DuplicateBrowseName` error.
    pub fn duplicate_browse_name<S: Into<String>>(msg: S) -> Self {
        Self::DuplicateBrowseName(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether this error belongs to the type system (as opposed to lookup failures).
    pub const fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownReferenceType(_)
                | Self::TypeHierarchyCycle(_)
                | Self::UnknownDataType(_)
                | Self::FieldTypeMismatch(_)
                | Self::ModellingRuleViolation(_)
                | Self::IncompatibleDataType(_)
        )
    }
}

/// Ensure a condition holds, returning the given error variant if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::ModelError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with a `FieldTypeMismatch`.
#[macro_export]
macro_rules! field_err {
    ($($arg:tt)*) => {
        return Err($crate::ModelError::FieldTypeMismatch(format!($($arg)*)))
    };
}

/// Return early with an `IncompatibleDataType`.
#[macro_export]
macro_rules! incompatible_err {
    ($($arg:tt)*) => {
        return Err($crate::ModelError::IncompatibleDataType(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_positive(n: i32) -> ModelResult<i32> {
        ensure!(n > 0, IndexOutOfRange: "{n} is not positive");
        Ok(n)
    }

    #[test]
    fn test_error_display() {
        let err = ModelError::invalid_identifier("ns=x;i=1");
        assert_eq!(err.to_string(), "InvalidIdentifierSyntax: ns=x;i=1");
        assert_eq!(
            ModelError::AddressSpaceDisposed.to_string(),
            "AddressSpaceDisposed: the address space has been disposed"
        );
    }

    #[test]
    fn test_error_constructors() {
        assert!(ModelError::unknown_data_type("ns=1;i=5").is_type_error());
        assert!(ModelError::modelling_rule("dangling").is_type_error());
        assert!(!ModelError::unknown_node("ns=1;i=5").is_type_error());
        assert!(!ModelError::index_out_of_range("3 >= 2").is_type_error());
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(check_positive(3), Ok(3));
        assert_eq!(
            check_positive(-1),
            Err(ModelError::IndexOutOfRange("-1 is not positive".to_string()))
        );
    }
}

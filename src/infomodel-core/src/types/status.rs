//! Status codes reported by read, write, browse and call.

use std::fmt;

use serde::{Deserialize, Serialize};

use common_error::ModelError;

/// An OPC UA style status code. The top two bits carry the severity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub u32);

macro_rules! status_codes {
    ($($name:ident = $code:literal;)*) => {
        impl StatusCode {
            $(pub const $name: Self = Self($code);)*

            /// The symbolic name of a known code.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($code => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

status_codes! {
    GOOD = 0x0000_0000;
    UNCERTAIN_INITIAL_VALUE = 0x4092_0000;
    BAD_UNEXPECTED_ERROR = 0x8001_0000;
    BAD_INTERNAL_ERROR = 0x8002_0000;
    BAD_SHUTDOWN = 0x800C_0000;
    BAD_DATA_TYPE_ID_UNKNOWN = 0x8011_0000;
    BAD_WAITING_FOR_INITIAL_DATA = 0x8032_0000;
    BAD_NODE_ID_UNKNOWN = 0x8034_0000;
    BAD_ATTRIBUTE_ID_INVALID = 0x8035_0000;
    BAD_INDEX_RANGE_INVALID = 0x8036_0000;
    BAD_INDEX_RANGE_NO_DATA = 0x8037_0000;
    BAD_NOT_READABLE = 0x803A_0000;
    BAD_NOT_WRITABLE = 0x803B_0000;
    BAD_OUT_OF_RANGE = 0x803C_0000;
    BAD_NOT_IMPLEMENTED = 0x8040_0000;
    BAD_REFERENCE_TYPE_ID_INVALID = 0x804C_0000;
    BAD_NODE_CLASS_INVALID = 0x805F_0000;
    BAD_TYPE_MISMATCH = 0x8074_0000;
    BAD_METHOD_INVALID = 0x8075_0000;
    BAD_ARGUMENTS_MISSING = 0x8076_0000;
    BAD_INVALID_ARGUMENT = 0x80AB_0000;
    BAD_TOO_MANY_ARGUMENTS = 0x80E5_0000;
    BAD_NOT_EXECUTABLE = 0x8111_0000;
}

impl StatusCode {
    /// Check if the severity is good.
    pub const fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Check if the severity is uncertain.
    pub const fn is_uncertain(self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Check if the severity is bad.
    pub const fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::GOOD
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "StatusCode({:#010x})", self.0),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<&ModelError> for StatusCode {
    fn from(err: &ModelError) -> Self {
        match err {
            ModelError::IndexOutOfRange(_) => Self::BAD_INDEX_RANGE_NO_DATA,
            ModelError::InvalidIndexRange(_) => Self::BAD_INDEX_RANGE_INVALID,
            ModelError::IncompatibleDataType(_) | ModelError::FieldTypeMismatch(_) => {
                Self::BAD_TYPE_MISMATCH
            }
            ModelError::AddressSpaceDisposed => Self::BAD_SHUTDOWN,
            ModelError::UnknownNode(_) | ModelError::InvalidIdentifierSyntax(_) => {
                Self::BAD_NODE_ID_UNKNOWN
            }
            ModelError::InvalidNodeClass(_) => Self::BAD_NODE_CLASS_INVALID,
            ModelError::UnknownReferenceType(_) => Self::BAD_REFERENCE_TYPE_ID_INVALID,
            ModelError::UnknownDataType(_) => Self::BAD_DATA_TYPE_ID_UNKNOWN,
            _ => Self::BAD_INTERNAL_ERROR,
        }
    }
}

impl From<ModelError> for StatusCode {
    fn from(err: ModelError) -> Self {
        Self::from(&err)
    }
}

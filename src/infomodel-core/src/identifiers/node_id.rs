//! Node identifiers and their text syntax.
//!
//! The text forms are `ns=<n>;i=<uint>`, `ns=<n>;s=<string>`,
//! `ns=<n>;g=<guid>` and `ns=<n>;b=<base64>`. The `ns=<n>;` prefix may be
//! omitted for namespace 0 when parsing; it is always written when rendering.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common_error::{ModelError, ModelResult};

/// A 128-bit GUID identifier, rendered lowercase with dashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Guid(Uuid);

impl Guid {
    /// Generate a new random GUID.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero GUID.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Guid {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        // Only the dashed form is valid inside a node id.
        if s.len() != 36 {
            return Err(ModelError::invalid_identifier(format!("malformed guid '{s}'")));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ModelError::invalid_identifier(format!("malformed guid '{s}': {e}")))
    }
}

/// The local part of a node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Identifier {
    /// Numeric identifier (`i=`).
    Numeric(u32),
    /// String identifier (`s=`).
    String(String),
    /// GUID identifier (`g=`).
    Guid(Guid),
    /// Opaque byte-string identifier (`b=`).
    Opaque(Vec<u8>),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "i={n}"),
            Self::String(s) => write!(f, "s={s}"),
            Self::Guid(g) => write!(f, "g={g}"),
            Self::Opaque(bytes) => write!(f, "b={}", STANDARD.encode(bytes)),
        }
    }
}

impl FromStr for Identifier {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        let Some((kind, body)) = s.split_at_checked(2) else {
            return Err(ModelError::invalid_identifier(s));
        };
        match kind {
            "i=" if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) => Err(
                ModelError::invalid_identifier(format!("bad numeric id '{s}'")),
            ),
            "i=" => body
                .parse::<u32>()
                .map(Self::Numeric)
                .map_err(|_| ModelError::invalid_identifier(format!("bad numeric id '{s}'"))),
            "s=" => Ok(Self::String(body.to_string())),
            "g=" => body.parse().map(Self::Guid),
            "b=" => STANDARD
                .decode(body)
                .map(Self::Opaque)
                .map_err(|e| ModelError::invalid_identifier(format!("bad opaque id '{s}': {e}"))),
            _ => Err(ModelError::invalid_identifier(s)),
        }
    }
}

/// A node identifier: namespace index plus local identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index.
    pub namespace: u16,
    /// Local identifier.
    pub identifier: Identifier,
}

impl NodeId {
    /// Create a node id from parts.
    pub fn new(namespace: u16, identifier: impl Into<Identifier>) -> Self {
        Self {
            namespace,
            identifier: identifier.into(),
        }
    }

    /// Create a numeric node id.
    pub const fn numeric(namespace: u16, id: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(id),
        }
    }

    /// Create a string node id.
    pub fn string(namespace: u16, id: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(id.into()),
        }
    }

    /// Create a GUID node id.
    pub const fn guid(namespace: u16, id: Guid) -> Self {
        Self {
            namespace,
            identifier: Identifier::Guid(id),
        }
    }

    /// Create an opaque node id.
    pub fn opaque(namespace: u16, id: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace,
            identifier: Identifier::Opaque(id.into()),
        }
    }

    /// A numeric id in the standard namespace.
    pub const fn ns0(id: u32) -> Self {
        Self::numeric(0, id)
    }

    /// The null node id (`ns=0;i=0`).
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Check whether this is the null node id.
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// Get the numeric identifier, if any.
    pub const fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(n) => Some(n),
            _ => None,
        }
    }

    /// Get the string identifier, if any.
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            Identifier::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check whether this is the standard-namespace numeric id `id`.
    pub fn is_ns0(&self, id: u32) -> bool {
        self.namespace == 0 && self.as_numeric() == Some(id)
    }
}

impl From<u32> for Identifier {
    fn from(n: u32) -> Self {
        Self::Numeric(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Guid> for Identifier {
    fn from(g: Guid) -> Self {
        Self::Guid(g)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};{}", self.namespace, self.identifier)
    }
}

impl FromStr for NodeId {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        let Some(rest) = s.strip_prefix("ns=") else {
            // Short ns0 form.
            return s
                .parse::<Identifier>()
                .map(|identifier| Self::new(0, identifier))
                .map_err(|_| ModelError::invalid_identifier(s));
        };

        // Split on the first ';' only: string identifiers may contain more.
        let (namespace, identifier) = rest
            .split_once(';')
            .ok_or_else(|| ModelError::invalid_identifier(s))?;
        if namespace.is_empty() || !namespace.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::invalid_identifier(s));
        }
        let namespace = namespace
            .parse::<u16>()
            .map_err(|_| ModelError::invalid_identifier(format!("namespace out of range in '{s}'")))?;
        let identifier = identifier.parse::<Identifier>()?;
        Ok(Self {
            namespace,
            identifier,
        })
    }
}

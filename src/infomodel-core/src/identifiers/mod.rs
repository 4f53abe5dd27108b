//! Identifiers for nodes and names.
//!
//! - `NodeId` with its four identifier forms and bit-exact text syntax
//! - `QualifiedName` and `LocalizedText`
//! - `well_known` numeric ids of the standard namespace

mod node_id;
mod qualified_name;
pub mod well_known;

pub use node_id::{Guid, Identifier, NodeId};
pub use qualified_name::{LocalizedText, QualifiedName};

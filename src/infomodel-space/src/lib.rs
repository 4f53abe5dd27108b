//! The address space of the information-model engine.
//!
//! An [`AddressSpace`] holds a graph of typed nodes connected by typed,
//! bidirectional references. On top of the graph it provides:
//! - namespace registration and node id allocation
//! - the subtype hierarchy and data type definitions
//! - instantiation of object and variable types
//! - value binding, reads, writes and method calls
//! - shutdown tasks and disposal

pub mod address_space;
pub mod bootstrap;
pub mod browse;
pub mod data_types;
pub mod graph;
pub mod hierarchy;
pub mod instantiate;
pub mod lifecycle;
pub mod method;
pub mod namespace;
pub mod node;
pub mod reference;
pub mod testing;
pub mod value;
pub mod warnings;

// Re-export commonly used types
pub use address_space::{AddressSpace, SpaceState};
pub use browse::{BrowseDescription, BrowseDirection, BrowseResult, ReferenceDescription};
pub use data_types::{
    DataTypeDefinition, DataTypeShape, EnumDefinition, EnumField, FieldInit, StructureDefinition,
    StructureField, StructureType, default_value,
};
pub use instantiate::{InstantiateOptions, ModellingRule};
pub use method::{CallResult, FnMethodHandler, MethodContext, MethodHandler};
pub use namespace::{CORE_NAMESPACE_URI, Namespace, NamespaceKey};
pub use node::{
    DataTypeAttributes, MethodAttributes, NodeAttributes, NodeSpec, ReferenceTypeAttributes,
    UaNode, ValueBinding, VariableAttributes, VariableTypeAttributes,
};
pub use reference::{Reference, ReferenceList};
pub use value::{FnValueSource, NodeContext, ValueSource};
pub use warnings::ModelWarning;

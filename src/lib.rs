//! Information-model engine.
//!
//! A live, browsable graph of typed nodes (objects, variables, methods and
//! their type definitions) connected by typed references, with instantiation
//! of types according to their modelling rules and runtime value binding.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export member crates
pub use common_config as config;
pub use common_error as error;
pub use infomodel_core as core;
pub use infomodel_space as space;

pub use infomodel_space::{AddressSpace, InstantiateOptions, NodeSpec};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

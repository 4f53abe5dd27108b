//! Error types and result aliases for the information-model engine.
//!
//! Type-system and value-coercion violations are hard errors. Graph-shape
//! anomalies are mostly tolerated by the address space and reported as warnings.

mod error;

pub use error::{ModelError, ModelResult};

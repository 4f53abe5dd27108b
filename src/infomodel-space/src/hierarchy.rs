//! Subtype resolution over HasSubtype references.
//!
//! Chains are walked iteratively and bounded by the configured maximum type
//! depth, so malformed or cyclic input terminates with `TypeHierarchyCycle`.

use std::collections::HashSet;

use log::trace;

use common_error::{ModelError, ModelResult};
use infomodel_core::well_known::{ReferenceTypeIds, is_type_root};
use infomodel_core::{BuiltinType, NodeClass, NodeId};

use crate::address_space::AddressSpace;

impl AddressSpace {
    /// The direct supertype of a type node (its inverse HasSubtype target).
    pub fn subtype_of(&self, node_id: &NodeId) -> Option<NodeId> {
        self.nodes
            .get(node_id)?
            .inverse_target(ReferenceTypeIds::HAS_SUBTYPE)
            .cloned()
    }

    /// Supertypes of `node_id`, nearest first, up to a type root or the end
    /// of the chain.
    pub fn supertype_chain(&self, node_id: &NodeId) -> ModelResult<Vec<NodeId>> {
        let mut chain = Vec::new();
        self.walk_supertypes(node_id, |id| {
            chain.push(id.clone());
            false
        })?;
        Ok(chain)
    }

    /// Check whether `candidate` equals `ancestor` or derives from it.
    pub fn is_subtype_of(&self, candidate: &NodeId, ancestor: &NodeId) -> ModelResult<bool> {
        if candidate == ancestor {
            return Ok(true);
        }
        self.walk_supertypes(candidate, |id| id == ancestor)
    }

    /// The `IsAbstract` attribute of a type node.
    pub fn is_abstract(&self, type_id: &NodeId) -> ModelResult<bool> {
        let node = self.require_node(type_id)?;
        node.is_abstract().ok_or_else(|| {
            ModelError::invalid_node_class(format!(
                "{type_id} is a {}, not a type",
                node.node_class()
            ))
        })
    }

    /// The built-in type values of `data_type` are encoded as.
    ///
    /// Walks the chain to the first standard built-in: structures and unions
    /// map to `ExtensionObject`, enumerations to `Int32`, and the abstract
    /// number families to `Variant`.
    pub fn builtin_type_of(&self, data_type: &NodeId) -> ModelResult<BuiltinType> {
        if let Some(builtin) = standard_builtin(data_type) {
            return Ok(builtin);
        }
        match self.nodes.get(data_type) {
            Some(node) if node.node_class() == NodeClass::DataType => {}
            _ => return Err(ModelError::unknown_data_type(data_type.to_string())),
        }
        let mut found = None;
        self.walk_supertypes(data_type, |id| {
            found = standard_builtin(id);
            found.is_some()
        })?;
        found.ok_or_else(|| {
            ModelError::unknown_data_type(format!("{data_type} does not derive from a built-in type"))
        })
    }

    /// Visit each supertype of `start`, nearest first, until `visit` returns
    /// true (the result is then `Ok(true)`) or the chain ends.
    fn walk_supertypes(
        &self,
        start: &NodeId,
        mut visit: impl FnMut(&NodeId) -> bool,
    ) -> ModelResult<bool> {
        let max_depth = self.config.limits.max_type_depth;
        let mut seen = HashSet::from([start]);
        let mut current = start;
        let mut depth = 0;
        loop {
            if is_type_root(current) {
                return Ok(false);
            }
            let Some(node) = self.nodes.get(current) else {
                return Ok(false);
            };
            let Some(supertype) = node.inverse_target(ReferenceTypeIds::HAS_SUBTYPE) else {
                trace!("Subtype chain of {start} ends at {current}");
                return Ok(false);
            };
            depth += 1;
            if !seen.insert(supertype) {
                return Err(ModelError::hierarchy_cycle(format!(
                    "{start} reaches {supertype} twice"
                )));
            }
            if depth > max_depth {
                return Err(ModelError::hierarchy_cycle(format!(
                    "{start} has no root within {max_depth} levels"
                )));
            }
            if visit(supertype) {
                return Ok(true);
            }
            current = supertype;
        }
    }
}

pub(crate) fn standard_builtin(id: &NodeId) -> Option<BuiltinType> {
    if id.namespace != 0 {
        return None;
    }
    BuiltinType::from_data_type_id(id.as_numeric()?)
}

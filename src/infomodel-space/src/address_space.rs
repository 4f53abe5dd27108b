//! The address space container.
//!
//! The address space is an arena of nodes keyed by [`NodeId`]. References are
//! records holding node ids, stored on both of the nodes they connect, so the
//! graph may contain cycles without any ownership cycle. Mutation is
//! single-writer: every mutating operation takes `&mut self`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use log::debug;

use common_config::ModelConfig;
use common_error::{ModelError, ModelResult};
use infomodel_core::well_known::{ReferenceTypeIds, ns0};
use infomodel_core::{NodeClass, NodeId, QualifiedName};

use crate::data_types::DataTypeShape;
use crate::namespace::{Namespace, NamespaceKey, NamespaceRegistry};
use crate::node::UaNode;
use crate::reference::Reference;
use crate::warnings::ModelWarning;

pub(crate) type ShutdownTask = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send + Sync>;

/// Lifecycle state of an address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceState {
    Live,
    Disposed,
}

/// An in-memory information model.
pub struct AddressSpace {
    pub(crate) state: SpaceState,
    pub(crate) config: ModelConfig,
    pub(crate) namespaces: NamespaceRegistry,
    pub(crate) nodes: HashMap<NodeId, UaNode>,
    pub(crate) browse_names: HashMap<QualifiedName, Vec<NodeId>>,
    /// Records waiting for the node named by the key to be created, stored
    /// from that node's point of view.
    pub(crate) pending: BTreeMap<NodeId, Vec<Reference>>,
    pub(crate) data_type_cache: RwLock<HashMap<NodeId, Arc<DataTypeShape>>>,
    pub(crate) warnings: Vec<ModelWarning>,
    pub(crate) shutdown_tasks: Vec<ShutdownTask>,
}

impl AddressSpace {
    /// Create an empty address space holding only the standard namespace.
    pub fn create() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Create an empty address space with explicit configuration.
    pub fn with_config(config: ModelConfig) -> Self {
        debug!(
            "Creating address space (separator {:?}, browse name policy {:?})",
            config.instantiation.separator, config.naming.duplicate_browse_names
        );
        Self {
            state: SpaceState::Live,
            config,
            namespaces: NamespaceRegistry::new(),
            nodes: HashMap::new(),
            browse_names: HashMap::new(),
            pending: BTreeMap::new(),
            data_type_cache: RwLock::new(HashMap::new()),
            warnings: Vec::new(),
            shutdown_tasks: Vec::new(),
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> SpaceState {
        self.state
    }

    /// Check if the address space has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state == SpaceState::Disposed
    }

    pub(crate) fn ensure_live(&self) -> ModelResult<()> {
        match self.state {
            SpaceState::Live => Ok(()),
            SpaceState::Disposed => Err(ModelError::AddressSpaceDisposed),
        }
    }

    /// The configuration this address space was created with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Namespaces and identifiers
    // ---------------------------------------------------------------------

    /// Register a namespace URI, returning its index. Idempotent.
    pub fn register_namespace(&mut self, uri: &str) -> ModelResult<u16> {
        self.ensure_live()?;
        let index = self.namespaces.register(uri)?;
        debug!("Namespace {uri} has index {index}");
        Ok(index)
    }

    /// Look up a namespace by index or URI.
    pub fn namespace<'a>(&self, key: impl Into<NamespaceKey<'a>>) -> ModelResult<&Namespace> {
        self.ensure_live()?;
        self.namespaces.get(key)
    }

    /// Namespace URIs in index order.
    pub fn namespace_uris(&self) -> Vec<&str> {
        self.namespaces.uris().collect()
    }

    /// Build a node id in `namespace`. Without an explicit identifier the
    /// next unused numeric id is allocated.
    pub fn build_node_id(
        &mut self,
        explicit: Option<infomodel_core::Identifier>,
        namespace: u16,
    ) -> ModelResult<NodeId> {
        self.ensure_live()?;
        let nodes = &self.nodes;
        self.namespaces
            .build_node_id(explicit, namespace, |id| nodes.contains_key(id))
    }

    /// Resolve identifier text, checking aliases before the literal forms.
    pub fn resolve_node_id(&self, text: &str) -> ModelResult<NodeId> {
        self.ensure_live()?;
        self.namespaces.resolve_node_id(text)
    }

    /// Declare an alias (`<n>:<name>` or a bare standard-namespace name).
    pub fn add_alias(&mut self, alias: &str, node_id: NodeId) -> ModelResult<()> {
        self.ensure_live()?;
        self.namespaces.add_alias(alias, node_id)
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    /// Get a node by id.
    pub fn node(&self, node_id: &NodeId) -> Option<&UaNode> {
        self.nodes.get(node_id)
    }

    pub(crate) fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut UaNode> {
        self.nodes.get_mut(node_id)
    }

    pub(crate) fn require_node(&self, node_id: &NodeId) -> ModelResult<&UaNode> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| ModelError::unknown_node(node_id.to_string()))
    }

    /// Check if a node exists.
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &UaNode> {
        self.nodes.values()
    }

    /// All nodes with the given browse name, in creation order.
    pub fn find_nodes_by_browse_name(&self, browse_name: &QualifiedName) -> Vec<&UaNode> {
        self.browse_names
            .get(browse_name)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    fn find_by_class(&self, browse_name: &str, class: NodeClass) -> Option<NodeId> {
        let name = QualifiedName::from(browse_name);
        self.find_nodes_by_browse_name(&name)
            .into_iter()
            .find(|node| node.node_class() == class)
            .map(|node| node.node_id.clone())
    }

    /// Find a ReferenceType by browse name (`"HasComponent"`, `"1:Feeds"`).
    pub fn find_reference_type(&self, browse_name: &str) -> Option<NodeId> {
        self.find_by_class(browse_name, NodeClass::ReferenceType)
    }

    /// Find an ObjectType by browse name.
    pub fn find_object_type(&self, browse_name: &str) -> Option<NodeId> {
        self.find_by_class(browse_name, NodeClass::ObjectType)
    }

    /// Find a VariableType by browse name.
    pub fn find_variable_type(&self, browse_name: &str) -> Option<NodeId> {
        self.find_by_class(browse_name, NodeClass::VariableType)
    }

    /// Find a DataType by browse name.
    pub fn find_data_type(&self, browse_name: &str) -> Option<NodeId> {
        self.find_by_class(browse_name, NodeClass::DataType)
    }

    /// The HasTypeDefinition target of an instance.
    pub fn type_definition_of(&self, node_id: &NodeId) -> Option<NodeId> {
        self.nodes
            .get(node_id)?
            .forward_target(ReferenceTypeIds::HAS_TYPE_DEFINITION)
            .cloned()
    }

    /// The HasModellingRule target of an instance declaration.
    pub fn modelling_rule_of(&self, node_id: &NodeId) -> Option<NodeId> {
        self.nodes
            .get(node_id)?
            .forward_target(ReferenceTypeIds::HAS_MODELLING_RULE)
            .cloned()
    }

    // ---------------------------------------------------------------------
    // Warnings
    // ---------------------------------------------------------------------

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[ModelWarning] {
        &self.warnings
    }

    /// Drain the collected warnings.
    pub fn take_warnings(&mut self) -> Vec<ModelWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn warn(&mut self, warning: ModelWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Report every reference whose peer was never created.
    ///
    /// Loaders call this once all sources are read; the result is also
    /// appended to the collected warnings.
    pub fn check_unresolved_references(&mut self) -> Vec<ModelWarning> {
        let unresolved: Vec<ModelWarning> = self
            .pending
            .iter()
            .flat_map(|(missing, records)| {
                records.iter().map(move |record| {
                    // The record is stored from the missing node's side.
                    let (source, target) = if record.is_forward {
                        (missing.clone(), record.target.clone())
                    } else {
                        (record.target.clone(), missing.clone())
                    };
                    ModelWarning::UnresolvedReference {
                        source,
                        reference_type: record.reference_type.clone(),
                        target,
                    }
                })
            })
            .collect();
        for warning in &unresolved {
            self.warn(warning.clone());
        }
        unresolved
    }

    pub(crate) fn invalidate_data_type_cache(&self) {
        self.data_type_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn hierarchical_references() -> NodeId {
        ns0(ReferenceTypeIds::HIERARCHICAL_REFERENCES)
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::create()
    }
}

impl fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressSpace")
            .field("state", &self.state)
            .field("namespaces", &self.namespaces.len())
            .field("nodes", &self.nodes.len())
            .field("pending", &self.pending.len())
            .field("warnings", &self.warnings.len())
            .field("shutdown_tasks", &self.shutdown_tasks.len())
            .finish()
    }
}

//! Namespace registry, node id allocation and alias resolution.

use std::collections::HashMap;

use common_error::{ModelError, ModelResult};
use infomodel_core::{Identifier, NodeId};

/// URI of the standard namespace, always registered at index 0.
pub const CORE_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

/// First numeric id handed out when no explicit id is requested.
pub const FIRST_GENERATED_ID: u32 = 1000;

/// A registered namespace.
#[derive(Debug, Clone)]
pub struct Namespace {
    index: u16,
    uri: String,
    aliases: HashMap<String, NodeId>,
    next_numeric: u32,
}

impl Namespace {
    fn new(index: u16, uri: String) -> Self {
        Self {
            index,
            uri,
            aliases: HashMap::new(),
            next_numeric: FIRST_GENERATED_ID,
        }
    }

    /// The namespace index.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// The namespace URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Look up an alias declared in this namespace.
    pub fn alias(&self, name: &str) -> Option<&NodeId> {
        self.aliases.get(name)
    }

    /// Number of aliases.
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

/// Key for namespace lookups: an index or a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKey<'a> {
    Index(u16),
    Uri(&'a str),
}

impl From<u16> for NamespaceKey<'_> {
    fn from(index: u16) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for NamespaceKey<'a> {
    fn from(uri: &'a str) -> Self {
        Self::Uri(uri)
    }
}

/// Ordered namespace table. Indices follow registration order.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceRegistry {
    /// Create a registry holding only the standard namespace.
    pub fn new() -> Self {
        Self {
            namespaces: vec![Namespace::new(0, CORE_NAMESPACE_URI.to_string())],
        }
    }

    /// Register `uri`, returning its index. Registering a known URI returns
    /// the existing index.
    pub fn register(&mut self, uri: &str) -> ModelResult<u16> {
        if let Some(ns) = self.namespaces.iter().find(|ns| ns.uri == uri) {
            return Ok(ns.index);
        }
        let index = u16::try_from(self.namespaces.len())
            .map_err(|_| ModelError::internal("namespace table is full"))?;
        self.namespaces.push(Namespace::new(index, uri.to_string()));
        Ok(index)
    }

    /// Look up a namespace by index or URI.
    pub fn get<'a>(&self, key: impl Into<NamespaceKey<'a>>) -> ModelResult<&Namespace> {
        match key.into() {
            NamespaceKey::Index(index) => self
                .namespaces
                .get(usize::from(index))
                .ok_or_else(|| ModelError::unknown_namespace(format!("index {index}"))),
            NamespaceKey::Uri(uri) => self
                .namespaces
                .iter()
                .find(|ns| ns.uri == uri)
                .ok_or_else(|| ModelError::unknown_namespace(uri.to_string())),
        }
    }

    fn get_mut(&mut self, index: u16) -> ModelResult<&mut Namespace> {
        self.namespaces
            .get_mut(usize::from(index))
            .ok_or_else(|| ModelError::unknown_namespace(format!("index {index}")))
    }

    /// Number of registered namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Check if the registry is empty, which only happens after disposal.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Drop every namespace and alias.
    pub(crate) fn clear(&mut self) {
        self.namespaces.clear();
    }

    /// Registered URIs in index order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|ns| ns.uri.as_str())
    }

    /// Build a node id in `namespace`.
    ///
    /// An explicit identifier is used as is. Otherwise the next numeric id
    /// for which `is_taken` is false is handed out.
    pub fn build_node_id(
        &mut self,
        explicit: Option<Identifier>,
        namespace: u16,
        is_taken: impl Fn(&NodeId) -> bool,
    ) -> ModelResult<NodeId> {
        let ns = self.get_mut(namespace)?;
        if let Some(identifier) = explicit {
            return Ok(NodeId::new(namespace, identifier));
        }
        loop {
            let candidate = NodeId::numeric(namespace, ns.next_numeric);
            ns.next_numeric = ns
                .next_numeric
                .checked_add(1)
                .ok_or_else(|| ModelError::internal(format!("namespace {namespace} exhausted")))?;
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Declare an alias. `alias` is `<n>:<name>` for a namespace-scoped alias
    /// or a bare name for the standard namespace.
    pub fn add_alias(&mut self, alias: &str, node_id: NodeId) -> ModelResult<()> {
        let (namespace, name) = split_alias(alias).unwrap_or((0, alias));
        self.get_mut(namespace)?
            .aliases
            .insert(name.to_string(), node_id);
        Ok(())
    }

    /// Resolve identifier text: aliases first, then the literal forms.
    pub fn resolve_node_id(&self, text: &str) -> ModelResult<NodeId> {
        if let Some(node_id) = self.resolve_alias(text) {
            return Ok(node_id.clone());
        }
        text.parse::<NodeId>()
    }

    fn resolve_alias(&self, text: &str) -> Option<&NodeId> {
        match split_alias(text) {
            Some((namespace, name)) => self.get(namespace).ok()?.alias(name),
            None if !text.contains(['=', ':', ';']) => self.namespaces.first()?.alias(text),
            None => None,
        }
    }
}

/// Split `<n>:<name>` where `<n>` is all digits.
fn split_alias(text: &str) -> Option<(u16, &str)> {
    let (prefix, name) = text.split_once(':')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) || name.is_empty() {
        return None;
    }
    Some((prefix.parse().ok()?, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = NamespaceRegistry::new();
        let a = registry.register("urn:a").unwrap();
        let b = registry.register("urn:b").unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(registry.register("urn:a").unwrap(), a);
        assert_eq!(registry.register(CORE_NAMESPACE_URI).unwrap(), 0);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_get_by_index_and_uri() {
        let mut registry = NamespaceRegistry::new();
        let idx = registry.register("urn:plant").unwrap();

        assert_eq!(registry.get(idx).unwrap().uri(), "urn:plant");
        assert_eq!(registry.get("urn:plant").unwrap().index(), idx);
        assert!(matches!(
            registry.get(9u16),
            Err(ModelError::UnknownNamespace(_))
        ));
        assert!(registry.get("urn:missing").is_err());
    }

    #[test]
    fn test_build_node_id_skips_taken() {
        let mut registry = NamespaceRegistry::new();
        let ns = registry.register("urn:plant").unwrap();

        let first = registry.build_node_id(None, ns, |_| false).unwrap();
        assert_eq!(first, NodeId::numeric(ns, FIRST_GENERATED_ID));

        let taken = NodeId::numeric(ns, FIRST_GENERATED_ID + 1);
        let second = registry.build_node_id(None, ns, |id| *id == taken).unwrap();
        assert_eq!(second, NodeId::numeric(ns, FIRST_GENERATED_ID + 2));

        let explicit = registry
            .build_node_id(Some(Identifier::from("Pump")), ns, |_| false)
            .unwrap();
        assert_eq!(explicit, NodeId::string(ns, "Pump"));

        assert!(registry.build_node_id(None, 7, |_| false).is_err());
    }

    #[test]
    fn test_alias_resolution_order() {
        let mut registry = NamespaceRegistry::new();
        let ns = registry.register("urn:plant").unwrap();
        registry
            .add_alias("1:Motor", NodeId::string(ns, "MotorType"))
            .unwrap();
        registry
            .add_alias("HasComponent", NodeId::ns0(47))
            .unwrap();

        assert_eq!(
            registry.resolve_node_id("1:Motor").unwrap(),
            NodeId::string(ns, "MotorType")
        );
        assert_eq!(
            registry.resolve_node_id("HasComponent").unwrap(),
            NodeId::ns0(47)
        );
        assert_eq!(
            registry.resolve_node_id("ns=1;s=a:b").unwrap(),
            NodeId::string(1, "a:b")
        );
        assert!(matches!(
            registry.resolve_node_id("1:Unknown"),
            Err(ModelError::InvalidIdentifierSyntax(_))
        ));
    }

    #[test]
    fn test_alias_in_unknown_namespace() {
        let mut registry = NamespaceRegistry::new();
        assert!(registry.add_alias("4:Thing", NodeId::ns0(1)).is_err());
    }
}

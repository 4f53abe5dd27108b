//! Instantiation of ObjectTypes and VariableTypes.
//!
//! An instance is built by cloning the type's instance declarations (its
//! own plus inherited ones, subtypes overriding by browse name) according to
//! their modelling rules, recursing into each clone's type definition.
//! Every node created by a failed call is removed again.

use std::collections::HashMap;

use log::debug;

use common_error::{ModelError, ModelResult, ensure};
use infomodel_core::well_known::{ObjectIds, ReferenceTypeIds, ns0};
use infomodel_core::{DataValue, LocalizedText, NodeClass, NodeId, QualifiedName};

use crate::address_space::AddressSpace;
use crate::node::{NodeAttributes, NodeSpec, SourceClock, ValueBinding, VariableAttributes};
use crate::reference::Reference;
use crate::warnings::ModelWarning;

/// The standard modelling rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModellingRule {
    Mandatory,
    Optional,
    MandatoryPlaceholder,
    OptionalPlaceholder,
    ExposesItsArray,
}

impl ModellingRule {
    /// The rule object's node id.
    pub const fn node_id(self) -> NodeId {
        ns0(match self {
            Self::Mandatory => ObjectIds::MODELLING_RULE_MANDATORY,
            Self::Optional => ObjectIds::MODELLING_RULE_OPTIONAL,
            Self::MandatoryPlaceholder => ObjectIds::MODELLING_RULE_MANDATORY_PLACEHOLDER,
            Self::OptionalPlaceholder => ObjectIds::MODELLING_RULE_OPTIONAL_PLACEHOLDER,
            Self::ExposesItsArray => ObjectIds::MODELLING_RULE_EXPOSES_ITS_ARRAY,
        })
    }

    /// Classify a rule object id.
    pub fn from_node_id(node_id: &NodeId) -> Option<Self> {
        if node_id.namespace != 0 {
            return None;
        }
        Some(match node_id.as_numeric()? {
            ObjectIds::MODELLING_RULE_MANDATORY => Self::Mandatory,
            ObjectIds::MODELLING_RULE_OPTIONAL => Self::Optional,
            ObjectIds::MODELLING_RULE_MANDATORY_PLACEHOLDER => Self::MandatoryPlaceholder,
            ObjectIds::MODELLING_RULE_OPTIONAL_PLACEHOLDER => Self::OptionalPlaceholder,
            ObjectIds::MODELLING_RULE_EXPOSES_ITS_ARRAY => Self::ExposesItsArray,
            _ => return None,
        })
    }

    /// The browse name of the rule object.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mandatory => "Mandatory",
            Self::Optional => "Optional",
            Self::MandatoryPlaceholder => "MandatoryPlaceholder",
            Self::OptionalPlaceholder => "OptionalPlaceholder",
            Self::ExposesItsArray => "ExposesItsArray",
        }
    }
}

/// Placement and naming of a new instance.
#[derive(Debug, Clone)]
pub struct InstantiateOptions {
    browse_name: QualifiedName,
    node_id: Option<NodeId>,
    namespace: Option<u16>,
    display_name: Option<LocalizedText>,
    description: Option<LocalizedText>,
    /// Reference type and parent; the parent holds the forward record.
    placement: Option<(NodeId, NodeId)>,
    optionals: Vec<String>,
    separator: Option<String>,
    modelling_rule: Option<NodeId>,
}

impl InstantiateOptions {
    pub fn new(browse_name: impl Into<QualifiedName>) -> Self {
        Self {
            browse_name: browse_name.into(),
            node_id: None,
            namespace: None,
            display_name: None,
            description: None,
            placement: None,
            optionals: Vec::new(),
            separator: None,
            modelling_rule: None,
        }
    }

    #[must_use]
    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: u16) -> Self {
        self.namespace = Some(namespace);
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<LocalizedText>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<LocalizedText>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn organized_by(self, parent: NodeId) -> Self {
        self.placed_by(ns0(ReferenceTypeIds::ORGANIZES), parent)
    }

    #[must_use]
    pub fn component_of(self, parent: NodeId) -> Self {
        self.placed_by(ns0(ReferenceTypeIds::HAS_COMPONENT), parent)
    }

    #[must_use]
    pub fn property_of(self, parent: NodeId) -> Self {
        self.placed_by(ns0(ReferenceTypeIds::HAS_PROPERTY), parent)
    }

    /// Place the instance under `parent` through `reference_type`.
    #[must_use]
    pub fn placed_by(mut self, reference_type: NodeId, parent: NodeId) -> Self {
        self.placement = Some((reference_type, parent));
        self
    }

    /// Request an optional child, `"Child"` or `"Child.Grandchild"`.
    #[must_use]
    pub fn with_optional(mut self, path: impl Into<String>) -> Self {
        self.optionals.push(path.into());
        self
    }

    #[must_use]
    pub fn with_optionals<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
        self.optionals.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Override the separator used to compose string child ids.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Tag the new root with a modelling rule (when building a type).
    #[must_use]
    pub fn with_modelling_rule(mut self, rule: ModellingRule) -> Self {
        self.modelling_rule = Some(rule.node_id());
        self
    }
}

/// A child of a type or declaration reached through a hierarchical reference.
#[derive(Debug, Clone)]
struct Declaration {
    node_id: NodeId,
    reference_type: NodeId,
    browse_name: QualifiedName,
    /// Expansion scope the declaration belongs to.
    scope: usize,
}

#[derive(Debug)]
struct Cloned {
    declaration: NodeId,
    clone: NodeId,
    scope: usize,
}

/// State of one instantiate call.
struct Instantiation {
    separator: String,
    max_depth: usize,
    created: Vec<NodeId>,
    cloned: Vec<Cloned>,
    path: Vec<NodeId>,
    next_scope: usize,
}

impl Instantiation {
    fn new_scope(&mut self) -> usize {
        self.next_scope += 1;
        self.next_scope
    }

    fn clone_of(&self, declaration: &NodeId, scope: usize) -> Option<&NodeId> {
        let mut candidates = self.cloned.iter().filter(|c| &c.declaration == declaration);
        let first = candidates.next()?;
        if first.scope == scope {
            return Some(&first.clone);
        }
        Some(
            candidates
                .find(|c| c.scope == scope)
                .map_or(&first.clone, |c| &c.clone),
        )
    }
}

/// Split dotted optional paths into segments.
fn split_paths(paths: &[String]) -> Vec<Vec<String>> {
    paths
        .iter()
        .map(|p| p.split('.').map(str::to_string).collect::<Vec<_>>())
        .filter(|p| p.iter().all(|s| !s.is_empty()))
        .collect()
}

fn is_requested(paths: &[Vec<String>], name: &str) -> bool {
    paths.iter().any(|p| p.first().is_some_and(|s| s == name))
}

fn nested_paths(paths: &[Vec<String>], name: &str) -> Vec<Vec<String>> {
    paths
        .iter()
        .filter(|p| p.len() > 1 && p[0] == name)
        .map(|p| p[1..].to_vec())
        .collect()
}

impl AddressSpace {
    /// Create an instance of `type_id`.
    ///
    /// Mandatory and MandatoryPlaceholder declarations are always cloned,
    /// Optional ones only when requested through the options, declarations
    /// without a rule never. Fails with `ModellingRuleViolation` when the type
    /// is abstract or a mandatory declaration's type definition is missing.
    pub fn instantiate(&mut self, type_id: &NodeId, options: InstantiateOptions) -> ModelResult<NodeId> {
        self.ensure_live()?;
        let mut ctx = Instantiation {
            separator: options
                .separator
                .clone()
                .unwrap_or_else(|| self.config.instantiation.separator.clone()),
            max_depth: self.config.limits.max_instantiation_depth,
            created: Vec::new(),
            cloned: Vec::new(),
            path: Vec::new(),
            next_scope: 0,
        };
        match self.instantiate_root(type_id, options, &mut ctx) {
            Ok(root) => {
                debug!(
                    "Instantiated {type_id} as {root} ({} nodes)",
                    ctx.created.len()
                );
                Ok(root)
            }
            Err(err) => {
                debug!(
                    "Instantiating {type_id} failed, removing {} nodes: {err}",
                    ctx.created.len()
                );
                for id in ctx.created.iter().rev() {
                    self.unlink_node(id);
                }
                Err(err)
            }
        }
    }

    fn instantiate_root(
        &mut self,
        type_id: &NodeId,
        options: InstantiateOptions,
        ctx: &mut Instantiation,
    ) -> ModelResult<NodeId> {
        let type_node = self.require_node(type_id)?;
        let attributes = match &type_node.attributes {
            NodeAttributes::ObjectType { .. } => NodeAttributes::Object { event_notifier: 0 },
            NodeAttributes::VariableType(vt) => {
                let mut attrs = VariableAttributes::new(vt.data_type.clone());
                attrs.value_rank = vt.value_rank;
                attrs.array_dimensions = vt.array_dimensions.clone();
                attrs.value = ValueBinding::Static(DataValue::new(vt.value.clone()));
                NodeAttributes::Variable(attrs)
            }
            other => {
                return Err(ModelError::invalid_node_class(format!(
                    "cannot instantiate {type_id}, a {}",
                    other.node_class()
                )));
            }
        };
        ensure!(
            !self.is_abstract(type_id)?,
            ModellingRuleViolation: "{} is abstract",
            type_id
        );

        // A placed root lives in its parent's namespace unless told otherwise.
        let parent = options.placement.as_ref().map(|(_, parent)| parent.clone());
        let node_id = match options.node_id {
            Some(id) => id,
            None => match &parent {
                Some(parent) => {
                    self.child_node_id(ctx, parent, &options.browse_name, options.namespace)?
                }
                None => {
                    let namespace = options.namespace.unwrap_or(options.browse_name.namespace_index);
                    self.build_node_id(None, namespace)?
                }
            },
        };

        let mut spec = NodeSpec::new(options.browse_name, attributes)
            .with_node_id(node_id)
            .type_definition(type_id.clone());
        spec.display_name = options.display_name;
        spec.description = options.description;
        if let Some((reference_type, parent)) = options.placement {
            spec = spec.reference(reference_type, parent, false);
        }
        if let Some(rule) = options.modelling_rule {
            spec = spec.modelling_rule(rule);
        }
        let root = self.create_node(spec)?;
        ctx.created.push(root.clone());

        let scope = ctx.new_scope();
        let declarations = self.type_declarations(type_id, scope)?;
        let optionals = split_paths(&options.optionals);
        self.populate(ctx, &root, declarations, &optionals, 0)?;
        self.reproduce_references(ctx)?;
        Ok(root)
    }

    /// Clone the declarations selected by their modelling rules under `instance`.
    fn populate(
        &mut self,
        ctx: &mut Instantiation,
        instance: &NodeId,
        declarations: Vec<Declaration>,
        optionals: &[Vec<String>],
        depth: usize,
    ) -> ModelResult<()> {
        for declaration in declarations {
            let Some(rule_id) = self.modelling_rule_of(&declaration.node_id) else {
                continue;
            };
            let name = declaration.browse_name.name.as_str();
            let rule = ModellingRule::from_node_id(&rule_id);
            let selected = match rule {
                Some(ModellingRule::Mandatory | ModellingRule::MandatoryPlaceholder) => true,
                Some(ModellingRule::Optional | ModellingRule::OptionalPlaceholder) => {
                    is_requested(optionals, name)
                }
                Some(ModellingRule::ExposesItsArray) | None => {
                    self.warn(ModelWarning::SkippedInstanceDeclaration {
                        declaration: declaration.node_id.clone(),
                        reason: format!("modelling rule {rule_id} is not instantiated"),
                    });
                    false
                }
            };
            if !selected {
                continue;
            }
            let mandatory = matches!(
                rule,
                Some(ModellingRule::Mandatory | ModellingRule::MandatoryPlaceholder)
            );
            let nested = nested_paths(optionals, name);
            self.clone_declaration(ctx, instance, &declaration, mandatory, &nested, depth + 1)?;
        }
        Ok(())
    }

    fn clone_declaration(
        &mut self,
        ctx: &mut Instantiation,
        parent: &NodeId,
        declaration: &Declaration,
        mandatory: bool,
        optionals: &[Vec<String>],
        depth: usize,
    ) -> ModelResult<()> {
        if ctx.path.contains(&declaration.node_id) {
            self.warn(ModelWarning::InstantiationCycle {
                declaration: declaration.node_id.clone(),
            });
            return Ok(());
        }
        ensure!(
            depth <= ctx.max_depth,
            ModellingRuleViolation: "instantiation deeper than {} levels at {}",
            ctx.max_depth,
            declaration.node_id
        );

        let decl_node = self.require_node(&declaration.node_id)?;
        let type_definition = decl_node
            .forward_target(ReferenceTypeIds::HAS_TYPE_DEFINITION)
            .cloned();
        let display_name = decl_node.display_name.clone();
        let description = decl_node.description.clone();
        let attributes = match &decl_node.attributes {
            NodeAttributes::Object { event_notifier } => Ok(NodeAttributes::Object {
                event_notifier: *event_notifier,
            }),
            NodeAttributes::Variable(attrs) => {
                let mut attrs = attrs.clone();
                attrs.clock = SourceClock::default();
                let unset = attrs.static_value().is_some_and(|v| v.value.is_empty());
                let default = type_definition
                    .as_ref()
                    .and_then(|td| self.type_default_value(td));
                if let (true, Some(default)) = (unset, default) {
                    attrs.value = ValueBinding::Static(DataValue::new(default));
                }
                Ok(NodeAttributes::Variable(attrs))
            }
            NodeAttributes::Method(attrs) => Ok(NodeAttributes::Method(attrs.clone())),
            other => Err(format!(
                "{} declarations are not instantiated",
                other.node_class()
            )),
        };

        let resolved = match (&type_definition, attributes) {
            (Some(td), _) if !self.nodes.contains_key(td) => {
                Err(format!("type definition {td} does not exist"))
            }
            (_, attributes) => attributes,
        };
        let attributes = match resolved {
            Ok(attributes) => attributes,
            Err(reason) => {
                ensure!(
                    !mandatory,
                    ModellingRuleViolation: "mandatory {}: {}",
                    declaration.node_id,
                    reason
                );
                self.warn(ModelWarning::SkippedInstanceDeclaration {
                    declaration: declaration.node_id.clone(),
                    reason,
                });
                return Ok(());
            }
        };

        let node_id = self.child_node_id(ctx, parent, &declaration.browse_name, None)?;
        let mut spec = NodeSpec::new(declaration.browse_name.clone(), attributes)
            .with_node_id(node_id)
            .reference(declaration.reference_type.clone(), parent.clone(), false);
        spec.display_name = Some(display_name);
        spec.description = description;
        if let Some(type_definition) = &type_definition {
            spec = spec.type_definition(type_definition.clone());
        }
        let clone = self.create_node(spec)?;
        ctx.created.push(clone.clone());
        ctx.cloned.push(Cloned {
            declaration: declaration.node_id.clone(),
            clone: clone.clone(),
            scope: declaration.scope,
        });

        // Declarations nested under this one override its type definition's.
        let mut children = match &type_definition {
            Some(type_definition) => {
                let scope = ctx.new_scope();
                self.type_declarations(type_definition, scope)?
            }
            None => Vec::new(),
        };
        for nested in self.declarations_of(&declaration.node_id, declaration.scope)? {
            merge_declaration(&mut children, nested);
        }

        ctx.path.push(declaration.node_id.clone());
        let populated = self.populate(ctx, &clone, children, optionals, depth);
        ctx.path.pop();
        populated
    }

    /// Id for a new child of `parent`: `<parent><separator><name>` for string
    /// parents, otherwise the next numeric id in the parent's namespace.
    fn child_node_id(
        &mut self,
        ctx: &Instantiation,
        parent: &NodeId,
        browse_name: &QualifiedName,
        namespace: Option<u16>,
    ) -> ModelResult<NodeId> {
        let namespace = namespace.unwrap_or(parent.namespace);
        if let Some(parent_id) = parent.as_string() {
            let requested = NodeId::string(
                namespace,
                format!("{parent_id}{}{}", ctx.separator, browse_name.name),
            );
            if !self.nodes.contains_key(&requested) {
                return Ok(requested);
            }
            let assigned = self.build_node_id(None, namespace)?;
            self.warn(ModelWarning::NodeIdFallback {
                requested,
                assigned: assigned.clone(),
            });
            return Ok(assigned);
        }
        self.build_node_id(None, namespace)
    }

    /// Declarations of a type including inherited ones, supertypes first,
    /// subtypes overriding by browse name.
    fn type_declarations(&self, type_id: &NodeId, scope: usize) -> ModelResult<Vec<Declaration>> {
        let mut chain = self.supertype_chain(type_id)?;
        chain.reverse();
        chain.push(type_id.clone());
        let mut declarations = Vec::new();
        for type_id in &chain {
            for declaration in self.declarations_of(type_id, scope)? {
                merge_declaration(&mut declarations, declaration);
            }
        }
        Ok(declarations)
    }

    /// Direct hierarchical children of `node_id`, excluding subtypes.
    fn declarations_of(&self, node_id: &NodeId, scope: usize) -> ModelResult<Vec<Declaration>> {
        let Some(node) = self.nodes.get(node_id) else {
            return Ok(Vec::new());
        };
        let has_subtype = ns0(ReferenceTypeIds::HAS_SUBTYPE);
        let mut declarations = Vec::new();
        for record in node.references.iter().filter(|r| r.is_forward) {
            if self.is_subtype_of(&record.reference_type, &has_subtype)?
                || !self.is_hierarchical(&record.reference_type)?
            {
                continue;
            }
            let Some(child) = self.nodes.get(&record.target) else {
                continue;
            };
            declarations.push(Declaration {
                node_id: child.node_id.clone(),
                reference_type: record.reference_type.clone(),
                browse_name: child.browse_name.clone(),
                scope,
            });
        }
        Ok(declarations)
    }

    fn type_default_value(&self, type_id: &NodeId) -> Option<infomodel_core::Variant> {
        match &self.nodes.get(type_id)?.attributes {
            NodeAttributes::VariableType(vt) if !vt.value.is_empty() => Some(vt.value.clone()),
            _ => None,
        }
    }

    /// Copy non-hierarchical references between declarations onto their clones.
    fn reproduce_references(&mut self, ctx: &Instantiation) -> ModelResult<()> {
        let mut copies: Vec<(NodeId, Reference)> = Vec::new();
        for cloned in &ctx.cloned {
            let Some(declaration) = self.nodes.get(&cloned.declaration) else {
                continue;
            };
            for record in declaration.references.iter().filter(|r| r.is_forward) {
                if record.reference_type.is_ns0(ReferenceTypeIds::HAS_TYPE_DEFINITION)
                    || record.reference_type.is_ns0(ReferenceTypeIds::HAS_MODELLING_RULE)
                    || self.is_hierarchical(&record.reference_type)?
                {
                    continue;
                }
                let target = match ctx.clone_of(&record.target, cloned.scope) {
                    Some(target) => target.clone(),
                    // A declaration that was not cloned has no counterpart.
                    None if self.modelling_rule_of(&record.target).is_some() => continue,
                    None => record.target.clone(),
                };
                copies.push((
                    cloned.clone.clone(),
                    Reference::forward(record.reference_type.clone(), target),
                ));
            }
        }
        for (source, record) in copies {
            self.add_reference(&source, &record.reference_type, &record.target, true)?;
        }
        Ok(())
    }

    /// The instance declarations of a type that carry a modelling rule, by
    /// browse name.
    pub fn instance_declarations(&self, type_id: &NodeId) -> ModelResult<HashMap<QualifiedName, NodeId>> {
        self.ensure_live()?;
        let node = self.require_node(type_id)?;
        ensure!(
            node.node_class().is_type(),
            InvalidNodeClass: "{} is a {}",
            type_id,
            node.node_class()
        );
        Ok(self
            .type_declarations(type_id, 0)?
            .into_iter()
            .filter(|d| self.modelling_rule_of(&d.node_id).is_some())
            .map(|d| (d.browse_name, d.node_id))
            .collect())
    }

    /// Check whether `node_id` is an Object or Variable of `type_id` or a
    /// subtype of it.
    pub fn is_instance_of(&self, node_id: &NodeId, type_id: &NodeId) -> ModelResult<bool> {
        let node = self.require_node(node_id)?;
        if !matches!(node.node_class(), NodeClass::Object | NodeClass::Variable) {
            return Ok(false);
        }
        match self.type_definition_of(node_id) {
            Some(definition) => self.is_subtype_of(&definition, type_id),
            None => Ok(false),
        }
    }
}

fn merge_declaration(declarations: &mut Vec<Declaration>, declaration: Declaration) {
    match declarations
        .iter_mut()
        .find(|d| d.browse_name == declaration.browse_name)
    {
        Some(existing) => *existing = declaration,
        None => declarations.push(declaration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modelling_rule_ids() {
        for rule in [
            ModellingRule::Mandatory,
            ModellingRule::Optional,
            ModellingRule::MandatoryPlaceholder,
            ModellingRule::OptionalPlaceholder,
            ModellingRule::ExposesItsArray,
        ] {
            assert_eq!(ModellingRule::from_node_id(&rule.node_id()), Some(rule));
        }
        assert_eq!(ModellingRule::from_node_id(&NodeId::numeric(1, 78)), None);
    }

    #[test]
    fn test_optional_paths() {
        let paths = split_paths(&[
            "Motor".to_string(),
            "Motor.Temperature".to_string(),
            "Valve..Bad".to_string(),
        ]);
        assert_eq!(paths.len(), 2);
        assert!(is_requested(&paths, "Motor"));
        assert!(!is_requested(&paths, "Valve"));
        assert_eq!(
            nested_paths(&paths, "Motor"),
            vec![vec!["Temperature".to_string()]]
        );
    }

    #[test]
    fn test_merge_overrides_by_name() {
        let decl = |id: u32, name: &str| Declaration {
            node_id: NodeId::numeric(1, id),
            reference_type: ns0(ReferenceTypeIds::HAS_COMPONENT),
            browse_name: QualifiedName::new(1, name),
            scope: 0,
        };
        let mut declarations = vec![decl(1, "A"), decl(2, "B")];
        merge_declaration(&mut declarations, decl(3, "A"));
        merge_declaration(&mut declarations, decl(4, "C"));

        let ids: Vec<_> = declarations.iter().map(|d| d.node_id.clone()).collect();
        assert_eq!(
            ids,
            vec![NodeId::numeric(1, 3), NodeId::numeric(1, 2), NodeId::numeric(1, 4)]
        );
    }
}

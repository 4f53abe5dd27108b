//! Method binding and invocation.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace};

use common_error::{ModelError, ModelResult};
use infomodel_core::well_known::{ReferenceTypeIds, ns0};
use infomodel_core::{NodeClass, NodeId, StatusCode, Variant};

use crate::address_space::AddressSpace;
use crate::node::{NodeAttributes, UaNode};

/// Browse name of the property listing a method's input arguments.
pub const INPUT_ARGUMENTS: &str = "InputArguments";

/// The object and method a handler runs for.
pub struct MethodContext<'a> {
    space: &'a AddressSpace,
    object: &'a UaNode,
    method: &'a UaNode,
}

impl<'a> MethodContext<'a> {
    /// The object the method was called on.
    pub fn object(&self) -> &'a UaNode {
        self.object
    }

    /// The method node.
    pub fn method(&self) -> &'a UaNode {
        self.method
    }

    /// The owning address space.
    pub fn space(&self) -> &'a AddressSpace {
        self.space
    }
}

/// Behaviour behind a Method node.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Run the method on `inputs`, producing its outputs.
    async fn call(&self, ctx: &MethodContext<'_>, inputs: Vec<Variant>) -> ModelResult<Vec<Variant>>;
}

type CallFn = Box<dyn Fn(&MethodContext<'_>, Vec<Variant>) -> ModelResult<Vec<Variant>> + Send + Sync>;

/// A [`MethodHandler`] wrapping a plain closure.
pub struct FnMethodHandler(CallFn);

impl FnMethodHandler {
    pub fn new(
        call: impl Fn(&MethodContext<'_>, Vec<Variant>) -> ModelResult<Vec<Variant>> + Send + Sync + 'static,
    ) -> Self {
        Self(Box::new(call))
    }
}

#[async_trait]
impl MethodHandler for FnMethodHandler {
    async fn call(&self, ctx: &MethodContext<'_>, inputs: Vec<Variant>) -> ModelResult<Vec<Variant>> {
        (self.0)(ctx, inputs)
    }
}

/// Outcome of [`AddressSpace::call_method`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResult {
    pub status: StatusCode,
    pub outputs: Vec<Variant>,
}

impl CallResult {
    fn bad(status: StatusCode) -> Self {
        Self {
            status,
            outputs: Vec::new(),
        }
    }
}

impl AddressSpace {
    /// Bind `handler` to a Method node.
    ///
    /// Instances cloned from the method afterwards share the handler.
    pub fn bind_method(&mut self, method_id: &NodeId, handler: Arc<dyn MethodHandler>) -> ModelResult<()> {
        self.ensure_live()?;
        let node = self
            .node_mut(method_id)
            .ok_or_else(|| ModelError::unknown_node(method_id.to_string()))?;
        match &mut node.attributes {
            NodeAttributes::Method(attrs) => {
                attrs.handler = Some(handler);
                debug!("Bound handler to method {method_id}");
                Ok(())
            }
            other => Err(ModelError::invalid_node_class(format!(
                "{method_id} is a {}, not a Method",
                other.node_class()
            ))),
        }
    }

    /// Invoke a method on an object. Failures are reported in the status.
    pub async fn call_method(&self, object_id: &NodeId, method_id: &NodeId, inputs: Vec<Variant>) -> CallResult {
        if self.is_disposed() {
            return CallResult::bad(StatusCode::BAD_SHUTDOWN);
        }
        let Some(object) = self.node(object_id) else {
            return CallResult::bad(StatusCode::BAD_NODE_ID_UNKNOWN);
        };
        let Some(method) = self.node(method_id) else {
            return CallResult::bad(StatusCode::BAD_METHOD_INVALID);
        };
        let Some(attrs) = method.as_method() else {
            return CallResult::bad(StatusCode::BAD_METHOD_INVALID);
        };
        match self.method_belongs_to(object, method_id) {
            Ok(true) => {}
            Ok(false) => return CallResult::bad(StatusCode::BAD_METHOD_INVALID),
            Err(err) => return CallResult::bad(StatusCode::from(&err)),
        }
        if !attrs.executable {
            return CallResult::bad(StatusCode::BAD_NOT_EXECUTABLE);
        }
        let Some(handler) = attrs.handler.as_ref().map(Arc::clone) else {
            return CallResult::bad(StatusCode::BAD_NOT_IMPLEMENTED);
        };
        if let Some(expected) = self.input_argument_count(method_id) {
            if inputs.len() < expected {
                return CallResult::bad(StatusCode::BAD_ARGUMENTS_MISSING);
            }
            if inputs.len() > expected {
                return CallResult::bad(StatusCode::BAD_TOO_MANY_ARGUMENTS);
            }
        }

        trace!("Calling {method_id} on {object_id}");
        let ctx = MethodContext {
            space: self,
            object,
            method,
        };
        match handler.call(&ctx, inputs).await {
            Ok(outputs) => CallResult {
                status: StatusCode::GOOD,
                outputs,
            },
            Err(err) => {
                debug!("Method {method_id} failed: {err}");
                CallResult::bad(StatusCode::from(&err))
            }
        }
    }

    /// Check that the method is a component of the object or of a type in
    /// the object's type definition chain.
    fn method_belongs_to(&self, object: &UaNode, method_id: &NodeId) -> ModelResult<bool> {
        let has_component = ns0(ReferenceTypeIds::HAS_COMPONENT);
        let owns = |owner: &NodeId| -> ModelResult<bool> {
            Ok(self
                .find_references(owner, &has_component, true, true)?
                .iter()
                .any(|r| &r.target == method_id))
        };
        if owns(object.node_id())? {
            return Ok(true);
        }
        let type_id = match object.node_class() {
            class if class.is_type() => Some(object.node_id().clone()),
            NodeClass::Object | NodeClass::Variable => self.type_definition_of(object.node_id()),
            _ => None,
        };
        let Some(type_id) = type_id else {
            return Ok(false);
        };
        if owns(&type_id)? {
            return Ok(true);
        }
        for supertype in self.supertype_chain(&type_id)? {
            if owns(&supertype)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of declared input arguments, when the method lists them.
    fn input_argument_count(&self, method_id: &NodeId) -> Option<usize> {
        let property = self.property_by_name(method_id, INPUT_ARGUMENTS)?;
        let value = &self.node(&property)?.as_variable()?.static_value()?.value;
        match value {
            Variant::Empty => None,
            Variant::Array(array) => Some(array.values.len()),
            _ => Some(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use infomodel_core::QualifiedName;
    use infomodel_core::well_known::{DataTypeIds, ObjectIds, ObjectTypeIds};

    use super::*;
    use crate::node::NodeSpec;

    fn adder() -> Arc<dyn MethodHandler> {
        Arc::new(FnMethodHandler::new(|_, inputs| {
            let sum = inputs.iter().filter_map(Variant::as_i64).sum::<i64>();
            Ok(vec![Variant::Int64(sum)])
        }))
    }

    fn space_with_method() -> (AddressSpace, NodeId, NodeId) {
        let mut space = AddressSpace::with_core_model();
        let ns = space.register_namespace("urn:calc").unwrap();
        let object = space
            .create_node(
                NodeSpec::object(QualifiedName::new(ns, "Calc"))
                    .organized_by(ns0(ObjectIds::OBJECTS_FOLDER))
                    .type_definition(ns0(ObjectTypeIds::BASE_OBJECT_TYPE)),
            )
            .unwrap();
        let method = space
            .create_node(NodeSpec::method(QualifiedName::new(ns, "Add")).component_of(object.clone()))
            .unwrap();
        (space, object, method)
    }

    #[tokio::test]
    async fn test_call_bound_method() {
        let (mut space, object, method) = space_with_method();
        assert_eq!(
            space.call_method(&object, &method, vec![]).await.status,
            StatusCode::BAD_NOT_IMPLEMENTED
        );

        space.bind_method(&method, adder()).unwrap();
        let result = space
            .call_method(&object, &method, vec![Variant::Int32(2), Variant::Int32(3)])
            .await;
        assert_eq!(result.status, StatusCode::GOOD);
        assert_eq!(result.outputs, vec![Variant::Int64(5)]);
    }

    #[tokio::test]
    async fn test_argument_count() {
        let (mut space, object, method) = space_with_method();
        space.bind_method(&method, adder()).unwrap();
        space
            .create_node(
                NodeSpec::variable(INPUT_ARGUMENTS, ns0(DataTypeIds::STRING))
                    .with_value_rank(1)
                    .with_value(vec!["a".to_string(), "b".to_string()])
                    .property_of(method.clone()),
            )
            .unwrap();

        let one = space.call_method(&object, &method, vec![Variant::Int32(1)]).await;
        assert_eq!(one.status, StatusCode::BAD_ARGUMENTS_MISSING);
        let three = space
            .call_method(&object, &method, vec![Variant::Int32(1); 3])
            .await;
        assert_eq!(three.status, StatusCode::BAD_TOO_MANY_ARGUMENTS);
    }

    #[tokio::test]
    async fn test_method_must_belong_to_object() {
        let (mut space, _, method) = space_with_method();
        space.bind_method(&method, adder()).unwrap();
        let other = space
            .create_node(NodeSpec::object("Other").organized_by(ns0(ObjectIds::OBJECTS_FOLDER)))
            .unwrap();
        let result = space.call_method(&other, &method, vec![]).await;
        assert_eq!(result.status, StatusCode::BAD_METHOD_INVALID);
    }

    #[tokio::test]
    async fn test_not_executable() {
        let mut space = AddressSpace::with_core_model();
        let object = space.create_node(NodeSpec::object("Box")).unwrap();
        let method = space
            .create_node(
                NodeSpec::method("Open")
                    .with_executable(false)
                    .component_of(object.clone()),
            )
            .unwrap();
        space.bind_method(&method, adder()).unwrap();
        let result = space.call_method(&object, &method, vec![]).await;
        assert_eq!(result.status, StatusCode::BAD_NOT_EXECUTABLE);
    }

    #[test]
    fn test_bind_requires_method() {
        let mut space = AddressSpace::with_core_model();
        let err = space
            .bind_method(&ns0(ObjectIds::OBJECTS_FOLDER), adder())
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidNodeClass(_)));
    }
}

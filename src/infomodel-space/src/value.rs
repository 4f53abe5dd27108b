//! Variable value binding, reads, writes and data type changes.
//!
//! Reads and writes never fail across this boundary: every outcome is a
//! [`StatusCode`], carried in the returned [`DataValue`] for reads.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace};

use common_error::{ModelError, ModelResult, ensure};
use infomodel_core::{
    AccessLevel, DataValue, DateTime, NodeClass, NodeId, NumericRange, StatusCode,
    Variant, check_value_rank,
};

use crate::address_space::AddressSpace;
use crate::node::{NodeAttributes, UaNode, ValueBinding};

/// The variable an accessor runs for, with read access to the rest of the
/// address space (for example its sibling properties).
pub struct NodeContext<'a> {
    space: &'a AddressSpace,
    node: &'a UaNode,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(space: &'a AddressSpace, node: &'a UaNode) -> Self {
        Self { space, node }
    }

    /// The variable node.
    pub fn node(&self) -> &'a UaNode {
        self.node
    }

    /// The variable's id.
    pub fn node_id(&self) -> &'a NodeId {
        &self.node.node_id
    }

    /// The owning address space.
    pub fn space(&self) -> &'a AddressSpace {
        self.space
    }

    /// Static value of one of the variable's properties.
    pub fn property_value(&self, name: &str) -> Option<Variant> {
        let property = self.space.property_by_name(&self.node.node_id, name)?;
        let attrs = self.space.node(&property)?.as_variable()?;
        attrs.static_value().map(|v| v.value.clone())
    }
}

/// An external accessor producing a variable's value.
#[async_trait]
pub trait ValueSource: Send + Sync {
    /// Produce the current value.
    async fn read(&self, ctx: &NodeContext<'_>) -> ModelResult<Variant>;

    /// Accept a new value.
    async fn write(&self, _ctx: &NodeContext<'_>, _value: Variant) -> StatusCode {
        StatusCode::BAD_NOT_WRITABLE
    }

    /// Whether `write` is supported.
    fn is_writable(&self) -> bool {
        false
    }
}

type ReadFn = Box<dyn Fn(&NodeContext<'_>) -> ModelResult<Variant> + Send + Sync>;
type WriteFn = Box<dyn Fn(&NodeContext<'_>, Variant) -> StatusCode + Send + Sync>;

/// A [`ValueSource`] made of plain closures.
pub struct FnValueSource {
    read: ReadFn,
    write: Option<WriteFn>,
}

impl FnValueSource {
    /// A read-only source.
    pub fn new(read: impl Fn(&NodeContext<'_>) -> ModelResult<Variant> + Send + Sync + 'static) -> Self {
        Self {
            read: Box::new(read),
            write: None,
        }
    }

    /// Add a setter.
    #[must_use]
    pub fn with_write(
        mut self,
        write: impl Fn(&NodeContext<'_>, Variant) -> StatusCode + Send + Sync + 'static,
    ) -> Self {
        self.write = Some(Box::new(write));
        self
    }
}

#[async_trait]
impl ValueSource for FnValueSource {
    async fn read(&self, ctx: &NodeContext<'_>) -> ModelResult<Variant> {
        (self.read)(ctx)
    }

    async fn write(&self, ctx: &NodeContext<'_>, value: Variant) -> StatusCode {
        match &self.write {
            Some(write) => write(ctx, value),
            None => StatusCode::BAD_NOT_WRITABLE,
        }
    }

    fn is_writable(&self) -> bool {
        self.write.is_some()
    }
}

impl AddressSpace {
    /// Bind `source` as the accessor of a variable.
    pub fn bind_value(&mut self, node_id: &NodeId, source: Arc<dyn ValueSource>) -> ModelResult<()> {
        self.ensure_live()?;
        let attrs = self.variable_mut(node_id)?;
        attrs.value = ValueBinding::Bound(source);
        debug!("Bound value source to {node_id}");
        Ok(())
    }

    /// Replace a variable's value with a static one, dropping any accessor.
    pub fn set_value(&mut self, node_id: &NodeId, value: impl Into<Variant>) -> ModelResult<()> {
        self.ensure_live()?;
        let attrs = self.variable_mut(node_id)?;
        let stamp = attrs.clock.tick();
        attrs.value = ValueBinding::Static(DataValue::new(value).with_source_timestamp(stamp));
        Ok(())
    }

    /// Read a variable's value, optionally restricted to `range`.
    ///
    /// Bound values are stamped with a source timestamp strictly later than
    /// the previous read's. Failures are reported in the status.
    pub async fn read_value(&self, node_id: &NodeId, range: Option<&NumericRange>) -> DataValue {
        match self.try_read_value(node_id, range).await {
            Ok(value) => value,
            Err(err) => {
                trace!("Read of {node_id} failed: {err}");
                DataValue::bad(StatusCode::from(&err)).with_server_timestamp(DateTime::now())
            }
        }
    }

    /// Like [`read_value`](Self::read_value), returning failures as errors.
    pub async fn try_read_value(
        &self,
        node_id: &NodeId,
        range: Option<&NumericRange>,
    ) -> ModelResult<DataValue> {
        self.ensure_live()?;
        let node = self.require_node(node_id)?;
        let mut value = match &node.attributes {
            NodeAttributes::Variable(attrs) => {
                if !attrs.access_level.contains(AccessLevel::CURRENT_READ) {
                    return Ok(DataValue::bad(StatusCode::BAD_NOT_READABLE));
                }
                match &attrs.value {
                    ValueBinding::Static(value) => value.clone(),
                    ValueBinding::Bound(source) => {
                        let source = Arc::clone(source);
                        let ctx = NodeContext::new(self, node);
                        let value = source.read(&ctx).await?;
                        DataValue::new(value).with_source_timestamp(attrs.clock.tick())
                    }
                }
            }
            NodeAttributes::VariableType(attrs) => DataValue::new(attrs.value.clone()),
            _ => {
                return Err(ModelError::invalid_node_class(format!(
                    "{node_id} is a {}, which has no value",
                    node.node_class()
                )));
            }
        };
        if let Some(range) = range {
            value.value = range.apply(&value.value)?;
        }
        Ok(value.with_server_timestamp(DateTime::now()))
    }

    /// Write a variable's value, optionally only the slice `range`.
    ///
    /// The value must match the declared data type and value rank.
    pub async fn write_value(
        &mut self,
        node_id: &NodeId,
        value: DataValue,
        range: Option<&NumericRange>,
    ) -> StatusCode {
        match self.try_write_value(node_id, value, range).await {
            Ok(status) => status,
            Err(err) => {
                trace!("Write of {node_id} failed: {err}");
                StatusCode::from(&err)
            }
        }
    }

    async fn try_write_value(
        &mut self,
        node_id: &NodeId,
        value: DataValue,
        range: Option<&NumericRange>,
    ) -> ModelResult<StatusCode> {
        self.ensure_live()?;
        let node = self.require_node(node_id)?;
        let Some(attrs) = node.as_variable() else {
            return Ok(StatusCode::BAD_NODE_CLASS_INVALID);
        };
        if !attrs.access_level.contains(AccessLevel::CURRENT_WRITE) {
            return Ok(StatusCode::BAD_NOT_WRITABLE);
        }
        let builtin = self.builtin_type_of(&attrs.data_type)?;
        if !value.value.is_assignable_to(builtin) {
            return Ok(StatusCode::BAD_TYPE_MISMATCH);
        }
        if range.is_none()
            && !check_value_rank(&value.value, attrs.value_rank, attrs.array_dimensions.as_deref())
        {
            return Ok(StatusCode::BAD_TYPE_MISMATCH);
        }

        if let ValueBinding::Bound(source) = &attrs.value {
            if !source.is_writable() {
                return Ok(StatusCode::BAD_NOT_WRITABLE);
            }
            if range.is_some() {
                return Ok(StatusCode::BAD_NOT_IMPLEMENTED);
            }
            let source = Arc::clone(source);
            let ctx = NodeContext::new(self, node);
            return Ok(source.write(&ctx, value.value).await);
        }

        let attrs = self.variable_mut(node_id)?;
        let stamp = match value.source_timestamp {
            Some(stamp) => {
                attrs.clock.observe(stamp);
                stamp
            }
            None => attrs.clock.tick(),
        };
        let ValueBinding::Static(current) = &mut attrs.value else {
            return Err(ModelError::internal("binding changed during write"));
        };
        match range {
            Some(range) => range.write_into(&mut current.value, &value.value)?,
            None => current.value = value.value,
        }
        current.status = value.status;
        current.source_timestamp = Some(stamp);
        Ok(StatusCode::GOOD)
    }

    /// Change a variable's declared data type, reinterpreting its static
    /// value under the new type.
    ///
    /// Fails with `UnknownDataType` when `data_type` does not resolve and with
    /// `IncompatibleDataType` when the value cannot be converted. Bound values
    /// are produced by their source and are left alone.
    pub fn change_data_type(&mut self, node_id: &NodeId, data_type: &NodeId) -> ModelResult<()> {
        self.ensure_live()?;
        let builtin = self.builtin_type_of(data_type)?;
        let attrs = self.variable_mut(node_id)?;
        if let ValueBinding::Static(current) = &attrs.value {
            let converted = current.value.cast(builtin)?;
            let stamp = attrs.clock.tick();
            attrs.value = ValueBinding::Static(DataValue {
                value: converted,
                status: current.status,
                source_timestamp: Some(stamp),
                server_timestamp: None,
            });
        }
        attrs.data_type = data_type.clone();
        debug!("Data type of {node_id} is now {data_type}");
        Ok(())
    }

    fn variable_mut(&mut self, node_id: &NodeId) -> ModelResult<&mut crate::node::VariableAttributes> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| ModelError::unknown_node(node_id.to_string()))?;
        let class = node.node_class();
        ensure!(
            class == NodeClass::Variable,
            InvalidNodeClass: "{} is a {}, not a Variable",
            node_id,
            class
        );
        node.as_variable_mut()
            .ok_or_else(|| ModelError::internal("variable without variable attributes"))
    }
}

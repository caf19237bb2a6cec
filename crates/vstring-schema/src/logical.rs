use std::fmt;

use crate::error::LogicalTypeError;
use crate::node::SchemaNode;

/// Schema property naming a node's logical type.
pub const LOGICAL_TYPE_PROP: &str = "logicalType";

/// A logical type layered on a primitive wire type.
///
/// Implementations are bound to one schema node by
/// [`LogicalType::validate_schema`] and are then shared immutably by the
/// parsed schema. Value validation is a capability of every logical type,
/// so conversions dispatch through this trait without downcasting.
pub trait LogicalType: fmt::Debug + Send + Sync {
    /// The annotation name, e.g. `validated-string`.
    fn name(&self) -> &str;

    /// Check that `node` is a valid host for this logical type and bind to it.
    ///
    /// Called by the parser after the node is otherwise well-formed. Must
    /// derive all state from `node` rather than from construction time.
    fn validate_schema(&mut self, node: &SchemaNode) -> Result<(), LogicalTypeError>;

    /// Check an application value against the bound constraint.
    fn validate_value(&self, value: &str) -> Result<(), LogicalTypeError>;

    /// Write this logical type's annotation into `node`.
    fn add_to_schema(&self, mut node: SchemaNode) -> SchemaNode {
        node.set_prop(LOGICAL_TYPE_PROP, self.name());
        node
    }
}

/// Lookup seam the parser uses to turn annotations into logical types.
pub trait LogicalTypeResolver {
    /// Produce a fresh logical type for `node`'s annotation.
    ///
    /// Fails with [`LogicalTypeError::UnknownLogicalType`] when nothing is
    /// registered under the annotation name.
    fn resolve_logical_type(&self, node: &SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError>;
}

/// A resolver that knows no logical types.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLogicalTypes;

impl LogicalTypeResolver for NoLogicalTypes {
    fn resolve_logical_type(&self, node: &SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> {
        Err(LogicalTypeError::UnknownLogicalType(
            node.logical_type_name().unwrap_or_default().to_string(),
        ))
    }
}

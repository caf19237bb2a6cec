use std::fmt;
use std::sync::Arc;

use vstring_schema::{LogicalType, LogicalTypeError, PrimitiveKind, SchemaNode};

/// Bridges a logical type and its primitive wire representation.
///
/// Both directions run the logical type's value validation, so invalid
/// data fails the write or the read rather than crossing the boundary.
pub trait Conversion: fmt::Debug + Send + Sync {
    /// The logical type this conversion serves.
    fn logical_type_name(&self) -> &str;

    /// The primitive category the conversion reads and writes.
    fn primitive(&self) -> PrimitiveKind;

    /// Convert a decoded wire string into the application value.
    fn from_wire(
        &self,
        raw: &str,
        node: &SchemaNode,
        logical_type: &dyn LogicalType,
    ) -> Result<String, LogicalTypeError>;

    /// Convert an application value into its wire string.
    fn to_wire(
        &self,
        value: &str,
        node: &SchemaNode,
        logical_type: &dyn LogicalType,
    ) -> Result<String, LogicalTypeError>;
}

/// Lookup seam the codec uses to find conversions.
pub trait ConversionResolver {
    fn conversion_for(&self, logical_type: &str, primitive: PrimitiveKind) -> Option<Arc<dyn Conversion>>;
}

/// A resolver with no conversions; every value is written raw.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConversions;

impl ConversionResolver for NoConversions {
    fn conversion_for(&self, _logical_type: &str, _primitive: PrimitiveKind) -> Option<Arc<dyn Conversion>> {
        None
    }
}

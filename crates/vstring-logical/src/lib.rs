//! The `validated-string` logical type.
//!
//! A `string` schema node annotated with
//!
//! ```json
//! {"type": "string", "logicalType": "validated-string", "pattern": "^[0-9]{4}-[0-9]{2}$"}
//! ```
//!
//! only accepts values that fully match `pattern`. The constraint is checked
//! when the schema is parsed (the pattern must compile on a string node),
//! when a datum is written, and when a datum is read. Assigning a value to a
//! record field is never checked.
//!
//! Call [`register`] on an [`ExtensionRegistry`] once, before parsing any
//! schema that uses the annotation.

pub mod config;
pub mod conversion;
pub mod pattern;
pub mod registry;
pub mod validated;

use vstring_schema::{LogicalType, SchemaNode};

pub use config::{DuplicatePolicy, RegistryConfig};
pub use conversion::ValidatedStringConversion;
pub use pattern::{PatternCache, PatternRule};
pub use registry::{ExtensionRegistry, LogicalTypeFactory};
pub use validated::{ValidatedStringType, PATTERN_PROP, VALIDATED_STRING};
pub use vstring_schema::LogicalTypeError;

/// Register the `validated-string` factory and conversion.
///
/// Idempotent: registering again leaves exactly one factory and one
/// conversion, chosen by the registry's [`DuplicatePolicy`].
pub fn register(registry: &ExtensionRegistry) {
    let patterns = registry.pattern_cache().clone();
    registry.register_logical_type(VALIDATED_STRING, move |node: &SchemaNode| {
        let logical_type = ValidatedStringType::from_schema_with_cache(node, Some(patterns.clone()))?;
        Ok(Box::new(logical_type) as Box<dyn LogicalType>)
    });
    registry.register_conversion(ValidatedStringConversion);
}

/// Register into [`ExtensionRegistry::global`].
pub fn register_global() -> &'static ExtensionRegistry {
    let registry = ExtensionRegistry::global();
    register(registry);
    registry
}

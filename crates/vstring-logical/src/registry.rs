use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use vstring_datum::{Conversion, ConversionResolver};
use vstring_schema::{LogicalType, LogicalTypeError, LogicalTypeResolver, PrimitiveKind, SchemaNode};

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::pattern::PatternCache;

/// Produces a fresh logical type for an annotated schema node.
pub type LogicalTypeFactory =
    Arc<dyn Fn(&SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> + Send + Sync>;

type ConversionKey = (String, PrimitiveKind);

static GLOBAL: OnceLock<ExtensionRegistry> = OnceLock::new();

/// Name-keyed registry of logical-type factories and conversions.
///
/// Pass a registry to [`vstring_schema::SchemaParser`] as its
/// [`LogicalTypeResolver`] and to the datum codec as its
/// [`ConversionResolver`]. Registration must finish before any schema using
/// the registered names is parsed, and before any datum is encoded or
/// decoded; the registry does not enforce this ordering.
pub struct ExtensionRegistry {
    factories: RwLock<HashMap<String, LogicalTypeFactory>>,
    conversions: RwLock<HashMap<ConversionKey, Arc<dyn Conversion>>>,
    patterns: Arc<PatternCache>,
    config: RegistryConfig,
}

impl ExtensionRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            conversions: RwLock::new(HashMap::new()),
            patterns: Arc::new(PatternCache::new()),
            config,
        }
    }

    /// The process-wide registry.
    ///
    /// Populate it once at startup, before the first parse. Prefer explicit
    /// registries where the caller controls construction.
    pub fn global() -> &'static ExtensionRegistry {
        GLOBAL.get_or_init(ExtensionRegistry::new)
    }

    /// Register a factory for a logical-type name.
    ///
    /// Returns whether the factory was stored; under
    /// [`DuplicatePolicy::Ignore`] a repeated name keeps the first factory.
    pub fn register_logical_type<F>(&self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn(&SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut factories = write(&self.factories);
        let replaced = factories.contains_key(&name);
        if replaced && self.config.on_duplicate == DuplicatePolicy::Ignore {
            debug!(logical_type = %name, "logical type already registered, keeping existing factory");
            return false;
        }

        debug!(logical_type = %name, replaced, "registered logical type");
        factories.insert(name, Arc::new(factory));
        true
    }

    /// Register a conversion under its declared logical type and primitive.
    ///
    /// Returns whether the conversion was stored.
    pub fn register_conversion<C>(&self, conversion: C) -> bool
    where
        C: Conversion + 'static,
    {
        let key = (conversion.logical_type_name().to_string(), conversion.primitive());
        let mut conversions = write(&self.conversions);
        let replaced = conversions.contains_key(&key);
        if replaced && self.config.on_duplicate == DuplicatePolicy::Ignore {
            debug!(logical_type = %key.0, primitive = %key.1, "conversion already registered, keeping existing");
            return false;
        }

        debug!(logical_type = %key.0, primitive = %key.1, replaced, "registered conversion");
        conversions.insert(key, Arc::new(conversion));
        true
    }

    /// Build a fresh logical type for `node`'s annotation.
    pub fn resolve_logical_type(&self, node: &SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> {
        let name = node.logical_type_name().unwrap_or_default();
        // Clone the factory out so it runs without holding the lock.
        let factory = read(&self.factories)
            .get(name)
            .cloned()
            .ok_or_else(|| LogicalTypeError::UnknownLogicalType(name.to_string()))?;
        factory(node)
    }

    /// The conversion registered for a logical type on a primitive, if any.
    pub fn conversion_for(&self, logical_type: &str, primitive: PrimitiveKind) -> Option<Arc<dyn Conversion>> {
        read(&self.conversions)
            .get(&(logical_type.to_string(), primitive))
            .cloned()
    }

    /// Check if a logical-type name has a registered factory.
    pub fn has_logical_type(&self, name: &str) -> bool {
        read(&self.factories).contains_key(name)
    }

    /// Get registered logical-type names, sorted.
    pub fn logical_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.factories).keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn conversion_count(&self) -> usize {
        read(&self.conversions).len()
    }

    /// Compiled-pattern cache shared by the factories of this registry.
    pub fn pattern_cache(&self) -> &Arc<PatternCache> {
        &self.patterns
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("logical_types", &self.logical_type_names())
            .field("conversions", &self.conversion_count())
            .field("config", &self.config)
            .finish()
    }
}

impl LogicalTypeResolver for ExtensionRegistry {
    fn resolve_logical_type(&self, node: &SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> {
        ExtensionRegistry::resolve_logical_type(self, node)
    }
}

impl ConversionResolver for ExtensionRegistry {
    fn conversion_for(&self, logical_type: &str, primitive: PrimitiveKind) -> Option<Arc<dyn Conversion>> {
        ExtensionRegistry::conversion_for(self, logical_type, primitive)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use vstring_schema::LOGICAL_TYPE_PROP;

    use super::*;
    use crate::conversion::ValidatedStringConversion;
    use crate::validated::{ValidatedStringType, PATTERN_PROP, VALIDATED_STRING};

    fn annotated(pattern: &str) -> SchemaNode {
        SchemaNode::new(PrimitiveKind::String)
            .with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING)
            .with_prop(PATTERN_PROP, pattern)
    }

    fn from_schema(node: &SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> {
        Ok(Box::new(ValidatedStringType::from_schema(node)?))
    }

    fn always_unbound(_node: &SchemaNode) -> Result<Box<dyn LogicalType>, LogicalTypeError> {
        Ok(Box::new(ValidatedStringType::unbound()))
    }

    #[test]
    fn resolve_unknown_fails() {
        let registry = ExtensionRegistry::new();
        assert!(matches!(
            registry.resolve_logical_type(&annotated("^a$")),
            Err(LogicalTypeError::UnknownLogicalType(ref name)) if name == VALIDATED_STRING
        ));
    }

    #[test]
    fn resolve_produces_fresh_instances() {
        let registry = ExtensionRegistry::new();
        registry.register_logical_type(VALIDATED_STRING, from_schema);

        let first = registry.resolve_logical_type(&annotated("^a+$")).unwrap();
        let second = registry.resolve_logical_type(&annotated("^b+$")).unwrap();

        assert!(first.validate_value("aaa").is_ok());
        assert!(first.validate_value("bbb").is_err());
        assert!(second.validate_value("bbb").is_ok());
    }

    #[test]
    fn resolve_propagates_factory_errors() {
        let registry = ExtensionRegistry::new();
        registry.register_logical_type(VALIDATED_STRING, from_schema);

        let bare = SchemaNode::new(PrimitiveKind::String).with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING);
        assert!(matches!(
            registry.resolve_logical_type(&bare),
            Err(LogicalTypeError::MissingProperty { .. })
        ));
    }

    #[test]
    fn replace_policy_keeps_latest_registration() {
        let registry = ExtensionRegistry::new();
        assert!(registry.register_logical_type(VALIDATED_STRING, always_unbound));
        assert!(registry.register_logical_type(VALIDATED_STRING, from_schema));

        assert_eq!(registry.logical_type_names(), vec![VALIDATED_STRING.to_string()]);
        let resolved = registry.resolve_logical_type(&annotated("^a$")).unwrap();
        assert!(resolved.validate_value("a").is_ok());
    }

    #[test]
    fn ignore_policy_keeps_first_registration() {
        let registry = ExtensionRegistry::with_config(RegistryConfig {
            on_duplicate: DuplicatePolicy::Ignore,
        });
        assert!(registry.register_logical_type(VALIDATED_STRING, always_unbound));
        assert!(!registry.register_logical_type(VALIDATED_STRING, from_schema));
        assert!(registry.register_conversion(ValidatedStringConversion));
        assert!(!registry.register_conversion(ValidatedStringConversion));

        assert_eq!(registry.logical_type_names().len(), 1);
        assert_eq!(registry.conversion_count(), 1);
        let resolved = registry.resolve_logical_type(&annotated("^a$")).unwrap();
        assert!(matches!(
            resolved.validate_value("a"),
            Err(LogicalTypeError::IllegalState { .. })
        ));
    }

    #[test]
    fn conversions_keyed_by_declared_primitive() {
        let registry = ExtensionRegistry::new();
        registry.register_conversion(ValidatedStringConversion);
        registry.register_conversion(ValidatedStringConversion);

        assert_eq!(registry.conversion_count(), 1);
        assert!(registry
            .conversion_for(VALIDATED_STRING, PrimitiveKind::String)
            .is_some());
        assert!(registry
            .conversion_for(VALIDATED_STRING, PrimitiveKind::Bytes)
            .is_none());
        assert!(registry.conversion_for("uuid", PrimitiveKind::String).is_none());
    }

    #[test]
    fn debug_lists_names() {
        let registry = ExtensionRegistry::new();
        registry.register_logical_type(VALIDATED_STRING, from_schema);
        let rendered = format!("{registry:?}");
        assert!(rendered.contains(VALIDATED_STRING));
        assert_eq!(registry.config(), &RegistryConfig::default());
        assert!(registry.has_logical_type(VALIDATED_STRING));
        assert!(!registry.has_logical_type("uuid"));
    }
}

use std::sync::Arc;

use serde_json::Value as JsonValue;
use vstring_schema::{LogicalType, LogicalTypeError, PrimitiveKind, SchemaNode, LOGICAL_TYPE_PROP};

use crate::pattern::{PatternCache, PatternRule};

/// Logical-type name of the regex-validated string.
pub const VALIDATED_STRING: &str = "validated-string";

/// Schema property holding the pattern source.
pub const PATTERN_PROP: &str = "pattern";

#[derive(Debug, Clone, Default, PartialEq)]
enum Binding {
    #[default]
    Unbound,
    Bound(PatternRule),
    Failed,
}

/// The `validated-string` logical type: a string whose values must fully
/// match the pattern declared on its schema node.
///
/// Binding lifecycle:
///
/// ```text
/// Unbound --validate_schema ok--> Bound --validate_schema ok (any node)--> Bound
///    any validate_schema failure --> Failed (terminal)
/// ```
///
/// `validate_schema` always re-derives the pattern from the node it is
/// given, so the bound pattern is exactly the node's `pattern` property.
#[derive(Debug, Clone, Default)]
pub struct ValidatedStringType {
    binding: Binding,
    cache: Option<Arc<PatternCache>>,
}

impl ValidatedStringType {
    /// An instance with no pattern; it must validate a schema node before
    /// it can validate values.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// An instance bound to `source` directly, for building schemas in code.
    pub fn from_pattern(source: &str) -> Result<Self, LogicalTypeError> {
        Ok(Self {
            binding: Binding::Bound(PatternRule::compile(source)?),
            cache: None,
        })
    }

    /// An instance bound to the `pattern` property of `node`.
    pub fn from_schema(node: &SchemaNode) -> Result<Self, LogicalTypeError> {
        Self::from_schema_with_cache(node, None)
    }

    /// Like [`ValidatedStringType::from_schema`], compiling through a shared
    /// pattern cache. Later rebinding uses the same cache.
    pub fn from_schema_with_cache(
        node: &SchemaNode,
        cache: Option<Arc<PatternCache>>,
    ) -> Result<Self, LogicalTypeError> {
        let mut logical_type = Self {
            binding: Binding::Unbound,
            cache,
        };
        let rule = logical_type.compile(read_pattern(node)?)?;
        logical_type.binding = Binding::Bound(rule);
        Ok(logical_type)
    }

    /// The bound pattern, if schema validation has succeeded.
    pub fn pattern(&self) -> Option<&PatternRule> {
        match &self.binding {
            Binding::Bound(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.binding, Binding::Failed)
    }

    /// Annotate `node` with this logical type and its pattern, and attach
    /// this instance so the codec validates values written against it.
    ///
    /// Fails on a non-string node or an instance with no pattern.
    pub fn bind_to_schema_node(&self, node: SchemaNode) -> Result<SchemaNode, LogicalTypeError> {
        check_kind(&node)?;
        match &self.binding {
            Binding::Bound(_) => Ok(self.add_to_schema(node)),
            Binding::Unbound => Err(illegal_state("no pattern to bind")),
            Binding::Failed => Err(illegal_state("schema validation failed")),
        }
    }

    fn compile(&self, source: &str) -> Result<PatternRule, LogicalTypeError> {
        match &self.cache {
            Some(cache) => cache.get_or_compile(source),
            None => PatternRule::compile(source),
        }
    }

    fn bind(&self, node: &SchemaNode) -> Result<PatternRule, LogicalTypeError> {
        check_kind(node)?;

        match node.logical_type_name() {
            Some(VALIDATED_STRING) => {}
            other => {
                return Err(LogicalTypeError::WrongLogicalType {
                    expected: VALIDATED_STRING.to_string(),
                    found: other.map(str::to_string),
                })
            }
        }

        self.compile(read_pattern(node)?)
    }
}

impl LogicalType for ValidatedStringType {
    fn name(&self) -> &str {
        VALIDATED_STRING
    }

    fn validate_schema(&mut self, node: &SchemaNode) -> Result<(), LogicalTypeError> {
        if self.is_failed() {
            return Err(illegal_state("an earlier schema validation failed"));
        }

        match self.bind(node) {
            Ok(rule) => {
                self.binding = Binding::Bound(rule);
                Ok(())
            }
            Err(err) => {
                self.binding = Binding::Failed;
                Err(err)
            }
        }
    }

    fn validate_value(&self, value: &str) -> Result<(), LogicalTypeError> {
        match &self.binding {
            Binding::Bound(rule) if rule.matches(value) => Ok(()),
            Binding::Bound(_) => Err(LogicalTypeError::Validation {
                value: value.to_string(),
            }),
            Binding::Unbound => Err(illegal_state("no schema node has been validated")),
            Binding::Failed => Err(illegal_state("schema validation failed")),
        }
    }

    fn add_to_schema(&self, mut node: SchemaNode) -> SchemaNode {
        node.set_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING);
        if let Binding::Bound(rule) = &self.binding {
            node.set_prop(PATTERN_PROP, rule.source());
            if node.kind() == PrimitiveKind::String {
                node.set_logical_type(Arc::new(self.clone()));
            }
        }
        node
    }
}

fn check_kind(node: &SchemaNode) -> Result<(), LogicalTypeError> {
    if node.kind() == PrimitiveKind::String {
        return Ok(());
    }
    Err(LogicalTypeError::TypeMismatch {
        logical_type: VALIDATED_STRING.to_string(),
        expected: PrimitiveKind::String,
        found: node.kind(),
    })
}

fn read_pattern(node: &SchemaNode) -> Result<&str, LogicalTypeError> {
    match node.prop(PATTERN_PROP) {
        None => Err(LogicalTypeError::MissingProperty {
            logical_type: VALIDATED_STRING.to_string(),
            property: PATTERN_PROP.to_string(),
        }),
        Some(JsonValue::String(source)) if !source.is_empty() => Ok(source),
        Some(other) => Err(LogicalTypeError::InvalidPattern {
            logical_type: VALIDATED_STRING.to_string(),
            found: other.to_string(),
        }),
    }
}

fn illegal_state(reason: &'static str) -> LogicalTypeError {
    LogicalTypeError::IllegalState {
        logical_type: VALIDATED_STRING.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_PATTERN: &str = "^[0-9]{4}-[0-9]{2}$";
    const SSN_PATTERN: &str = "^[0-9]{3}-[0-9]{2}-[0-9]{4}$";

    fn node(pattern: &str) -> SchemaNode {
        SchemaNode::new(PrimitiveKind::String)
            .with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING)
            .with_prop(PATTERN_PROP, pattern)
    }

    #[test]
    fn from_schema_binds_declared_pattern() {
        let logical_type = ValidatedStringType::from_schema(&node(SESSION_PATTERN)).unwrap();
        assert_eq!(logical_type.pattern().unwrap().source(), SESSION_PATTERN);
        assert!(logical_type.validate_value("1234-56").is_ok());
    }

    #[test]
    fn from_schema_requires_pattern() {
        let bare = SchemaNode::new(PrimitiveKind::String).with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING);
        assert!(matches!(
            ValidatedStringType::from_schema(&bare),
            Err(LogicalTypeError::MissingProperty { ref property, .. }) if property == PATTERN_PROP
        ));
    }

    #[test]
    fn from_schema_rejects_bad_regex() {
        assert!(matches!(
            ValidatedStringType::from_schema(&node("[0-9")),
            Err(LogicalTypeError::PatternCompile { .. })
        ));
    }

    #[test]
    fn session_scenario() {
        let mut logical_type = ValidatedStringType::unbound();
        logical_type.validate_schema(&node(SESSION_PATTERN)).unwrap();

        assert!(logical_type.validate_value("1234-56").is_ok());
        let err = logical_type.validate_value("1234-aa").unwrap_err();
        assert_eq!(
            err,
            LogicalTypeError::Validation {
                value: "1234-aa".into()
            }
        );
        assert_eq!(err.to_string(), "invalid string: 1234-aa");
    }

    #[test]
    fn ssn_scenario() {
        let logical_type = ValidatedStringType::from_schema(&node(SSN_PATTERN)).unwrap();
        assert!(logical_type.validate_value("123-45-6789").is_ok());
        assert!(logical_type.validate_value("123-45-678a").is_err());
        assert!(logical_type.validate_value("123-45-67890").is_err());
    }

    #[test]
    fn unbound_value_validation_is_illegal() {
        let logical_type = ValidatedStringType::unbound();
        assert!(!logical_type.is_bound());
        assert!(matches!(
            logical_type.validate_value("anything"),
            Err(LogicalTypeError::IllegalState { .. })
        ));
    }

    #[test]
    fn rebinding_follows_the_node_under_validation() {
        let mut logical_type = ValidatedStringType::unbound();
        logical_type.validate_schema(&node(SESSION_PATTERN)).unwrap();
        assert!(logical_type.validate_value("1234-56").is_ok());

        logical_type.validate_schema(&node(SSN_PATTERN)).unwrap();
        assert_eq!(logical_type.pattern().unwrap().source(), SSN_PATTERN);
        assert!(logical_type.validate_value("123-45-6789").is_ok());
        assert!(logical_type.validate_value("1234-56").is_err());
    }

    #[test]
    fn schema_validation_rejects_non_string() {
        let long_node = SchemaNode::new(PrimitiveKind::Long)
            .with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING)
            .with_prop(PATTERN_PROP, SESSION_PATTERN);
        let mut logical_type = ValidatedStringType::unbound();

        assert!(matches!(
            logical_type.validate_schema(&long_node),
            Err(LogicalTypeError::TypeMismatch {
                expected: PrimitiveKind::String,
                found: PrimitiveKind::Long,
                ..
            })
        ));
        assert!(logical_type.is_failed());
    }

    #[test]
    fn schema_validation_checks_pattern_property() {
        let missing = SchemaNode::new(PrimitiveKind::String).with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING);
        assert!(matches!(
            ValidatedStringType::unbound().validate_schema(&missing),
            Err(LogicalTypeError::MissingProperty { .. })
        ));

        assert!(matches!(
            ValidatedStringType::unbound().validate_schema(&node("")),
            Err(LogicalTypeError::InvalidPattern { .. })
        ));

        let numeric = SchemaNode::new(PrimitiveKind::String)
            .with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING)
            .with_prop(PATTERN_PROP, 42);
        assert!(matches!(
            ValidatedStringType::unbound().validate_schema(&numeric),
            Err(LogicalTypeError::InvalidPattern { ref found, .. }) if found == "42"
        ));

        assert!(matches!(
            ValidatedStringType::unbound().validate_schema(&node("(")),
            Err(LogicalTypeError::PatternCompile { .. })
        ));
    }

    #[test]
    fn schema_validation_checks_logical_type_name() {
        let other = SchemaNode::new(PrimitiveKind::String)
            .with_prop(LOGICAL_TYPE_PROP, "uuid")
            .with_prop(PATTERN_PROP, SESSION_PATTERN);
        assert!(matches!(
            ValidatedStringType::unbound().validate_schema(&other),
            Err(LogicalTypeError::WrongLogicalType { found: Some(ref name), .. }) if name == "uuid"
        ));
    }

    #[test]
    fn failed_state_is_terminal() {
        let mut logical_type = ValidatedStringType::unbound();
        assert!(logical_type.validate_schema(&node("[")).is_err());

        assert!(matches!(
            logical_type.validate_schema(&node(SESSION_PATTERN)),
            Err(LogicalTypeError::IllegalState { .. })
        ));
        assert!(matches!(
            logical_type.validate_value("1234-56"),
            Err(LogicalTypeError::IllegalState { .. })
        ));
    }

    #[test]
    fn bound_instance_fails_after_bad_rebind() {
        let mut logical_type = ValidatedStringType::from_schema(&node(SESSION_PATTERN)).unwrap();
        assert!(logical_type.validate_schema(&node("")).is_err());
        assert!(logical_type.pattern().is_none());
        assert!(logical_type.validate_value("1234-56").is_err());
    }

    #[test]
    fn bind_to_schema_node_writes_annotation() {
        let logical_type = ValidatedStringType::from_pattern(SSN_PATTERN).unwrap();
        let annotated = logical_type
            .bind_to_schema_node(SchemaNode::new(PrimitiveKind::String))
            .unwrap();

        assert_eq!(annotated.logical_type_name(), Some(VALIDATED_STRING));
        assert_eq!(annotated.prop_str(PATTERN_PROP), Some(SSN_PATTERN));
        let attached = annotated.logical_type().unwrap();
        assert!(attached.validate_value("123-45-6789").is_ok());
        assert!(attached.validate_value("123-45-678a").is_err());

        let mut rebound = ValidatedStringType::unbound();
        rebound.validate_schema(&annotated).unwrap();
        assert_eq!(rebound.pattern(), logical_type.pattern());
    }

    #[test]
    fn bind_to_schema_node_rejects_non_string_and_unbound() {
        let logical_type = ValidatedStringType::from_pattern(SSN_PATTERN).unwrap();
        assert!(matches!(
            logical_type.bind_to_schema_node(SchemaNode::new(PrimitiveKind::Int)),
            Err(LogicalTypeError::TypeMismatch {
                found: PrimitiveKind::Int,
                ..
            })
        ));
        assert!(matches!(
            ValidatedStringType::unbound().bind_to_schema_node(SchemaNode::new(PrimitiveKind::String)),
            Err(LogicalTypeError::IllegalState { .. })
        ));
    }

    #[test]
    fn unbound_instance_only_writes_name() {
        let annotated = ValidatedStringType::unbound().add_to_schema(SchemaNode::new(PrimitiveKind::String));
        assert_eq!(annotated.logical_type_name(), Some(VALIDATED_STRING));
        assert!(annotated.prop(PATTERN_PROP).is_none());
        assert!(annotated.logical_type().is_none());
    }

    #[test]
    fn shared_cache_reuses_compiled_rules() {
        let cache = Arc::new(PatternCache::new());
        let first = ValidatedStringType::from_schema_with_cache(&node(SSN_PATTERN), Some(cache.clone())).unwrap();
        let mut second = ValidatedStringType::from_schema_with_cache(&node(SSN_PATTERN), Some(cache.clone())).unwrap();
        second.validate_schema(&node(SESSION_PATTERN)).unwrap();

        assert_eq!(first.pattern().unwrap().source(), SSN_PATTERN);
        assert_eq!(cache.len(), 2);
    }
}

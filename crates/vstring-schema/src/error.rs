use crate::node::PrimitiveKind;

/// Errors raised by a logical type while binding to a schema node or
/// validating a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicalTypeError {
    /// The pattern source is not a valid regular expression.
    #[error("invalid regular expression {pattern:?}: {message}")]
    PatternCompile { pattern: String, message: String },

    /// The schema node lacks a property the logical type requires.
    #[error("invalid {logical_type}: missing {property}")]
    MissingProperty {
        logical_type: String,
        property: String,
    },

    /// The pattern property is present but empty or not a string.
    #[error("invalid {logical_type} pattern: {found} (must be a regular expression)")]
    InvalidPattern { logical_type: String, found: String },

    /// The logical type annotates a primitive it cannot be backed by.
    #[error("logical type {logical_type} must be backed by {expected}, found {found}")]
    TypeMismatch {
        logical_type: String,
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    /// The node's `logicalType` property names a different logical type.
    #[error("expected logicalType {expected}, found {}", found.as_deref().unwrap_or("none"))]
    WrongLogicalType {
        expected: String,
        found: Option<String>,
    },

    /// A value does not satisfy the logical type's constraint.
    #[error("invalid string: {value}")]
    Validation { value: String },

    /// No factory is registered for the annotation name.
    #[error("unknown logical type: {0}")]
    UnknownLogicalType(String),

    /// The logical type was used before a successful schema validation.
    #[error("logical type {logical_type} is not usable: {reason}")]
    IllegalState {
        logical_type: String,
        reason: &'static str,
    },
}

/// Errors that can occur while parsing a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema document is not valid JSON.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The document is JSON but not a well-formed schema.
    #[error("malformed schema: {0}")]
    Malformed(String),

    /// The schema uses a construct outside the supported subset.
    #[error("unsupported schema construct: {0}")]
    Unsupported(String),

    /// A record declares the same field twice.
    #[error("record {record} declares field {field} more than once")]
    DuplicateField { record: String, field: String },

    /// A logical-type annotation was rejected.
    #[error(transparent)]
    LogicalType(#[from] LogicalTypeError),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

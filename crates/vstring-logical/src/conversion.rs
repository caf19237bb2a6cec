use vstring_datum::Conversion;
use vstring_schema::{LogicalType, LogicalTypeError, PrimitiveKind, SchemaNode};

use crate::validated::VALIDATED_STRING;

/// Conversion between wire strings and `validated-string` values.
///
/// Both directions validate through the node's bound logical type, so an
/// invalid value fails the write before encoding and fails the read before
/// it reaches the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedStringConversion;

impl Conversion for ValidatedStringConversion {
    fn logical_type_name(&self) -> &str {
        VALIDATED_STRING
    }

    fn primitive(&self) -> PrimitiveKind {
        PrimitiveKind::String
    }

    fn from_wire(
        &self,
        raw: &str,
        _node: &SchemaNode,
        logical_type: &dyn LogicalType,
    ) -> Result<String, LogicalTypeError> {
        let value = raw.to_string();
        logical_type.validate_value(&value)?;
        Ok(value)
    }

    fn to_wire(
        &self,
        value: &str,
        _node: &SchemaNode,
        logical_type: &dyn LogicalType,
    ) -> Result<String, LogicalTypeError> {
        logical_type.validate_value(value)?;
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use vstring_schema::LOGICAL_TYPE_PROP;

    use super::*;
    use crate::validated::{ValidatedStringType, PATTERN_PROP};

    fn session_node() -> SchemaNode {
        SchemaNode::new(PrimitiveKind::String)
            .with_prop(LOGICAL_TYPE_PROP, VALIDATED_STRING)
            .with_prop(PATTERN_PROP, "^[0-9]{4}-[0-9]{2}$")
    }

    #[test]
    fn declares_string_category() {
        let conversion = ValidatedStringConversion;
        assert_eq!(conversion.logical_type_name(), VALIDATED_STRING);
        assert_eq!(conversion.primitive(), PrimitiveKind::String);
    }

    #[test]
    fn both_directions_validate() {
        let node = session_node();
        let logical_type = ValidatedStringType::from_schema(&node).unwrap();
        let conversion = ValidatedStringConversion;

        let wire = conversion.to_wire("1234-56", &node, &logical_type).unwrap();
        assert_eq!(conversion.from_wire(&wire, &node, &logical_type).unwrap(), "1234-56");

        assert_eq!(
            conversion.to_wire("1234-aa", &node, &logical_type).unwrap_err().to_string(),
            "invalid string: 1234-aa"
        );
        assert!(matches!(
            conversion.from_wire("12-3456", &node, &logical_type),
            Err(LogicalTypeError::Validation { ref value }) if value == "12-3456"
        ));
    }

    #[test]
    fn unbound_logical_type_is_rejected() {
        let node = session_node();
        let result = ValidatedStringConversion.to_wire("1234-56", &node, &ValidatedStringType::unbound());
        assert!(matches!(result, Err(LogicalTypeError::IllegalState { .. })));
    }
}

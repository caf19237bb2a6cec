use serde_json::{Number, Value as JsonValue};
use vstring_schema::{PrimitiveKind, Schema};

use crate::record::GenericRecord;

/// A generic datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Record(GenericRecord),
}

impl Value {
    /// Short description used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(_) => "boolean".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Bytes(_) => "bytes".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Record(record) => record.schema().full_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&GenericRecord> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Render the datum as JSON for display.
    ///
    /// Bytes map each byte to one code point; non-finite floats become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(value) => JsonValue::Bool(*value),
            Value::Int(value) => JsonValue::from(*value),
            Value::Long(value) => JsonValue::from(*value),
            Value::Float(value) => float_json(f64::from(*value)),
            Value::Double(value) => float_json(*value),
            Value::Bytes(bytes) => JsonValue::String(bytes.iter().map(|b| char::from(*b)).collect()),
            Value::String(value) => JsonValue::String(value.clone()),
            Value::Record(record) => record.to_json(),
        }
    }

    /// Interpret a schema `default` for a field of type `schema`.
    ///
    /// A union default applies to the union's first branch.
    pub fn from_default(schema: &Schema, default: &JsonValue) -> Option<Value> {
        match schema {
            Schema::Union(branches) => Value::from_default(branches.first()?, default),
            Schema::Record(record) => {
                let object = default.as_object()?;
                let mut values = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let raw = object.get(&field.name).or(field.default.as_ref())?;
                    values.push(Value::from_default(&field.schema, raw)?);
                }
                Some(Value::Record(GenericRecord::from_parts(record.clone(), values)))
            }
            Schema::Primitive(node) => match (node.kind(), default) {
                (PrimitiveKind::Null, JsonValue::Null) => Some(Value::Null),
                (PrimitiveKind::Boolean, JsonValue::Bool(value)) => Some(Value::Boolean(*value)),
                (PrimitiveKind::Int, JsonValue::Number(n)) => {
                    n.as_i64().and_then(|v| i32::try_from(v).ok()).map(Value::Int)
                }
                (PrimitiveKind::Long, JsonValue::Number(n)) => n.as_i64().map(Value::Long),
                (PrimitiveKind::Float, JsonValue::Number(n)) => n.as_f64().map(|v| Value::Float(v as f32)),
                (PrimitiveKind::Double, JsonValue::Number(n)) => n.as_f64().map(Value::Double),
                (PrimitiveKind::Bytes, JsonValue::String(s)) => s
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)).ok())
                    .collect::<Option<Vec<u8>>>()
                    .map(Value::Bytes),
                (PrimitiveKind::String, JsonValue::String(s)) => Some(Value::String(s.clone())),
                _ => None,
            },
        }
    }
}

fn float_json(value: f64) -> JsonValue {
    Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<GenericRecord> for Value {
    fn from(value: GenericRecord) -> Self {
        Value::Record(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vstring_schema::{NoLogicalTypes, SchemaParser};

    use super::*;

    fn parse(schema: &str) -> Schema {
        SchemaParser::new(&NoLogicalTypes).parse_str(schema).unwrap()
    }

    #[test]
    fn defaults_follow_field_types() {
        assert_eq!(Value::from_default(&parse(r#""int""#), &json!(30)), Some(Value::Int(30)));
        assert_eq!(Value::from_default(&parse(r#""int""#), &json!(1_i64 << 40)), None);
        assert_eq!(Value::from_default(&parse(r#""string""#), &json!("x")), Some(Value::from("x")));
        assert_eq!(
            Value::from_default(&parse(r#""bytes""#), &json!("\u{00ff}a")),
            Some(Value::Bytes(vec![0xff, b'a']))
        );
        assert_eq!(Value::from_default(&parse(r#""bytes""#), &json!("\u{0100}")), None);
        assert_eq!(Value::from_default(&parse(r#""boolean""#), &json!("true")), None);
    }

    #[test]
    fn union_default_applies_to_first_branch() {
        let schema = parse(r#"["null", "string"]"#);
        assert_eq!(Value::from_default(&schema, &json!(null)), Some(Value::Null));
        assert_eq!(Value::from_default(&schema, &json!("x")), None);
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some(5_i64)), Value::Long(5));
    }

    #[test]
    fn json_rendering() {
        assert_eq!(Value::Double(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(Value::Bytes(b"hi".to_vec()).to_json(), json!("hi"));
        assert_eq!(Value::Long(-3).to_json(), json!(-3));
    }
}

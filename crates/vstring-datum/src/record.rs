use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use vstring_schema::{RecordSchema, Schema};

use crate::error::{DatumError, Result};
use crate::value::Value;

/// A record bound to its schema.
///
/// Field assignment only checks that the field exists. Logical-type
/// constraints are enforced when the record is encoded or decoded, so a
/// record may hold values its schema would reject on the wire.
#[derive(Debug, Clone)]
pub struct GenericRecord {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl GenericRecord {
    /// Create a record with every field set to null.
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let values = vec![Value::Null; schema.fields.len()];
        Self { schema, values }
    }

    /// Create a record for a parsed schema, which must be a record schema.
    pub fn for_schema(schema: &Schema) -> Result<Self> {
        match schema {
            Schema::Record(record) => Ok(Self::new(record.clone())),
            other => Err(DatumError::TypeMismatch {
                expected: "record".to_string(),
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn from_parts(schema: Arc<RecordSchema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Set a field by name.
    pub fn put(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(name)?;
        self.values[index] = value.into();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.field_index(name)?;
        self.values.get(index)
    }

    /// Field values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.values.len());
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            map.insert(field.name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.schema
            .field_index(name)
            .ok_or_else(|| DatumError::UnknownField {
                record: self.schema.full_name(),
                field: name.to_string(),
            })
    }
}

impl PartialEq for GenericRecord {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema)
            || self.schema.full_name() == other.schema.full_name())
            && self.values == other.values
    }
}

impl fmt::Display for GenericRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Builds a record, filling unset fields from schema defaults.
///
/// Like [`GenericRecord::put`], building never runs logical-type validation.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    schema: Arc<RecordSchema>,
    values: Vec<Option<Value>>,
}

impl RecordBuilder {
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let values = vec![None; schema.fields.len()];
        Self { schema, values }
    }

    /// Set a field by name.
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        let index = self
            .schema
            .field_index(name)
            .ok_or_else(|| DatumError::UnknownField {
                record: self.schema.full_name(),
                field: name.to_string(),
            })?;
        self.values[index] = Some(value.into());
        Ok(self)
    }

    /// Whether a field has been set explicitly.
    pub fn has(&self, name: &str) -> bool {
        self.schema
            .field_index(name)
            .is_some_and(|index| self.values[index].is_some())
    }

    pub fn build(self) -> Result<GenericRecord> {
        let mut values = Vec::with_capacity(self.values.len());
        for (field, value) in self.schema.fields.iter().zip(self.values) {
            let value = match (value, &field.default) {
                (Some(value), _) => value,
                (None, Some(default)) => Value::from_default(&field.schema, default).ok_or_else(|| {
                    DatumError::InvalidDefault {
                        record: self.schema.full_name(),
                        field: field.name.clone(),
                    }
                })?,
                (None, None) => {
                    return Err(DatumError::MissingField {
                        record: self.schema.full_name(),
                        field: field.name.clone(),
                    })
                }
            };
            values.push(value);
        }
        Ok(GenericRecord::from_parts(self.schema, values))
    }
}

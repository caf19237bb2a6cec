use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::error::{LogicalTypeError, Result, SchemaError};
use crate::logical::{LogicalTypeResolver, LOGICAL_TYPE_PROP};
use crate::node::{Field, PrimitiveKind, RecordSchema, Schema, SchemaNode};

/// Parses schema documents, resolving logical-type annotations through a
/// [`LogicalTypeResolver`].
pub struct SchemaParser<'a> {
    resolver: &'a dyn LogicalTypeResolver,
    config: ParserConfig,
}

impl<'a> SchemaParser<'a> {
    /// Create a parser with default config.
    pub fn new(resolver: &'a dyn LogicalTypeResolver) -> Self {
        Self::with_config(resolver, ParserConfig::default())
    }

    /// Create a parser with explicit config.
    pub fn with_config(resolver: &'a dyn LogicalTypeResolver, config: ParserConfig) -> Self {
        Self { resolver, config }
    }

    /// Parse a schema from a JSON string.
    pub fn parse_str(&self, schema_json: &str) -> Result<Schema> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.parse_value(&schema)
    }

    /// Parse a schema from a JSON value.
    pub fn parse_value(&self, schema: &Value) -> Result<Schema> {
        match schema {
            Value::String(name) => parse_type_name(name),
            Value::Array(branches) => self.parse_union(branches),
            Value::Object(map) => self.parse_object(map),
            other => Err(SchemaError::Malformed(format!(
                "expected a type name, object or union, found {other}"
            ))),
        }
    }

    /// Get parser configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse_object(&self, map: &Map<String, Value>) -> Result<Schema> {
        let type_value = map
            .get("type")
            .ok_or_else(|| SchemaError::Malformed("schema object has no type".to_string()))?;

        let type_name = match type_value {
            Value::String(type_name) => type_name,
            Value::Array(_) | Value::Object(_) => return self.parse_value(type_value),
            other => {
                return Err(SchemaError::Malformed(format!(
                    "type must be a string, object or union, found {other}"
                )))
            }
        };

        if let Some(kind) = PrimitiveKind::from_name(type_name) {
            return self.parse_primitive(kind, map);
        }

        match type_name.as_str() {
            "record" => self.parse_record(map),
            "enum" | "array" | "map" | "fixed" | "error" => {
                Err(SchemaError::Unsupported(type_name.clone()))
            }
            other => Err(SchemaError::Unsupported(format!(
                "named type reference {other}"
            ))),
        }
    }

    fn parse_primitive(&self, kind: PrimitiveKind, map: &Map<String, Value>) -> Result<Schema> {
        let mut node = SchemaNode::new(kind);
        for (key, value) in map {
            if key != "type" {
                node.set_prop(key.clone(), value.clone());
            }
        }

        if node.prop(LOGICAL_TYPE_PROP).is_some() {
            self.attach_logical_type(&mut node)?;
        }

        Ok(Schema::Primitive(node))
    }

    fn attach_logical_type(&self, node: &mut SchemaNode) -> Result<()> {
        if node.logical_type_name().is_none() {
            return Err(SchemaError::Malformed(format!(
                "{LOGICAL_TYPE_PROP} must be a string"
            )));
        }

        let mut logical_type = match self.resolver.resolve_logical_type(node) {
            Ok(logical_type) => logical_type,
            Err(LogicalTypeError::UnknownLogicalType(name)) if !self.config.strict_logical_types => {
                debug!(logical_type = %name, kind = %node.kind(), "ignoring unregistered logical type");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        logical_type.validate_schema(node)?;
        trace!(logical_type = logical_type.name(), "bound logical type to schema node");
        node.set_logical_type(Arc::from(logical_type));
        Ok(())
    }

    fn parse_record(&self, map: &Map<String, Value>) -> Result<Schema> {
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::Malformed("record requires a string name".to_string()))?;
        let namespace = optional_string(map, "namespace");
        let doc = optional_string(map, "doc");

        let raw_fields = map
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::Malformed(format!("record {name} requires a fields array")))?;

        let mut seen = HashSet::with_capacity(raw_fields.len());
        let mut fields = Vec::with_capacity(raw_fields.len());
        for raw in raw_fields {
            let field = self.parse_field(name, raw)?;
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    record: name.to_string(),
                    field: field.name,
                });
            }
            fields.push(field);
        }

        Ok(Schema::Record(Arc::new(RecordSchema {
            name: name.to_string(),
            namespace,
            doc,
            fields,
        })))
    }

    fn parse_field(&self, record: &str, raw: &Value) -> Result<Field> {
        let map = raw.as_object().ok_or_else(|| {
            SchemaError::Malformed(format!("record {record} has a non-object field: {raw}"))
        })?;
        let name = map.get("name").and_then(Value::as_str).ok_or_else(|| {
            SchemaError::Malformed(format!("record {record} has a field without a name"))
        })?;
        let type_value = map.get("type").ok_or_else(|| {
            SchemaError::Malformed(format!("field {record}.{name} has no type"))
        })?;

        Ok(Field {
            name: name.to_string(),
            schema: self.parse_value(type_value)?,
            default: map.get("default").cloned(),
            doc: optional_string(map, "doc"),
        })
    }

    fn parse_union(&self, raw_branches: &[Value]) -> Result<Schema> {
        if raw_branches.is_empty() {
            return Err(SchemaError::Malformed(
                "union must have at least one branch".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(raw_branches.len());
        let mut branches = Vec::with_capacity(raw_branches.len());
        for raw in raw_branches {
            let branch = self.parse_value(raw)?;
            let key = match &branch {
                Schema::Union(_) => {
                    return Err(SchemaError::Malformed(
                        "unions may not immediately contain other unions".to_string(),
                    ))
                }
                Schema::Primitive(node) => node.kind().to_string(),
                Schema::Record(record) => record.full_name(),
            };
            if !seen.insert(key.clone()) {
                return Err(SchemaError::Malformed(format!("duplicate {key} in union")));
            }
            branches.push(branch);
        }

        Ok(Schema::Union(branches))
    }
}

fn parse_type_name(name: &str) -> Result<Schema> {
    match PrimitiveKind::from_name(name) {
        Some(kind) => Ok(Schema::Primitive(SchemaNode::new(kind))),
        None => Err(SchemaError::Unsupported(format!("named type reference {name}"))),
    }
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::logical::{LogicalType, LOGICAL_TYPE_PROP};

/// Primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Null,
        PrimitiveKind::Boolean,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Bytes,
        PrimitiveKind::String,
    ];

    /// The type name used in schema documents.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Null => "null",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::String => "string",
        }
    }

    /// Look up a primitive by its schema type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive schema node with its properties and optional logical type.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    kind: PrimitiveKind,
    props: Map<String, Value>,
    logical_type: Option<Arc<dyn LogicalType>>,
}

impl SchemaNode {
    /// Create a bare primitive node.
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            props: Map::new(),
            logical_type: None,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// All node properties except `type`.
    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// A property value, if present and a JSON string.
    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(Value::as_str)
    }

    pub fn set_prop(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.props.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`SchemaNode::set_prop`].
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_prop(name, value);
        self
    }

    /// The declared `logicalType` annotation, whether or not it was resolved.
    pub fn logical_type_name(&self) -> Option<&str> {
        self.prop_str(LOGICAL_TYPE_PROP)
    }

    /// The resolved and schema-validated logical type, if any.
    pub fn logical_type(&self) -> Option<&dyn LogicalType> {
        self.logical_type.as_deref()
    }

    /// Attach a logical type that has already validated this node.
    pub fn set_logical_type(&mut self, logical_type: Arc<dyn LogicalType>) {
        self.logical_type = Some(logical_type);
    }

    pub fn to_json(&self) -> Value {
        if self.props.is_empty() {
            return Value::String(self.kind.as_str().to_string());
        }
        let mut map = Map::with_capacity(self.props.len() + 1);
        map.insert("type".to_string(), Value::String(self.kind.as_str().to_string()));
        for (key, value) in &self.props {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// A record field.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub default: Option<Value>,
    pub doc: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            default: None,
            doc: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("type".to_string(), self.schema.to_json());
        if let Some(default) = &self.default {
            map.insert("default".to_string(), default.clone());
        }
        if let Some(doc) = &self.doc {
            map.insert("doc".to_string(), Value::String(doc.clone()));
        }
        Value::Object(map)
    }
}

/// A named record schema.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            fields,
        }
    }

    /// `namespace.name`, or just `name` without a namespace.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) if !namespace.is_empty() => format!("{namespace}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String("record".to_string()));
        map.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(namespace) = &self.namespace {
            map.insert("namespace".to_string(), Value::String(namespace.clone()));
        }
        if let Some(doc) = &self.doc {
            map.insert("doc".to_string(), Value::String(doc.clone()));
        }
        map.insert(
            "fields".to_string(),
            Value::Array(self.fields.iter().map(Field::to_json).collect()),
        );
        Value::Object(map)
    }
}

/// A parsed schema.
#[derive(Debug, Clone)]
pub enum Schema {
    Primitive(SchemaNode),
    Record(Arc<RecordSchema>),
    Union(Vec<Schema>),
}

impl Schema {
    /// Short description used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Schema::Primitive(node) => match node.logical_type_name() {
                Some(logical) => format!("{}({logical})", node.kind()),
                None => node.kind().to_string(),
            },
            Schema::Record(record) => record.full_name(),
            Schema::Union(_) => "union".to_string(),
        }
    }

    pub fn as_record(&self) -> Option<&Arc<RecordSchema>> {
        match self {
            Schema::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Re-emit the schema as a JSON document.
    pub fn to_json(&self) -> Value {
        match self {
            Schema::Primitive(node) => node.to_json(),
            Schema::Record(record) => record.to_json(),
            Schema::Union(branches) => Value::Array(branches.iter().map(Schema::to_json).collect()),
        }
    }
}

impl From<SchemaNode> for Schema {
    fn from(node: SchemaNode) -> Self {
        Schema::Primitive(node)
    }
}

impl From<RecordSchema> for Schema {
    fn from(record: RecordSchema) -> Self {
        Schema::Record(Arc::new(record))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("record"), None);
        assert_eq!(
            serde_json::to_value(PrimitiveKind::String).unwrap(),
            Value::String("string".into())
        );
    }

    #[test]
    fn bare_node_emits_type_name() {
        let node = SchemaNode::new(PrimitiveKind::Long);
        assert_eq!(node.to_json(), Value::String("long".into()));
    }

    #[test]
    fn node_with_props_emits_object() {
        let node = SchemaNode::new(PrimitiveKind::String)
            .with_prop("logicalType", "validated-string")
            .with_prop("pattern", "^a$");
        assert_eq!(node.logical_type_name(), Some("validated-string"));
        assert!(node.logical_type().is_none());
        assert_eq!(
            node.to_json(),
            serde_json::json!({"type": "string", "logicalType": "validated-string", "pattern": "^a$"})
        );
    }

    #[test]
    fn record_full_name_and_lookup() {
        let mut record = RecordSchema::new(
            "User",
            vec![
                Field::new("name", SchemaNode::new(PrimitiveKind::String).into()),
                Field::new("age", SchemaNode::new(PrimitiveKind::Int).into()),
            ],
        );
        assert_eq!(record.full_name(), "User");
        record.namespace = Some("dev.example".into());
        assert_eq!(record.full_name(), "dev.example.User");
        assert_eq!(record.field_index("age"), Some(1));
        assert!(record.field("missing").is_none());
    }
}

//! Regex-validated strings for an Avro-style binary serialization format.
//!
//! vstring adds a `validated-string` logical type on top of the `string`
//! wire type. The pattern declared on the schema node is enforced when the
//! schema is parsed, when a record is written and when it is read.
//!
//! # Crate Structure
//!
//! - [`schema`]: Schema model and parser with pluggable logical types
//! - [`datum`]: Generic records and the binary codec
//! - [`logical`]: The `validated-string` logical type and extension registry (behind `logical` feature)
//!
//! # Usage
//!
//! ```
//! use vstring::datum::{from_slice, to_bytes, DatumConfig, GenericRecord, Value};
//! use vstring::logical::{register, ExtensionRegistry};
//! use vstring::schema::SchemaParser;
//!
//! let registry = ExtensionRegistry::new();
//! register(&registry);
//!
//! let schema = SchemaParser::new(&registry)
//!     .parse_str(r#"{"type": "record", "name": "Session", "fields": [
//!         {"name": "id", "type": {"type": "string", "logicalType": "validated-string",
//!                                 "pattern": "^[0-9]{4}-[0-9]{2}$"}}
//!     ]}"#)
//!     .unwrap();
//!
//! let mut record = GenericRecord::for_schema(&schema).unwrap();
//! record.put("id", "1234-56").unwrap();
//! let bytes = to_bytes(&schema, &Value::Record(record), &registry).unwrap();
//! let decoded = from_slice(&schema, &bytes, &registry, DatumConfig::default()).unwrap();
//! assert_eq!(decoded.as_record().unwrap().get("id").unwrap().as_str(), Some("1234-56"));
//! ```

/// Re-export schema types.
pub mod schema {
    pub use vstring_schema::*;
}

/// Re-export datum types.
pub mod datum {
    pub use vstring_datum::*;
}

/// Re-export logical-type types (requires `logical` feature).
#[cfg(feature = "logical")]
pub mod logical {
    pub use vstring_logical::*;
}

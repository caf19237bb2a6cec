//! Schema model and parser with pluggable logical-type annotations.
//!
//! Parses the JSON schema documents of an Avro-style binary format
//! (primitives, records, unions) and hands every `logicalType` annotation
//! to a [`LogicalTypeResolver`]. A resolved logical type validates the node
//! it annotates before the parse completes.

pub mod config;
pub mod error;
pub mod logical;
pub mod node;
pub mod parser;

pub use config::ParserConfig;
pub use error::{LogicalTypeError, Result, SchemaError};
pub use logical::{LogicalType, LogicalTypeResolver, NoLogicalTypes, LOGICAL_TYPE_PROP};
pub use node::{Field, PrimitiveKind, RecordSchema, Schema, SchemaNode};
pub use parser::SchemaParser;

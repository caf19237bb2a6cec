//! Generic records and binary datum encoding with logical-type conversions.
//!
//! Datums use the Avro binary encoding: zig-zag varints for integers,
//! length-prefixed strings and bytes, branch-indexed unions and records as
//! their fields in order. String nodes that carry a logical type are routed
//! through a [`Conversion`] on every write and every read.
//!
//! Building or mutating a [`GenericRecord`] never validates logical types;
//! only the encode/decode boundary does.

pub mod codec;
pub mod conversion;
pub mod error;
pub mod reader;
pub mod record;
pub mod value;
pub mod writer;

pub use codec::{decode_datum, encode_datum, from_slice, to_bytes, DatumConfig, DEFAULT_MAX_LENGTH};
pub use conversion::{Conversion, ConversionResolver, NoConversions};
pub use error::{DatumError, Result};
pub use reader::DatumReader;
pub use record::{GenericRecord, RecordBuilder};
pub use value::Value;
pub use writer::DatumWriter;

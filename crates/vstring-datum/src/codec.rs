use std::borrow::Cow;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};
use vstring_schema::{LogicalTypeError, PrimitiveKind, RecordSchema, Schema, SchemaNode};

use crate::conversion::ConversionResolver;
use crate::error::{DatumError, Result};
use crate::record::GenericRecord;
use crate::value::Value;

/// Default maximum string/bytes length accepted when decoding: 16 MiB.
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Longest zig-zag varint for a 64-bit value.
const MAX_VARINT_BYTES: usize = 10;

/// Configuration for datum decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatumConfig {
    /// Maximum decoded string or bytes length. Default: 16 MiB.
    pub max_length: usize,
}

impl Default for DatumConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

/// Encode a datum into the binary wire format.
///
/// String nodes carrying a logical type go through the registered
/// conversion, which may reject the value. On any error `dst` is restored
/// to its original length, so no partial datum is ever left behind.
///
/// Wire format (Avro binary):
/// ```text
/// null          nothing
/// boolean       1 byte, 0 or 1
/// int, long     zig-zag varint
/// float, double IEEE 754, little-endian
/// bytes, string long length, then the bytes
/// union         long branch index, then the branch value
/// record        each field in declaration order
/// ```
pub fn encode_datum(
    schema: &Schema,
    value: &Value,
    conversions: &dyn ConversionResolver,
    dst: &mut BytesMut,
) -> Result<()> {
    let start = dst.len();
    let result = encode_value(schema, value, conversions, dst);
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

/// Encode a single datum into a fresh buffer.
pub fn to_bytes(schema: &Schema, value: &Value, conversions: &dyn ConversionResolver) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_datum(schema, value, conversions, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode one datum from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete datum yet;
/// nothing is consumed in that case. When a conversion rejects a decoded
/// value, the whole datum is consumed and the conversion error returned,
/// so a stream can continue with the next datum. Structural errors leave
/// the buffer untouched.
pub fn decode_datum(
    schema: &Schema,
    src: &mut BytesMut,
    conversions: &dyn ConversionResolver,
    config: DatumConfig,
) -> Result<Option<Value>> {
    let mut cursor = Cursor::new(&src[..], conversions, config);
    let value = match cursor.read_value(schema) {
        Ok(value) => value,
        Err(DatumError::Truncated) => return Ok(None),
        Err(err) => return Err(err),
    };
    let consumed = cursor.pos;
    let rejected = cursor.rejected.take();

    src.advance(consumed);
    match rejected {
        Some(err) => Err(err.into()),
        None => Ok(Some(value)),
    }
}

/// Decode exactly one datum from a complete buffer.
pub fn from_slice(
    schema: &Schema,
    bytes: &[u8],
    conversions: &dyn ConversionResolver,
    config: DatumConfig,
) -> Result<Value> {
    let mut cursor = Cursor::new(bytes, conversions, config);
    let value = cursor.read_value(schema)?;
    if let Some(err) = cursor.rejected.take() {
        return Err(err.into());
    }
    match bytes.len() - cursor.pos {
        0 => Ok(value),
        trailing => Err(DatumError::TrailingBytes(trailing)),
    }
}

fn encode_value(
    schema: &Schema,
    value: &Value,
    conversions: &dyn ConversionResolver,
    dst: &mut BytesMut,
) -> Result<()> {
    match (schema, value) {
        (Schema::Primitive(node), value) => encode_primitive(node, value, conversions, dst),
        (Schema::Record(record_schema), Value::Record(record)) if record_fits(record_schema, record) => {
            for (field, field_value) in record_schema.fields.iter().zip(record.values()) {
                encode_value(&field.schema, field_value, conversions, dst).inspect_err(|err| {
                    debug!(
                        record = %record_schema.full_name(),
                        field = %field.name,
                        error = %err,
                        "failed to encode field"
                    );
                })?;
            }
            Ok(())
        }
        (Schema::Union(branches), value) => {
            let index = branches
                .iter()
                .position(|branch| branch_accepts(branch, value))
                .ok_or_else(|| DatumError::NoMatchingUnionBranch(value.kind_name()))?;
            put_long(dst, index as i64);
            encode_value(&branches[index], value, conversions, dst)
        }
        (schema, value) => Err(mismatch(schema, value)),
    }
}

fn encode_primitive(
    node: &SchemaNode,
    value: &Value,
    conversions: &dyn ConversionResolver,
    dst: &mut BytesMut,
) -> Result<()> {
    match (node.kind(), value) {
        (PrimitiveKind::Null, Value::Null) => {}
        (PrimitiveKind::Boolean, Value::Boolean(flag)) => dst.put_u8(u8::from(*flag)),
        (PrimitiveKind::Int, Value::Int(n)) => put_long(dst, i64::from(*n)),
        (PrimitiveKind::Long, Value::Long(n)) => put_long(dst, *n),
        (PrimitiveKind::Float, Value::Float(n)) => dst.put_f32_le(*n),
        (PrimitiveKind::Double, Value::Double(n)) => dst.put_f64_le(*n),
        (PrimitiveKind::Bytes, Value::Bytes(bytes)) => put_bytes(dst, bytes),
        (PrimitiveKind::String, Value::String(text)) => {
            let wire = string_to_wire(node, text, conversions)?;
            put_bytes(dst, wire.as_bytes());
        }
        _ => return Err(mismatch(&Schema::Primitive(node.clone()), value)),
    }
    Ok(())
}

fn string_to_wire<'v>(
    node: &SchemaNode,
    value: &'v str,
    conversions: &dyn ConversionResolver,
) -> std::result::Result<Cow<'v, str>, LogicalTypeError> {
    let Some(logical_type) = node.logical_type() else {
        return Ok(Cow::Borrowed(value));
    };
    match conversions.conversion_for(logical_type.name(), PrimitiveKind::String) {
        Some(conversion) => conversion.to_wire(value, node, logical_type).map(Cow::Owned),
        None => {
            trace!(logical_type = logical_type.name(), "no conversion registered, writing raw string");
            Ok(Cow::Borrowed(value))
        }
    }
}

fn branch_accepts(branch: &Schema, value: &Value) -> bool {
    match (branch, value) {
        (Schema::Primitive(node), value) => matches!(
            (node.kind(), value),
            (PrimitiveKind::Null, Value::Null)
                | (PrimitiveKind::Boolean, Value::Boolean(_))
                | (PrimitiveKind::Int, Value::Int(_))
                | (PrimitiveKind::Long, Value::Long(_))
                | (PrimitiveKind::Float, Value::Float(_))
                | (PrimitiveKind::Double, Value::Double(_))
                | (PrimitiveKind::Bytes, Value::Bytes(_))
                | (PrimitiveKind::String, Value::String(_))
        ),
        (Schema::Record(schema), Value::Record(record)) => record_fits(schema, record),
        _ => false,
    }
}

fn record_fits(expected: &Arc<RecordSchema>, record: &GenericRecord) -> bool {
    let actual = record.schema();
    if Arc::ptr_eq(expected, actual) {
        return true;
    }
    expected.full_name() == actual.full_name() && expected.fields.len() == record.values().len()
}

fn mismatch(schema: &Schema, value: &Value) -> DatumError {
    DatumError::TypeMismatch {
        expected: schema.type_name(),
        found: value.kind_name(),
    }
}

fn put_long(dst: &mut BytesMut, value: i64) {
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    while zigzag & !0x7f != 0 {
        dst.put_u8((zigzag & 0x7f) as u8 | 0x80);
        zigzag >>= 7;
    }
    dst.put_u8(zigzag as u8);
}

fn put_bytes(dst: &mut BytesMut, bytes: &[u8]) {
    dst.reserve(MAX_VARINT_BYTES + bytes.len());
    put_long(dst, bytes.len() as i64);
    dst.put_slice(bytes);
}

/// Read position over an undecoded buffer.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    conversions: &'a dyn ConversionResolver,
    config: DatumConfig,
    /// First conversion failure; decoding continues to find the datum's end.
    rejected: Option<LogicalTypeError>,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], conversions: &'a dyn ConversionResolver, config: DatumConfig) -> Self {
        Self {
            buf,
            pos: 0,
            conversions,
            config,
            rejected: None,
        }
    }

    fn read_value(&mut self, schema: &Schema) -> Result<Value> {
        match schema {
            Schema::Primitive(node) => self.read_primitive(node),
            Schema::Record(record) => {
                let mut values = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    values.push(self.read_value(&field.schema)?);
                }
                Ok(Value::Record(GenericRecord::from_parts(record.clone(), values)))
            }
            Schema::Union(branches) => {
                let index = self.read_long()?;
                let branch = usize::try_from(index)
                    .ok()
                    .and_then(|index| branches.get(index))
                    .ok_or(DatumError::UnionIndexOutOfRange {
                        index,
                        branches: branches.len(),
                    })?;
                self.read_value(branch)
            }
        }
    }

    fn read_primitive(&mut self, node: &SchemaNode) -> Result<Value> {
        let value = match node.kind() {
            PrimitiveKind::Null => Value::Null,
            PrimitiveKind::Boolean => match self.take(1)?[0] {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => return Err(DatumError::InvalidBoolean(other)),
            },
            PrimitiveKind::Int => {
                let n = self.read_long()?;
                Value::Int(i32::try_from(n).map_err(|_| DatumError::VarIntOverflow("int"))?)
            }
            PrimitiveKind::Long => Value::Long(self.read_long()?),
            PrimitiveKind::Float => {
                let raw = self.take(4)?;
                Value::Float(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            PrimitiveKind::Double => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(self.take(8)?);
                Value::Double(f64::from_le_bytes(raw))
            }
            PrimitiveKind::Bytes => Value::Bytes(self.read_bytes()?.to_vec()),
            PrimitiveKind::String => {
                let raw = String::from_utf8(self.read_bytes()?.to_vec())?;
                Value::String(self.string_from_wire(node, raw))
            }
        };
        Ok(value)
    }

    fn string_from_wire(&mut self, node: &SchemaNode, raw: String) -> String {
        let Some(logical_type) = node.logical_type() else {
            return raw;
        };
        let Some(conversion) = self
            .conversions
            .conversion_for(logical_type.name(), PrimitiveKind::String)
        else {
            trace!(logical_type = logical_type.name(), "no conversion registered, reading raw string");
            return raw;
        };
        match conversion.from_wire(&raw, node, logical_type) {
            Ok(value) => value,
            Err(err) => {
                debug!(logical_type = logical_type.name(), error = %err, "decoded value rejected");
                self.rejected.get_or_insert(err);
                raw
            }
        }
    }

    fn read_long(&mut self) -> Result<i64> {
        let mut accumulated = 0u64;
        for index in 0..MAX_VARINT_BYTES {
            let byte = self.take(1)?[0];
            // The tenth byte carries only the top bit of a 64-bit value.
            if index == MAX_VARINT_BYTES - 1 && byte > 1 {
                return Err(DatumError::VarIntOverflow("long"));
            }
            accumulated |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok((accumulated >> 1) as i64 ^ -((accumulated & 1) as i64));
            }
        }
        Err(DatumError::VarIntOverflow("long"))
    }

    fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_long()?;
        let len = u64::try_from(len).map_err(|_| DatumError::NegativeLength(len))?;
        if len > self.config.max_length as u64 {
            return Err(DatumError::LengthTooLarge {
                size: len,
                max: self.config.max_length,
            });
        }
        self.take(len as usize)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let buf: &'a [u8] = self.buf;
        let end = self.pos.checked_add(len).ok_or(DatumError::Truncated)?;
        let slice = buf.get(self.pos..end).ok_or(DatumError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }
}

use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use vstring_schema::Schema;

use crate::codec::{decode_datum, DatumConfig};
use crate::conversion::ConversionResolver;
use crate::error::{DatumError, Result};
use crate::value::Value;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete datums from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete datums.
pub struct DatumReader<'a, T> {
    inner: T,
    buf: BytesMut,
    schema: Schema,
    conversions: &'a dyn ConversionResolver,
    config: DatumConfig,
    failed: bool,
}

impl<'a, T: Read> DatumReader<'a, T> {
    /// Create a reader with default configuration.
    pub fn new(inner: T, schema: Schema, conversions: &'a dyn ConversionResolver) -> Self {
        Self::with_config(inner, schema, conversions, DatumConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(
        inner: T,
        schema: Schema,
        conversions: &'a dyn ConversionResolver,
        config: DatumConfig,
    ) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            schema,
            conversions,
            config,
            failed: false,
        }
    }

    /// Read the next complete datum (blocking).
    ///
    /// Returns `Ok(None)` at a clean end of stream and
    /// `Err(DatumError::UnexpectedEof)` if the stream ends mid-datum. A
    /// datum rejected by a conversion is consumed, so the next call moves on.
    pub fn read_datum(&mut self) -> Result<Option<Value>> {
        if self.buf.is_empty() && self.fill()? == 0 {
            return Ok(None);
        }

        loop {
            if let Some(value) = decode_datum(&self.schema, &mut self.buf, self.conversions, self.config)? {
                return Ok(Some(value));
            }
            if self.fill()? == 0 {
                return Err(DatumError::UnexpectedEof);
            }
        }
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(read) => {
                    self.buf.extend_from_slice(&chunk[..read]);
                    return Ok(read);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(DatumError::Io(err)),
            }
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the underlying stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Yields datums until end of stream.
///
/// Conversion failures are yielded and iteration continues; any other
/// error ends the iteration after it is yielded.
impl<T: Read> Iterator for DatumReader<'_, T> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_datum() {
            Ok(value) => value.map(Ok),
            Err(err) => {
                if !matches!(err, DatumError::Conversion(_)) {
                    self.failed = true;
                }
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use vstring_schema::{NoLogicalTypes, SchemaParser};

    use super::*;
    use crate::codec::to_bytes;
    use crate::conversion::NoConversions;

    struct OneByteReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for OneByteReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    fn parse(schema: &str) -> Schema {
        SchemaParser::new(&NoLogicalTypes).parse_str(schema).unwrap()
    }

    #[test]
    fn test_reader_assembles_partial_reads() {
        let schema = parse(r#""string""#);
        let mut data = to_bytes(&schema, &Value::from("first"), &NoConversions)
            .unwrap()
            .to_vec();
        data.extend_from_slice(&to_bytes(&schema, &Value::from("second"), &NoConversions).unwrap());

        let mut reader = DatumReader::new(OneByteReader { data, pos: 0 }, schema, &NoConversions);
        assert_eq!(reader.read_datum().unwrap(), Some(Value::from("first")));
        assert_eq!(reader.read_datum().unwrap(), Some(Value::from("second")));
        assert_eq!(reader.read_datum().unwrap(), None);
    }

    #[test]
    fn test_reader_eof_inside_datum() {
        let schema = parse(r#""string""#);
        let encoded = to_bytes(&schema, &Value::from("truncated"), &NoConversions).unwrap();
        let partial = encoded[..4].to_vec();

        let mut reader = DatumReader::new(Cursor::new(partial), schema, &NoConversions);
        assert!(matches!(reader.read_datum(), Err(DatumError::UnexpectedEof)));
    }

    #[test]
    fn test_reader_iterator_stops_on_structural_error() {
        let schema = parse(r#""boolean""#);
        let reader = DatumReader::new(Cursor::new(vec![0x01, 0x07, 0x00]), schema, &NoConversions);

        let items: Vec<_> = reader.collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &Value::Boolean(true));
        assert!(matches!(items[1], Err(DatumError::InvalidBoolean(0x07))));
    }
}

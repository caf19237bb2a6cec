use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use vstring_schema::Schema;

use crate::codec::encode_datum;
use crate::conversion::ConversionResolver;
use crate::error::{DatumError, Result};
use crate::value::Value;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes encoded datums to any `Write` stream.
///
/// Each datum is fully encoded before any byte reaches the stream, so a
/// value rejected by a conversion never produces partial output.
pub struct DatumWriter<'a, T> {
    inner: T,
    buf: BytesMut,
    schema: Schema,
    conversions: &'a dyn ConversionResolver,
}

impl<'a, T: Write> DatumWriter<'a, T> {
    /// Create a writer for datums of `schema`.
    pub fn new(inner: T, schema: Schema, conversions: &'a dyn ConversionResolver) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            schema,
            conversions,
        }
    }

    /// Encode and write one datum (blocking).
    pub fn write(&mut self, value: &Value) -> Result<()> {
        self.buf.clear();
        encode_datum(&self.schema, value, self.conversions, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(DatumError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DatumError::Io(err)),
            }
        }

        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
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

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the underlying stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use vstring_schema::{NoLogicalTypes, SchemaParser};

    use super::*;
    use crate::conversion::NoConversions;

    struct ShortWriter {
        data: Vec<u8>,
        max_write: usize,
        interrupted_once: bool,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted_once {
                self.interrupted_once = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.max_write);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn string_schema() -> Schema {
        SchemaParser::new(&NoLogicalTypes).parse_str(r#""string""#).unwrap()
    }

    #[test]
    fn test_writer_handles_short_writes() {
        let sink = ShortWriter {
            data: Vec::new(),
            max_write: 2,
            interrupted_once: false,
        };
        let mut writer = DatumWriter::new(sink, string_schema(), &NoConversions);
        writer.write(&Value::from("hello")).unwrap();
        writer.flush().unwrap();

        assert_eq!(writer.get_ref().data, [0x0a, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_writer_zero_write_is_error() {
        let mut writer = DatumWriter::new(ClosedWriter, string_schema(), &NoConversions);
        let result = writer.write(&Value::from("x"));
        assert!(matches!(result, Err(DatumError::Io(ref err)) if err.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn test_writer_rejects_wrong_type_without_output() {
        let mut writer = DatumWriter::new(Vec::new(), string_schema(), &NoConversions);
        assert!(writer.write(&Value::Int(1)).is_err());
        assert!(writer.into_inner().is_empty());
    }
}

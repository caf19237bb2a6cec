use vstring_schema::LogicalTypeError;

/// Errors that can occur while building, encoding or decoding datums.
#[derive(Debug, thiserror::Error)]
pub enum DatumError {
    /// The buffer ends before the datum does.
    #[error("datum truncated")]
    Truncated,

    /// A decoded string is not valid UTF-8.
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),

    /// A variable-length integer does not fit the target type.
    #[error("variable-length integer overflows {0}")]
    VarIntOverflow(&'static str),

    /// A negative string or bytes length prefix.
    #[error("negative length prefix {0}")]
    NegativeLength(i64),

    /// A length prefix exceeds the configured maximum.
    #[error("length too large ({size} bytes, max {max})")]
    LengthTooLarge { size: u64, max: usize },

    /// A union branch index outside the union.
    #[error("union index {index} out of range ({branches} branches)")]
    UnionIndexOutOfRange { index: i64, branches: usize },

    /// A value does not have the shape its schema requires.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// No union branch can hold the value.
    #[error("no union branch accepts {0}")]
    NoMatchingUnionBranch(String),

    /// A field name the record schema does not declare.
    #[error("record {record} has no field {field}")]
    UnknownField { record: String, field: String },

    /// A builder field left unset with no default.
    #[error("field {record}.{field} has no value and no default")]
    MissingField { record: String, field: String },

    /// A schema default that does not fit the field type.
    #[error("invalid default for field {record}.{field}")]
    InvalidDefault { record: String, field: String },

    /// Bytes left over after decoding a single datum.
    #[error("{0} trailing bytes after datum")]
    TrailingBytes(usize),

    /// A logical-type conversion rejected the value.
    #[error(transparent)]
    Conversion(#[from] LogicalTypeError),

    /// An I/O error occurred while reading or writing datums.
    #[error("datum I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a datum.
    #[error("stream ended inside a datum")]
    UnexpectedEof,
}

pub type Result<T> = std::result::Result<T, DatumError>;

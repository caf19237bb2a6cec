/// Controls schema parsing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    /// When true, a `logicalType` annotation with no registered factory
    /// fails the parse with `LogicalTypeError::UnknownLogicalType`.
    /// When false the annotation is kept as a plain property and the node
    /// is treated as its underlying primitive.
    pub strict_logical_types: bool,
}

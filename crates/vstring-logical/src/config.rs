/// What a registry does when a name is registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The latest registration wins.
    #[default]
    Replace,
    /// The first registration wins; later ones are no-ops.
    Ignore,
}

/// Controls extension registry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    /// Applies to both logical-type factories and conversions.
    pub on_duplicate: DuplicatePolicy,
}

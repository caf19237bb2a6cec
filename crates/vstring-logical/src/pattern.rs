use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;
use regex_syntax::hir::{Hir, Look};
use regex_syntax::Parser;
use vstring_schema::LogicalTypeError;

/// A compiled pattern with whole-value matching semantics.
///
/// `matches` succeeds only when the pattern matches the entire candidate,
/// the way `Matcher::matches` behaves for structured identifiers. Cloning
/// shares the compiled program.
#[derive(Debug, Clone)]
pub struct PatternRule {
    source: String,
    anchored: Regex,
}

impl PatternRule {
    /// Compile `source`, failing with `LogicalTypeError::PatternCompile`.
    pub fn compile(source: &str) -> Result<Self, LogicalTypeError> {
        let hir = Parser::new()
            .parse(source)
            .map_err(|err| compile_error(source, &err))?;
        // Anchor the parsed expression, not the text: flags and comments in
        // `source` must not reach past its own end.
        let whole = Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]);
        let anchored = Regex::new(&whole.to_string()).map_err(|err| compile_error(source, &err))?;

        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    /// The pattern text as declared in the schema.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the whole of `candidate` matches.
    pub fn matches(&self, candidate: &str) -> bool {
        self.anchored.is_match(candidate)
    }
}

impl PartialEq for PatternRule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PatternRule {}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compile_error(source: &str, err: &dyn fmt::Display) -> LogicalTypeError {
    LogicalTypeError::PatternCompile {
        pattern: source.to_string(),
        message: err.to_string(),
    }
}

/// Compiled patterns keyed by source text.
///
/// Entries are immutable once inserted, so schema nodes declaring the same
/// pattern share one compiled program and never share mutable state.
#[derive(Debug, Default)]
pub struct PatternCache {
    rules: RwLock<HashMap<String, PatternRule>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached rule for `source`, compiling it on first use.
    pub fn get_or_compile(&self, source: &str) -> Result<PatternRule, LogicalTypeError> {
        if let Some(rule) = self.read().get(source) {
            return Ok(rule.clone());
        }

        let rule = PatternRule::compile(source)?;
        Ok(self
            .write()
            .entry(source.to_string())
            .or_insert(rule)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, PatternRule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, PatternRule>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }
}

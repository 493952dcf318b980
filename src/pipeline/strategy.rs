//! Extraction strategies and the order the cascade tries them in.
//!
//! Each strategy reads the same sanitized input and returns raw samples.
//! The first one that yields at least one sample wins; later strategies
//! never run. Canonicalization happens afterwards, once, whoever won.

use crate::config::ParserConfig;
use crate::pipeline::extraction::aliases::AliasTable;
use crate::pipeline::extraction::keyword::KeywordStrategy;
use crate::pipeline::extraction::line_kv::LineKvStrategy;
use crate::pipeline::extraction::numeric::NumericFallbackStrategy;
use crate::pipeline::extraction::patterns::PatternSet;
use crate::pipeline::extraction::table_detect::TableStrategy;
use crate::pipeline::extraction::types::{Domain, RawSample, StrategyKind};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Everything a strategy may look at. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    /// Sanitized document text.
    pub text: &'a str,
    /// Trimmed non-empty lines of `text`.
    pub lines: &'a [String],
    pub domain: Domain,
    pub aliases: &'static AliasTable,
    pub patterns: &'a PatternSet,
    pub config: &'a ParserConfig,
}

/// One way of pulling samples out of OCR text.
pub trait ExtractionStrategy: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> StrategyKind;

    /// Cheap precondition. When false the strategy is skipped without
    /// calling `extract`.
    fn applies(&self, _input: &StrategyInput<'_>) -> bool {
        true
    }

    /// Raw samples in document order. Empty means "try the next strategy".
    fn extract(&self, input: &StrategyInput<'_>) -> Vec<RawSample>;
}

// ═══════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════

/// The cascade in priority order: most structured first, blind positional
/// assignment last.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(TableStrategy),
        Box::new(LineKvStrategy),
        Box::new(KeywordStrategy),
        Box::new(NumericFallbackStrategy),
    ]
}

/// True when the line holds at least one ASCII digit. Shared by the
/// strategies' `applies` checks.
pub(crate) fn has_digit(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
}

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use super::aliases::AliasTable;
use super::canonical::assemble_samples;
use super::patterns::PatternSet;
use super::sanitize::{normalize_lines, sanitize_text};
use super::types::{Domain, ParsingResult, RawDocument};
use super::PipelineError;
use crate::config::{ConfigError, ParserConfig};
use crate::pipeline::strategy::{default_strategies, ExtractionStrategy, StrategyInput};

/// Diagnostic recorded when every strategy came up empty.
pub const NO_DATA_DIAGNOSTIC: &str = "no extractable data";

/// Runs the extraction cascade over one document at a time.
///
/// Holds only read-only state after construction, so one parser can be
/// shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct LabReportParser {
    config: ParserConfig,
    patterns: PatternSet,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl LabReportParser {
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        Self::with_strategies(config, default_strategies())
    }

    /// Build a parser with a custom cascade. Strategies run in the given order.
    pub fn with_strategies(
        config: ParserConfig,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if strategies.is_empty() {
            return Err(ConfigError::Invalid("at least one strategy is required".into()));
        }
        Ok(Self {
            config,
            patterns: PatternSet::compile()?,
            strategies,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Guess whether OCR text is a soil or a leaf report.
    ///
    /// Domain lab codes (`S001`, `L0002`) decide first; indicator words
    /// (`CEC`, `Org. C`, `Zn`, `foliar`) break a tie. `None` when the text
    /// leans neither way.
    pub fn detect_domain(&self, raw_text: &str) -> Option<Domain> {
        let text = sanitize_text(raw_text);
        let lab_codes = |domain: Domain| {
            self.patterns
                .find_boundaries(domain, &text)
                .iter()
                .filter(|b| !b.id.starts_with("Sample_"))
                .count()
        };
        let (soil_codes, leaf_codes) = (lab_codes(Domain::Soil), lab_codes(Domain::Leaf));
        let soil_words = AliasTable::for_domain(Domain::Soil).indicator_count(&text);
        let leaf_words = AliasTable::for_domain(Domain::Leaf).indicator_count(&text);

        let detected = match (soil_codes.cmp(&leaf_codes), soil_words.cmp(&leaf_words)) {
            (Ordering::Greater, _) | (Ordering::Equal, Ordering::Greater) => Some(Domain::Soil),
            (Ordering::Less, _) | (Ordering::Equal, Ordering::Less) => Some(Domain::Leaf),
            (Ordering::Equal, Ordering::Equal) => None,
        };
        tracing::debug!(
            soil_codes,
            leaf_codes,
            soil_words,
            leaf_words,
            detected = ?detected,
            "Report domain detection"
        );
        detected
    }

    pub fn parse_document(&self, document: &RawDocument) -> ParsingResult {
        self.parse(&document.text, document.domain)
    }

    /// Parse OCR text of one report.
    ///
    /// Never fails: input the cascade cannot read yields an empty result
    /// whose diagnostics say why.
    pub fn parse(&self, raw_text: &str, domain: Domain) -> ParsingResult {
        let text = sanitize_text(raw_text);
        let length = text.trim().chars().count();
        if length == 0 {
            tracing::warn!(domain = %domain, "Empty report text");
            return ParsingResult::empty(vec!["input is empty".into()]);
        }
        if length < self.config.min_input_chars {
            tracing::warn!(domain = %domain, length, "Report text too short");
            return ParsingResult::empty(vec![format!(
                "input too short ({length} characters, minimum {})",
                self.config.min_input_chars
            )]);
        }

        let lines = normalize_lines(&text);
        let aliases = AliasTable::for_domain(domain);
        let input = StrategyInput {
            text: &text,
            lines: &lines,
            domain,
            aliases,
            patterns: &self.patterns,
            config: &self.config,
        };

        let mut diagnostics = Vec::new();
        for strategy in &self.strategies {
            let kind = strategy.kind();
            if !strategy.applies(&input) {
                tracing::debug!(domain = %domain, strategy = %kind, "Strategy not applicable");
                diagnostics.push(format!("{kind}: not applicable"));
                continue;
            }

            let raw = strategy.extract(&input);
            if raw.is_empty() {
                tracing::debug!(domain = %domain, strategy = %kind, "Strategy found no samples");
                diagnostics.push(format!("{kind}: no samples"));
                continue;
            }

            diagnostics.push(format!("{kind}: {} sample(s)", raw.len()));
            let samples = assemble_samples(raw, aliases, &mut diagnostics);
            tracing::info!(
                domain = %domain,
                strategy = %kind,
                samples = samples.len(),
                lines = lines.len(),
                "Lab report parsed"
            );
            return ParsingResult {
                samples,
                strategy_used: kind,
                diagnostics,
            };
        }

        tracing::warn!(domain = %domain, lines = lines.len(), "No strategy extracted any sample");
        diagnostics.push(NO_DATA_DIAGNOSTIC.into());
        ParsingResult::empty(diagnostics)
    }
}

impl Default for LabReportParser {
    fn default() -> Self {
        Self::new(ParserConfig::default()).expect("built-in extraction patterns are valid")
    }
}

// ═══════════════════════════════════════════════════════════
// Soil + leaf pair
// ═══════════════════════════════════════════════════════════

/// Parsed soil and leaf reports of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPair {
    pub soil: ParsingResult,
    pub leaf: ParsingResult,
}

/// Parse a soil report and a leaf report concurrently.
///
/// Parsing is CPU-bound, so each document runs on the blocking pool.
/// The two results are independent; a worker panic surfaces as
/// `PipelineError::Worker`.
pub async fn parse_report_pair(
    parser: Arc<LabReportParser>,
    soil_text: String,
    leaf_text: String,
) -> Result<ReportPair, PipelineError> {
    let soil_parser = Arc::clone(&parser);
    let soil = tokio::task::spawn_blocking(move || soil_parser.parse(&soil_text, Domain::Soil));
    let leaf = tokio::task::spawn_blocking(move || parser.parse(&leaf_text, Domain::Leaf));

    let (soil, leaf) = tokio::try_join!(soil, leaf)?;
    tracing::info!(
        soil_samples = soil.samples.len(),
        leaf_samples = leaf.samples.len(),
        "Report pair parsed"
    );
    Ok(ReportPair { soil, leaf })
}

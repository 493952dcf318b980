//! Compiled regular expressions shared by the extraction strategies.
//!
//! A `PatternSet` is built once per parser and never mutated; strategies
//! borrow it through `StrategyInput`.

use regex::Regex;

use super::types::{Domain, Parameter};
use crate::config::ConfigError;

/// Numeric value as printed in a key/value pair, inequality sign allowed.
const VALUE: &str = r"[<>]?\s*-?\d[\d,]*(?:\.\d+)?";

/// Up to five words naming a field; no word may start with a digit, so
/// a preceding value never becomes part of the next name.
const LABEL: &str = r"[a-z][a-z0-9._()%/+-]*(?:\s+[a-z(%][a-z0-9._()%/+-]*){0,4}";

/// Optional unit annotations between a keyword and its value:
/// `(%)`, `(mg/kg)`, `(cmol(+)/kg)`, bare `%`.
const UNIT_GAP: &str = r"(?:\s*(?:\([^()]*(?:\([^()]*\)[^()]*)*\)|%))*";

/// Keyword spellings per parameter for whole-text scanning. Regex
/// fragments, matched against lower-cased text. A keyword right after a
/// `/` is the second half of a ratio (`c/n`) and does not match.
static SOIL_KEYWORDS: &[(Parameter, &[&str])] = &[
    (Parameter::SoilPh, &[r"ph"]),
    (Parameter::SoilNitrogen, &[r"total\s+nitrogen", r"nitrogen", r"total\s+n", r"n"]),
    (Parameter::SoilOrganicCarbon, &[r"organic\s+carbon", r"organic\s+c", r"org\.?\s*c"]),
    (Parameter::SoilTotalPhosphorus, &[r"total\s+phosphorus", r"total\s+p"]),
    (
        Parameter::SoilAvailablePhosphorus,
        &[r"available\s+phosphorus", r"available\s+p", r"avail\.?\s*p", r"av\.?\s*p"],
    ),
    (
        Parameter::SoilExchangeablePotassium,
        &[r"exchangeable\s+potassium", r"exchangeable\s+k", r"exch\.?\s*k", r"potassium"],
    ),
    (
        Parameter::SoilExchangeableCalcium,
        &[r"exchangeable\s+calcium", r"exchangeable\s+ca", r"exch\.?\s*ca", r"calcium"],
    ),
    (
        Parameter::SoilExchangeableMagnesium,
        &[r"exchangeable\s+magnesium", r"exchangeable\s+mg", r"exch\.?\s*mg", r"magnesium"],
    ),
    (Parameter::SoilCec, &[r"cation\s+exchange\s+capacity", r"c\.?\s*e\.?\s*c"]),
];

static LEAF_KEYWORDS: &[(Parameter, &[&str])] = &[
    (Parameter::LeafNitrogen, &[r"nitrogen", r"n"]),
    (Parameter::LeafPhosphorus, &[r"phosphorus", r"p"]),
    (Parameter::LeafPotassium, &[r"potassium", r"k"]),
    (Parameter::LeafMagnesium, &[r"magnesium", r"mg"]),
    (Parameter::LeafCalcium, &[r"calcium", r"ca"]),
    (Parameter::LeafBoron, &[r"boron", r"b"]),
    (Parameter::LeafCopper, &[r"copper", r"cu"]),
    (Parameter::LeafZinc, &[r"zinc", r"zn"]),
    (Parameter::LeafIron, &[r"iron", r"fe"]),
    (Parameter::LeafManganese, &[r"manganese", r"mn"]),
];

/// The three inline pair shapes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairForm {
    /// `name: value`
    Colon,
    /// `name = value`
    Equals,
    /// `name value`
    Spaced,
}

impl PairForm {
    /// Explicitly labelled pairs survive even when the name is unknown;
    /// bare `name value` runs are mostly noise unless the name resolves.
    pub fn keeps_unmapped(&self) -> bool {
        !matches!(self, Self::Spaced)
    }
}

/// A sample-ID marker located in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMatch {
    pub start: usize,
    pub end: usize,
    pub id: String,
}

#[derive(Debug)]
pub struct PatternSet {
    soil_boundary: Regex,
    leaf_boundary: Regex,
    pairs: Vec<(PairForm, Regex)>,
    number: Regex,
    soil_keywords: Vec<(Parameter, Regex)>,
    leaf_keywords: Vec<(Parameter, Regex)>,
}

impl PatternSet {
    pub fn compile() -> Result<Self, ConfigError> {
        let pairs = vec![
            (
                PairForm::Colon,
                Regex::new(&format!(r"(?i)\b({LABEL})\s*:\s*({VALUE})"))?,
            ),
            (
                PairForm::Equals,
                Regex::new(&format!(r"(?i)\b({LABEL})\s*=\s*({VALUE})"))?,
            ),
            (
                PairForm::Spaced,
                Regex::new(&format!(
                    r"(?i)\b([a-z][a-z._%/-]*(?:\s+\(?[a-z%][a-z0-9._%/()+-]*){{0,3}})\s+({VALUE})\b"
                ))?,
            ),
        ];

        Ok(Self {
            soil_boundary: boundary_regex(Domain::Soil)?,
            leaf_boundary: boundary_regex(Domain::Leaf)?,
            pairs,
            number: Regex::new(r"-?\b\d+(?:\.\d+)?\b")?,
            soil_keywords: keyword_regexes(SOIL_KEYWORDS)?,
            leaf_keywords: keyword_regexes(LEAF_KEYWORDS)?,
        })
    }

    pub fn boundary(&self, domain: Domain) -> &Regex {
        match domain {
            Domain::Soil => &self.soil_boundary,
            Domain::Leaf => &self.leaf_boundary,
        }
    }

    /// All sample-ID markers in `text`, in order.
    pub fn find_boundaries(&self, domain: Domain, text: &str) -> Vec<BoundaryMatch> {
        self.boundary(domain)
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let id = match (caps.get(1), caps.get(2)) {
                    (Some(code), _) => code.as_str().to_uppercase(),
                    (None, Some(number)) => format!("Sample_{}", number.as_str()),
                    (None, None) => return None,
                };
                Some(BoundaryMatch {
                    start: whole.start(),
                    end: whole.end(),
                    id,
                })
            })
            .collect()
    }

    /// True when the whole token is a sample-ID marker (`S001`, `L0002`).
    pub fn is_boundary_token(&self, domain: Domain, token: &str) -> bool {
        self.find_boundaries(domain, token)
            .first()
            .is_some_and(|m| m.start == 0 && m.end == token.len())
    }

    pub fn pair_forms(&self) -> &[(PairForm, Regex)] {
        &self.pairs
    }

    pub fn number(&self) -> &Regex {
        &self.number
    }

    pub fn keywords(&self, domain: Domain) -> &[(Parameter, Regex)] {
        match domain {
            Domain::Soil => &self.soil_keywords,
            Domain::Leaf => &self.leaf_keywords,
        }
    }
}

fn boundary_regex(domain: Domain) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)\b({}\d{{3,4}}(?:/\d{{2}})?)\b|\bsample\s*(?:no\.?|#)?\s*:?\s*(\d{{1,4}})\b",
        domain.id_prefix()
    ))
}

fn keyword_regexes(table: &[(Parameter, &[&str])]) -> Result<Vec<(Parameter, Regex)>, regex::Error> {
    table
        .iter()
        .map(|(parameter, variants)| {
            let pattern = format!(
                r"(?:^|[^/\w])(?:{})\b{UNIT_GAP}\s*[:=]?\s*({VALUE})",
                variants.join("|")
            );
            Regex::new(&pattern).map(|re| (*parameter, re))
        })
        .collect()
}

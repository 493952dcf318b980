use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::DomainParseError;

// ═══════════════════════════════════════════════════════════
// Domain & parameters
// ═══════════════════════════════════════════════════════════

/// Which kind of laboratory report the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Soil,
    Leaf,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soil => "soil",
            Self::Leaf => "leaf",
        }
    }

    /// Letter that prefixes laboratory sample numbers (`S001`, `L002`).
    pub fn id_prefix(&self) -> char {
        match self {
            Self::Soil => 'S',
            Self::Leaf => 'L',
        }
    }

    /// Ordered canonical parameter set for this domain.
    pub fn parameters(&self) -> &'static [Parameter] {
        match self {
            Self::Soil => SOIL_PARAMETERS,
            Self::Leaf => LEAF_PARAMETERS,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soil" => Ok(Self::Soil),
            "leaf" => Ok(Self::Leaf),
            other => Err(DomainParseError(other.to_string())),
        }
    }
}

/// A canonical measurement the analysis engine expects on every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    // Soil
    SoilPh,
    SoilNitrogen,
    SoilOrganicCarbon,
    SoilTotalPhosphorus,
    SoilAvailablePhosphorus,
    SoilExchangeablePotassium,
    SoilExchangeableCalcium,
    SoilExchangeableMagnesium,
    SoilCec,
    // Leaf, % dry matter
    LeafNitrogen,
    LeafPhosphorus,
    LeafPotassium,
    LeafMagnesium,
    LeafCalcium,
    // Leaf, mg/kg dry matter
    LeafBoron,
    LeafCopper,
    LeafZinc,
    LeafIron,
    LeafManganese,
}

pub const SOIL_PARAMETERS: &[Parameter] = &[
    Parameter::SoilPh,
    Parameter::SoilNitrogen,
    Parameter::SoilOrganicCarbon,
    Parameter::SoilTotalPhosphorus,
    Parameter::SoilAvailablePhosphorus,
    Parameter::SoilExchangeablePotassium,
    Parameter::SoilExchangeableCalcium,
    Parameter::SoilExchangeableMagnesium,
    Parameter::SoilCec,
];

pub const LEAF_PARAMETERS: &[Parameter] = &[
    Parameter::LeafNitrogen,
    Parameter::LeafPhosphorus,
    Parameter::LeafPotassium,
    Parameter::LeafMagnesium,
    Parameter::LeafCalcium,
    Parameter::LeafBoron,
    Parameter::LeafCopper,
    Parameter::LeafZinc,
    Parameter::LeafIron,
    Parameter::LeafManganese,
];

impl Parameter {
    /// Key used in serialized output and by the analysis engine.
    pub fn key(&self) -> &'static str {
        match self {
            Self::SoilPh => "pH",
            Self::SoilNitrogen => "N_%",
            Self::SoilOrganicCarbon => "Org_C_%",
            Self::SoilTotalPhosphorus => "Total_P_mg_kg",
            Self::SoilAvailablePhosphorus => "Avail_P_mg_kg",
            Self::SoilExchangeablePotassium => "Exch_K_meq%",
            Self::SoilExchangeableCalcium => "Exch_Ca_meq%",
            Self::SoilExchangeableMagnesium => "Exch_Mg_meq%",
            Self::SoilCec => "CEC_meq%",
            Self::LeafNitrogen => "N_%",
            Self::LeafPhosphorus => "P_%",
            Self::LeafPotassium => "K_%",
            Self::LeafMagnesium => "Mg_%",
            Self::LeafCalcium => "Ca_%",
            Self::LeafBoron => "B_mg_kg",
            Self::LeafCopper => "Cu_mg_kg",
            Self::LeafZinc => "Zn_mg_kg",
            Self::LeafIron => "Fe_mg_kg",
            Self::LeafManganese => "Mn_mg_kg",
        }
    }

    pub fn domain(&self) -> Domain {
        if SOIL_PARAMETERS.contains(self) {
            Domain::Soil
        } else {
            Domain::Leaf
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ═══════════════════════════════════════════════════════════
// Field values
// ═══════════════════════════════════════════════════════════

/// A captured cell: numeric once coercion succeeded, otherwise the OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ═══════════════════════════════════════════════════════════
// Documents & samples
// ═══════════════════════════════════════════════════════════

/// OCR text for one uploaded report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
    pub domain: Domain,
}

impl RawDocument {
    pub fn new(text: impl Into<String>, domain: Domain) -> Self {
        Self {
            text: text.into(),
            domain,
        }
    }
}

/// A sample as a strategy produced it: field names not yet canonical.
///
/// Fields keep first-insertion order; inserting an existing name replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawSample {
    pub id: Option<String>,
    pub fields: Vec<(String, FieldValue)>,
}

impl RawSample {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The full canonical parameter set of one sample, in domain order.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalValues {
    values: Vec<(Parameter, f64)>,
}

impl CanonicalValues {
    pub(crate) fn from_ordered(values: Vec<(Parameter, f64)>) -> Self {
        Self { values }
    }

    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.iter().find(|(p, _)| *p == parameter).map(|(_, v)| v)
    }

    /// Lookup by serialized key, e.g. `"pH"` or `"N_%"`.
    pub fn get_key(&self, key: &str) -> Option<f64> {
        self.iter().find(|(p, _)| p.key() == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().map(|(p, _)| p.key())
    }

    /// Parameters and values in domain order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        self.values.iter().copied()
    }
}

impl Serialize for CanonicalValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (parameter, value) in self.iter() {
            map.serialize_entry(parameter.key(), &value)?;
        }
        map.end()
    }
}

/// A canonicalized sample handed to the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub id: String,
    pub canonical: CanonicalValues,
    /// Captured fields that did not map to a canonical parameter.
    pub extra: BTreeMap<String, FieldValue>,
}

/// Which extraction strategy produced the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Table,
    LineKv,
    Keyword,
    NumericFallback,
    None,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::LineKv => write!(f, "line_kv"),
            Self::Keyword => write!(f, "keyword"),
            Self::NumericFallback => write!(f, "numeric_fallback"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Outcome of one parse call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsingResult {
    pub samples: Vec<Sample>,
    pub strategy_used: StrategyKind,
    /// Operator-facing notes; never used for control flow.
    pub diagnostics: Vec<String>,
}

impl ParsingResult {
    pub fn empty(diagnostics: Vec<String>) -> Self {
        Self {
            samples: Vec::new(),
            strategy_used: StrategyKind::None,
            diagnostics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

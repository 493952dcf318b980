//! Parameter alias tables: OCR/lab spellings → canonical parameters.
//!
//! Each domain has a priority-ordered alias list. Specific spellings come
//! before general ones (`available p` before `p`) because the fuzzy stage
//! returns the first alias whose words appear in the field name.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Domain, Parameter};

/// Read-only alias configuration for one domain.
#[derive(Debug)]
pub struct AliasTable {
    domain: Domain,
    aliases: &'static [(&'static str, Parameter)],
    header_keywords: &'static [&'static str],
    /// Words that mark a report as belonging to this domain.
    indicators: &'static [&'static str],
}

static SOIL_ALIASES: &[(&str, Parameter)] = &[
    ("ph", Parameter::SoilPh),
    ("ph h2o", Parameter::SoilPh),
    ("ph water", Parameter::SoilPh),
    ("total nitrogen", Parameter::SoilNitrogen),
    ("nitrogen", Parameter::SoilNitrogen),
    ("total n", Parameter::SoilNitrogen),
    ("organic carbon", Parameter::SoilOrganicCarbon),
    ("organic c", Parameter::SoilOrganicCarbon),
    ("org c", Parameter::SoilOrganicCarbon),
    ("oc", Parameter::SoilOrganicCarbon),
    ("total phosphorus", Parameter::SoilTotalPhosphorus),
    ("total p", Parameter::SoilTotalPhosphorus),
    ("available phosphorus", Parameter::SoilAvailablePhosphorus),
    ("available p", Parameter::SoilAvailablePhosphorus),
    ("avail p", Parameter::SoilAvailablePhosphorus),
    ("av p", Parameter::SoilAvailablePhosphorus),
    ("bray p", Parameter::SoilAvailablePhosphorus),
    ("exchangeable potassium", Parameter::SoilExchangeablePotassium),
    ("exchangeable k", Parameter::SoilExchangeablePotassium),
    ("exch k", Parameter::SoilExchangeablePotassium),
    ("exchangeable calcium", Parameter::SoilExchangeableCalcium),
    ("exchangeable ca", Parameter::SoilExchangeableCalcium),
    ("exch ca", Parameter::SoilExchangeableCalcium),
    ("exchangeable magnesium", Parameter::SoilExchangeableMagnesium),
    ("exchangeable mg", Parameter::SoilExchangeableMagnesium),
    ("exch mg", Parameter::SoilExchangeableMagnesium),
    ("cation exchange capacity", Parameter::SoilCec),
    ("cec", Parameter::SoilCec),
    ("c e c", Parameter::SoilCec),
    // General spellings, only reached when nothing specific matched
    ("carbon", Parameter::SoilOrganicCarbon),
    ("available", Parameter::SoilAvailablePhosphorus),
    ("avail", Parameter::SoilAvailablePhosphorus),
    ("phosphorus", Parameter::SoilAvailablePhosphorus),
    ("potassium", Parameter::SoilExchangeablePotassium),
    ("calcium", Parameter::SoilExchangeableCalcium),
    ("magnesium", Parameter::SoilExchangeableMagnesium),
    ("n", Parameter::SoilNitrogen),
    ("p", Parameter::SoilAvailablePhosphorus),
    ("k", Parameter::SoilExchangeablePotassium),
    ("ca", Parameter::SoilExchangeableCalcium),
    ("mg", Parameter::SoilExchangeableMagnesium),
    ("c", Parameter::SoilOrganicCarbon),
];

static LEAF_ALIASES: &[(&str, Parameter)] = &[
    ("nitrogen", Parameter::LeafNitrogen),
    ("phosphorus", Parameter::LeafPhosphorus),
    ("potassium", Parameter::LeafPotassium),
    ("magnesium", Parameter::LeafMagnesium),
    ("calcium", Parameter::LeafCalcium),
    ("boron", Parameter::LeafBoron),
    ("copper", Parameter::LeafCopper),
    ("zinc", Parameter::LeafZinc),
    ("iron", Parameter::LeafIron),
    ("manganese", Parameter::LeafManganese),
    ("n", Parameter::LeafNitrogen),
    ("p", Parameter::LeafPhosphorus),
    ("k", Parameter::LeafPotassium),
    ("mg", Parameter::LeafMagnesium),
    ("ca", Parameter::LeafCalcium),
    ("b", Parameter::LeafBoron),
    ("cu", Parameter::LeafCopper),
    ("zn", Parameter::LeafZinc),
    ("fe", Parameter::LeafIron),
    ("mn", Parameter::LeafManganese),
];

static SOIL_TABLE: AliasTable = AliasTable {
    domain: Domain::Soil,
    aliases: SOIL_ALIASES,
    header_keywords: &["ph", "cec", "nitrogen", "phosphorus", "potassium"],
    indicators: &[
        "soil", "ph", "cec", "organic", "org", "carbon", "exch", "exchangeable", "avail",
        "available", "bray",
    ],
};

static LEAF_TABLE: AliasTable = AliasTable {
    domain: Domain::Leaf,
    aliases: LEAF_ALIASES,
    header_keywords: &["nitrogen", "phosphorus", "potassium", "magnesium", "calcium"],
    indicators: &[
        "leaf", "leaves", "tissue", "foliar", "frond", "boron", "cu", "copper", "zn", "zinc",
        "fe", "iron", "mn", "manganese",
    ],
};

/// Parenthesised groups such as `(mg/kg)` or `(+)`.
static PAREN_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("Invalid paren regex"));

/// Unit tokens laboratories append to column names.
static UNIT_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"mg\s*/\s*kg|mg\s*/\s*l\b|meq\s*/\s*100\s*g|cmol\s*/\s*kg|\bmg\s+kg\b|\bmeq\b|\bppm\b|\bdry\s+matter\b|\bdm\b|%",
    )
    .expect("Invalid unit regex")
});

/// Nutrient ratios (`C/N`, `Ca/Mg`, `K/Mg ratio`). Matched after unit
/// groups are removed, so `mg/kg` never counts.
static RATIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bratio\b|\b(?:ca|mg|cu|zn|fe|mn|na|al|[cnpksb])\s*/\s*(?:ca|mg|cu|zn|fe|mn|na|al|[cnpksb])\b",
    )
    .expect("Invalid ratio regex")
});

impl AliasTable {
    pub fn for_domain(domain: Domain) -> &'static AliasTable {
        match domain {
            Domain::Soil => &SOIL_TABLE,
            Domain::Leaf => &LEAF_TABLE,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Resolve a raw field name to a canonical parameter.
    ///
    /// Exact match, then match after unit/punctuation stripping, then the
    /// first alias whose words appear contiguously in the stripped name.
    /// Ratios of two nutrients never resolve to either nutrient.
    pub fn resolve(&self, raw: &str) -> Option<Parameter> {
        let folded = fold(raw);
        if folded.is_empty() || is_ratio(raw) {
            return None;
        }
        if let Some(p) = self.exact(&folded) {
            return Some(p);
        }

        let stripped = strip_units(raw);
        if stripped.is_empty() {
            return None;
        }
        if let Some(p) = self.exact(&stripped) {
            return Some(p);
        }

        let words: Vec<&str> = stripped.split(' ').collect();
        self.aliases
            .iter()
            .find(|(alias, _)| contains_words(&words, alias))
            .map(|(_, p)| *p)
    }

    /// Exact stages only: used for header columns, where a fuzzy hit on a
    /// title word would misplace the table.
    pub fn resolve_strict(&self, raw: &str) -> Option<Parameter> {
        let folded = fold(raw);
        self.exact(&folded).or_else(|| self.exact(&strip_units(raw)))
    }

    /// True when a whitespace token is one of the domain's header keywords.
    pub fn is_header_keyword(&self, token: &str) -> bool {
        let bare = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        self.header_keywords.contains(&bare.as_str())
    }

    /// Number of distinct domain indicator words in `text`.
    pub fn indicator_count(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        let mut found: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| self.indicators.contains(word))
            .collect();
        found.sort_unstable();
        found.dedup();
        found.len()
    }

    fn exact(&self, name: &str) -> Option<Parameter> {
        if name.is_empty() {
            return None;
        }
        self.domain
            .parameters()
            .iter()
            .find(|p| p.key().eq_ignore_ascii_case(name))
            .copied()
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| *alias == name)
                    .map(|(_, p)| *p)
            })
    }
}

fn is_ratio(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    let no_parens = PAREN_GROUP.replace_all(&lower, " ");
    let no_units = UNIT_TOKENS.replace_all(&no_parens, " ");
    RATIO.is_match(&no_units)
}

/// Lower-case and collapse whitespace.
fn fold(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Drop parenthesised groups, unit tokens and punctuation.
fn strip_units(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let no_parens = PAREN_GROUP.replace_all(&lower, " ");
    let spaced = no_parens.replace('_', " ");
    let no_units = UNIT_TOKENS.replace_all(&spaced, " ");
    no_units
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_words(words: &[&str], alias: &str) -> bool {
    let needle: Vec<&str> = alias.split(' ').collect();
    needle.len() <= words.len() && words.windows(needle.len()).any(|w| w == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soil(name: &str) -> Option<Parameter> {
        AliasTable::for_domain(Domain::Soil).resolve(name)
    }

    fn leaf(name: &str) -> Option<Parameter> {
        AliasTable::for_domain(Domain::Leaf).resolve(name)
    }

    #[test]
    fn exact_matches_ignore_case() {
        assert_eq!(soil("pH"), Some(Parameter::SoilPh));
        assert_eq!(soil("CEC"), Some(Parameter::SoilCec));
        assert_eq!(leaf("Nitrogen"), Some(Parameter::LeafNitrogen));
    }

    #[test]
    fn canonical_keys_resolve_to_themselves() {
        for domain in [Domain::Soil, Domain::Leaf] {
            let table = AliasTable::for_domain(domain);
            for p in domain.parameters() {
                assert_eq!(table.resolve(p.key()), Some(*p), "key {}", p.key());
            }
        }
    }

    #[test]
    fn units_and_punctuation_are_stripped() {
        assert_eq!(soil("N (%)"), Some(Parameter::SoilNitrogen));
        assert_eq!(soil("Org. C (%)"), Some(Parameter::SoilOrganicCarbon));
        assert_eq!(soil("Total P (mg/kg)"), Some(Parameter::SoilTotalPhosphorus));
        assert_eq!(soil("Avail P (mg/kg)"), Some(Parameter::SoilAvailablePhosphorus));
        assert_eq!(soil("Exch. K (meq%)"), Some(Parameter::SoilExchangeablePotassium));
        assert_eq!(soil("Exch. Mg (meq%)"), Some(Parameter::SoilExchangeableMagnesium));
        assert_eq!(soil("C.E.C meq%"), Some(Parameter::SoilCec));
        assert_eq!(soil("CEC (cmol(+)/kg)"), Some(Parameter::SoilCec));
        assert_eq!(leaf("B (mg/kg)"), Some(Parameter::LeafBoron));
        assert_eq!(leaf("Mg (%)"), Some(Parameter::LeafMagnesium));
        assert_eq!(leaf("K_%"), Some(Parameter::LeafPotassium));
    }

    #[test]
    fn specific_aliases_win_over_general_ones() {
        assert_eq!(soil("available phosphorus p"), Some(Parameter::SoilAvailablePhosphorus));
        assert_eq!(soil("total phosphorus"), Some(Parameter::SoilTotalPhosphorus));
        assert_eq!(soil("Exchangeable Potassium (meq/100g)"), Some(Parameter::SoilExchangeablePotassium));
        assert_eq!(soil("soil organic carbon content"), Some(Parameter::SoilOrganicCarbon));
    }

    #[test]
    fn word_matching_does_not_fire_inside_words() {
        assert_eq!(soil("Sample ID"), None);
        assert_eq!(soil("Farm"), None);
        assert_eq!(leaf("Lab No."), None);
        // "ph" must not be read as soil "p"
        assert_eq!(soil("ph"), Some(Parameter::SoilPh));
    }

    #[test]
    fn resolve_is_total() {
        for raw in ["", "   ", "()", "%", "\u{0}", "土壌", "mg/kg"] {
            let _ = soil(raw);
            let _ = leaf(raw);
        }
        assert_eq!(soil(""), None);
        assert_eq!(soil("%"), None);
    }

    #[test]
    fn nutrient_ratios_resolve_to_nothing() {
        for name in ["C/N", "C/N ratio", "c / n", "K/Mg ratio", "Ca/Mg", "Ca:Mg ratio"] {
            assert_eq!(soil(name), None, "{name}");
        }
        assert_eq!(leaf("N/P"), None);
        assert_eq!(leaf("Fe/Mn"), None);
    }

    #[test]
    fn unit_slashes_are_not_ratios() {
        assert_eq!(soil("Total P (mg/kg)"), Some(Parameter::SoilTotalPhosphorus));
        assert_eq!(soil("Avail P mg/kg"), Some(Parameter::SoilAvailablePhosphorus));
        assert_eq!(soil("CEC (cmol(+)/kg)"), Some(Parameter::SoilCec));
        assert_eq!(leaf("Zn mg/kg"), Some(Parameter::LeafZinc));
    }

    #[test]
    fn strict_resolution_skips_fuzzy_stage() {
        let table = AliasTable::for_domain(Domain::Soil);
        assert_eq!(table.resolve_strict("Exch. K (meq%)"), Some(Parameter::SoilExchangeablePotassium));
        assert_eq!(table.resolve_strict("Soil P status"), None);
        assert_eq!(table.resolve("Soil P status"), Some(Parameter::SoilAvailablePhosphorus));
    }

    #[test]
    fn header_keywords_match_whole_tokens() {
        let table = AliasTable::for_domain(Domain::Soil);
        assert!(table.is_header_keyword("pH"));
        assert!(table.is_header_keyword("CEC,"));
        assert!(!table.is_header_keyword("Graph"));
        let leaf = AliasTable::for_domain(Domain::Leaf);
        assert!(leaf.is_header_keyword("Magnesium"));
        assert!(!leaf.is_header_keyword("pH"));
    }

    #[test]
    fn indicator_words_are_counted_once() {
        let soil = AliasTable::for_domain(Domain::Soil);
        assert_eq!(soil.indicator_count("pH pH Org. C (%) CEC (meq%)"), 3);
        assert_eq!(soil.indicator_count("Graph phosphate"), 0);
        let leaf = AliasTable::for_domain(Domain::Leaf);
        assert_eq!(leaf.indicator_count("Leaf analysis: Zn (mg/kg) Fe (mg/kg) zn"), 3);
    }

    #[test]
    fn alias_lists_only_name_domain_parameters() {
        for domain in [Domain::Soil, Domain::Leaf] {
            for (alias, p) in AliasTable::for_domain(domain).aliases {
                assert_eq!(p.domain(), domain, "alias {alias}");
                assert_eq!(*alias, alias.to_lowercase());
            }
        }
    }
}

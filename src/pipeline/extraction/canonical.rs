//! Raw samples → canonical samples.
//!
//! `canonicalize` maps field names onto the domain's parameter set and
//! fills the gaps with 0.0. `assemble_samples` then fixes up identifiers
//! so every sample in a result has a distinct, clean ID.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::aliases::AliasTable;
use super::coerce::coerce;
use super::types::{CanonicalValues, Domain, FieldValue, Parameter, RawSample, Sample};

/// Value used for parameters a report did not mention.
pub const MISSING_VALUE: f64 = 0.0;

/// One raw sample after name resolution, before ID assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSample {
    pub id: Option<String>,
    pub canonical: CanonicalValues,
    pub extra: BTreeMap<String, FieldValue>,
    /// Parameters that got `MISSING_VALUE` because nothing mapped to them.
    pub defaulted: Vec<Parameter>,
}

/// Resolve every field of `raw` against the domain's aliases.
///
/// A numeric value fills its parameter's slot when the slot is still
/// empty, or when the value is non-zero. Fields that do not resolve, or
/// resolve but hold text, are copied into `extra` under their original
/// name.
pub fn canonicalize(raw: RawSample, aliases: &AliasTable) -> CanonicalSample {
    let mut slots: Vec<(Parameter, Option<f64>)> = aliases
        .domain()
        .parameters()
        .iter()
        .map(|p| (*p, None))
        .collect();
    let mut extra = BTreeMap::new();

    for (name, value) in raw.fields {
        let resolved = aliases.resolve(&name).and_then(|parameter| {
            coerce(value.clone()).as_number().map(|n| (parameter, n))
        });
        let Some((parameter, number)) = resolved else {
            extra.insert(name, value);
            continue;
        };
        if let Some(slot) = slots.iter_mut().find(|(p, _)| *p == parameter) {
            if slot.1.is_none() || number != 0.0 {
                slot.1 = Some(number);
            }
        }
    }

    let defaulted: Vec<Parameter> = slots
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(p, _)| *p)
        .collect();
    let canonical = CanonicalValues::from_ordered(
        slots
            .into_iter()
            .map(|(p, v)| (p, v.unwrap_or(MISSING_VALUE)))
            .collect(),
    );

    CanonicalSample {
        id: raw.id,
        canonical,
        extra,
        defaulted,
    }
}

/// Canonicalize a strategy's output and assign final sample IDs.
///
/// IDs are trimmed, inner whitespace becomes `_`, trailing punctuation is
/// dropped and lab codes are upper-cased. A sample without an ID gets
/// `Sample_<n>` from its 1-based position. Collisions get `_2`, `_3`, ...
/// Each sample with defaulted parameters adds one diagnostic line.
pub fn assemble_samples(
    raw: Vec<RawSample>,
    aliases: &AliasTable,
    diagnostics: &mut Vec<String>,
) -> Vec<Sample> {
    let domain = aliases.domain();
    let mut seen: HashSet<String> = HashSet::new();
    let mut samples = Vec::with_capacity(raw.len());

    for (index, raw_sample) in raw.into_iter().enumerate() {
        let canonical = canonicalize(raw_sample, aliases);
        let base = canonical
            .id
            .as_deref()
            .and_then(|id| normalize_id(id, domain))
            .unwrap_or_else(|| format!("Sample_{}", index + 1));

        let mut id = base.clone();
        let mut suffix = 2;
        while seen.contains(&id) {
            id = format!("{base}_{suffix}");
            suffix += 1;
        }
        seen.insert(id.clone());

        if !canonical.defaulted.is_empty() {
            let names: Vec<&str> = canonical.defaulted.iter().map(|p| p.key()).collect();
            diagnostics.push(format!(
                "{id}: {} of {} parameters not found, defaulted to {MISSING_VALUE:.1} ({})",
                names.len(),
                domain.parameters().len(),
                names.join(", ")
            ));
        }
        debug!(id = %id, extra = canonical.extra.len(), "Sample assembled");

        samples.push(Sample {
            id,
            canonical: canonical.canonical,
            extra: canonical.extra,
        });
    }
    samples
}

fn normalize_id(raw: &str, domain: Domain) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '.'));
    let joined = trimmed.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        return None;
    }
    if is_lab_code(&joined, domain) {
        return Some(joined.to_uppercase());
    }
    Some(joined)
}

/// `s001`, `S218/25`: domain prefix followed by digits.
fn is_lab_code(id: &str, domain: Domain) -> bool {
    let mut chars = id.chars();
    let prefixed = chars
        .next()
        .is_some_and(|c| c.to_ascii_uppercase() == domain.id_prefix());
    let rest = chars.as_str();
    prefixed
        && rest.starts_with(|c: char| c.is_ascii_digit())
        && rest.chars().all(|c| c.is_ascii_digit() || c == '/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soil_table() -> &'static AliasTable {
        AliasTable::for_domain(Domain::Soil)
    }

    fn raw(id: Option<&str>, fields: &[(&str, FieldValue)]) -> RawSample {
        let mut sample = RawSample::new(id.map(str::to_string));
        for (name, value) in fields {
            sample.insert(*name, value.clone());
        }
        sample
    }

    #[test]
    fn table_labels_map_to_canonical_keys() {
        let sample = canonicalize(
            raw(
                Some("S001"),
                &[
                    ("pH", 4.74.into()),
                    ("N (%)", 0.08.into()),
                    ("Org. C (%)", 0.55.into()),
                    ("Total P (mg/kg)", 30.0.into()),
                    ("Avail P (mg/kg)", 2.0.into()),
                    ("Exch. K (meq%)", 0.06.into()),
                    ("Exch. Ca (meq%)", 0.35.into()),
                    ("Exch. Mg (meq%)", 0.17.into()),
                    ("CEC (meq%)", 2.0.into()),
                ],
            ),
            soil_table(),
        );
        assert!(sample.defaulted.is_empty());
        assert!(sample.extra.is_empty());
        assert_eq!(sample.canonical.get_key("Org_C_%"), Some(0.55));
        assert_eq!(sample.canonical.get(Parameter::SoilTotalPhosphorus), Some(30.0));
        assert_eq!(sample.canonical.get(Parameter::SoilAvailablePhosphorus), Some(2.0));
    }

    #[test]
    fn missing_parameters_default_to_zero() {
        let sample = canonicalize(raw(None, &[("pH", 4.74.into())]), soil_table());
        assert_eq!(sample.canonical.keys().count(), 9);
        assert_eq!(sample.canonical.get_key("CEC_meq%"), Some(0.0));
        assert_eq!(sample.defaulted.len(), 8);
        assert!(!sample.defaulted.contains(&Parameter::SoilPh));
    }

    #[test]
    fn text_values_are_coerced_before_mapping() {
        let sample = canonicalize(raw(None, &[("pH", "4,74".into())]), soil_table());
        assert_eq!(sample.canonical.get(Parameter::SoilPh), Some(4.74));
    }

    #[test]
    fn non_zero_value_wins_over_zero() {
        let sample = canonicalize(
            raw(None, &[("N (%)", 0.08.into()), ("nitrogen", 0.0.into())]),
            soil_table(),
        );
        assert_eq!(sample.canonical.get(Parameter::SoilNitrogen), Some(0.08));

        let sample = canonicalize(
            raw(None, &[("N", 0.0.into()), ("Total N", 0.1.into())]),
            soil_table(),
        );
        assert_eq!(sample.canonical.get(Parameter::SoilNitrogen), Some(0.1));
    }

    #[test]
    fn unmapped_and_textual_fields_go_to_extra() {
        let sample = canonicalize(
            raw(
                None,
                &[
                    ("depth", 30.0.into()),
                    ("N (%)", "n.d.".into()),
                    ("B (mg/kg)", 25.0.into()),
                ],
            ),
            soil_table(),
        );
        assert_eq!(sample.extra.get("depth"), Some(&FieldValue::Number(30.0)));
        assert_eq!(sample.extra.get("N (%)"), Some(&FieldValue::Text("n.d.".into())));
        assert_eq!(sample.extra.get("B (mg/kg)"), Some(&FieldValue::Number(25.0)));
        assert_eq!(sample.canonical.get(Parameter::SoilNitrogen), Some(0.0));
    }

    #[test]
    fn ids_are_cleaned_and_made_unique() {
        let raws = vec![
            raw(Some("  s001 ,"), &[("pH", 4.0.into())]),
            raw(Some("S001"), &[("pH", 5.0.into())]),
            raw(None, &[("pH", 6.0.into())]),
            raw(Some("Plot A"), &[("pH", 7.0.into())]),
            raw(Some("S001"), &[("pH", 8.0.into())]),
        ];
        let mut diagnostics = Vec::new();
        let samples = assemble_samples(raws, soil_table(), &mut diagnostics);
        let ids: Vec<&str> = samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S001", "S001_2", "Sample_3", "Plot_A", "S001_3"]);
    }

    #[test]
    fn blank_ids_are_synthesized() {
        let mut diagnostics = Vec::new();
        let samples = assemble_samples(
            vec![raw(Some("  "), &[("pH", 4.0.into())])],
            soil_table(),
            &mut diagnostics,
        );
        assert_eq!(samples[0].id, "Sample_1");
    }

    #[test]
    fn defaulted_parameters_are_reported() {
        let mut diagnostics = Vec::new();
        assemble_samples(
            vec![raw(Some("S001"), &[("pH", 4.0.into())])],
            soil_table(),
            &mut diagnostics,
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("S001: 8 of 9 parameters not found"));
        assert!(diagnostics[0].contains("CEC_meq%"));
    }

    #[test]
    fn lab_codes_are_uppercased_only_for_own_domain() {
        assert_eq!(normalize_id("s218/25", Domain::Soil).as_deref(), Some("S218/25"));
        assert_eq!(normalize_id("s001", Domain::Leaf).as_deref(), Some("s001"));
        assert_eq!(normalize_id("sample", Domain::Soil).as_deref(), Some("sample"));
    }
}

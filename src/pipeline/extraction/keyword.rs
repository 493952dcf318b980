//! Whole-text keyword scan: one sample, first match per parameter.

use super::coerce::coerce_str;
use super::types::{RawSample, StrategyKind};
use crate::pipeline::strategy::{has_digit, ExtractionStrategy, StrategyInput};

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordStrategy;

impl ExtractionStrategy for KeywordStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    fn applies(&self, input: &StrategyInput<'_>) -> bool {
        has_digit(input.text)
    }

    fn extract(&self, input: &StrategyInput<'_>) -> Vec<RawSample> {
        let lower = input.text.to_lowercase();
        let mut sample = RawSample::new(None);

        for (parameter, re) in input.patterns.keywords(input.domain) {
            if let Some(value) = re.captures(&lower).and_then(|caps| caps.get(1)) {
                sample.insert(parameter.key(), coerce_str(value.as_str()));
            }
        }
        if sample.is_empty() {
            return Vec::new();
        }

        sample.id = Some(
            input
                .patterns
                .find_boundaries(input.domain, input.text)
                .into_iter()
                .next()
                .map_or_else(|| "Sample_1".to_string(), |b| b.id),
        );
        vec![sample]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::types::{Domain, FieldValue};
    use crate::pipeline::strategy::test_support::extract_with;

    #[test]
    fn finds_keywords_anywhere_in_prose() {
        let text = "Results for plot S014. The soil pH was measured as pH 5.2; \
                    organic carbon (%) 1.10 and CEC (cmol(+)/kg) = 7.5.";
        let samples = extract_with(&KeywordStrategy, text, Domain::Soil);
        assert_eq!(samples.len(), 1);
        let sample = &samples[0];
        assert_eq!(sample.id.as_deref(), Some("S014"));
        assert_eq!(sample.get("pH"), Some(&FieldValue::Number(5.2)));
        assert_eq!(sample.get("Org_C_%"), Some(&FieldValue::Number(1.1)));
        assert_eq!(sample.get("CEC_meq%"), Some(&FieldValue::Number(7.5)));
    }

    #[test]
    fn defaults_id_when_no_marker() {
        let samples = extract_with(&KeywordStrategy, "boron 25 zinc 35", Domain::Leaf);
        assert_eq!(samples[0].id.as_deref(), Some("Sample_1"));
        assert_eq!(samples[0].get("Zn_mg_kg"), Some(&FieldValue::Number(35.0)));
    }

    #[test]
    fn no_keywords_no_sample() {
        let samples = extract_with(
            &KeywordStrategy,
            "S001 4.74 0.08 0.55 30 2 0.06 0.35 0.17 2.0",
            Domain::Soil,
        );
        assert!(samples.is_empty());
    }
}

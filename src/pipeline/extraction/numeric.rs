//! Last resort: assign bare numbers to parameters in domain order.
//!
//! Only meaningful when the lab printed values in the canonical column
//! order with the header lost. Produces at most one sample.

use tracing::debug;

use super::coerce::try_coerce;
use super::types::{FieldValue, RawSample, StrategyKind};
use crate::pipeline::strategy::{has_digit, ExtractionStrategy, StrategyInput};

#[derive(Debug, Default, Clone, Copy)]
pub struct NumericFallbackStrategy;

impl ExtractionStrategy for NumericFallbackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NumericFallback
    }

    fn applies(&self, input: &StrategyInput<'_>) -> bool {
        has_digit(input.text)
    }

    fn extract(&self, input: &StrategyInput<'_>) -> Vec<RawSample> {
        // digits inside a sample code (`S218/25`) are not measurements
        let markers = input.patterns.find_boundaries(input.domain, input.text);
        let numbers: Vec<f64> = input
            .patterns
            .number()
            .find_iter(input.text)
            .filter(|m| !markers.iter().any(|b| m.start() >= b.start && m.start() < b.end))
            .filter_map(|m| try_coerce(m.as_str()).ok())
            .collect();
        if numbers.is_empty() {
            return Vec::new();
        }

        let parameters = input.domain.parameters();
        if numbers.len() != parameters.len() {
            debug!(
                domain = %input.domain,
                found = numbers.len(),
                expected = parameters.len(),
                "Positional assignment with mismatched value count"
            );
        }

        let mut sample = RawSample::new(Some(format!("{}_Sample_1", input.domain)));
        for (parameter, value) in parameters.iter().zip(numbers) {
            sample.insert(parameter.key(), FieldValue::Number(value));
        }
        vec![sample]
    }
}

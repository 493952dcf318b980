//! Line-oriented key/value extraction.
//!
//! Walks the document line by line. Sample-ID markers open a new sample;
//! `name: value`, `name = value` and `name value` pairs between markers
//! accumulate into the current one.

use tracing::debug;

use super::coerce::coerce_str;
use super::patterns::PairForm;
use super::types::{RawSample, StrategyKind};
use crate::pipeline::strategy::{has_digit, ExtractionStrategy, StrategyInput};

#[derive(Debug, Default, Clone, Copy)]
pub struct LineKvStrategy;

impl ExtractionStrategy for LineKvStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LineKv
    }

    fn applies(&self, input: &StrategyInput<'_>) -> bool {
        has_digit(input.text)
    }

    fn extract(&self, input: &StrategyInput<'_>) -> Vec<RawSample> {
        let mut samples = Vec::new();
        let mut current = RawSample::new(None);

        for line in input.lines {
            let boundaries = input.patterns.find_boundaries(input.domain, line);
            let mut cursor = 0;
            for boundary in &boundaries {
                scan_segment(input, &line[cursor..boundary.start], &mut current);
                let next = RawSample::new(Some(boundary.id.clone()));
                finish(&mut samples, std::mem::replace(&mut current, next));
                cursor = boundary.end;
            }
            scan_segment(input, &line[cursor..], &mut current);
        }
        finish(&mut samples, current);

        debug!(domain = %input.domain, samples = samples.len(), "Line key/value scan done");
        samples
    }
}

/// Keep a sample only if it captured at least one field.
fn finish(samples: &mut Vec<RawSample>, sample: RawSample) {
    if sample.is_empty() {
        if let Some(id) = &sample.id {
            debug!(id = %id, "Sample marker without fields dropped");
        }
        return;
    }
    samples.push(sample);
}

/// Apply every pair form to one boundary-free stretch of text.
///
/// Forms run in priority order; a field name captured by an earlier form
/// in this segment is not overwritten by a later one. Names that resolve
/// to a parameter are stored under its canonical key.
fn scan_segment(input: &StrategyInput<'_>, segment: &str, sample: &mut RawSample) {
    if segment.trim().is_empty() {
        return;
    }

    let mut captured: Vec<(String, PairForm)> = Vec::new();
    for (form, re) in input.patterns.pair_forms() {
        for caps in re.captures_iter(segment) {
            let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let name = name.as_str().trim().to_lowercase();
            let key = match input.aliases.resolve(&name) {
                Some(parameter) => parameter.key().to_string(),
                None if form.keeps_unmapped() => name,
                None => continue,
            };

            let taken_by_earlier_form = captured.iter().any(|(k, f)| *k == key && f != form);
            if taken_by_earlier_form {
                continue;
            }
            sample.insert(key.clone(), coerce_str(value.as_str()));
            captured.push((key, *form));
        }
    }
}

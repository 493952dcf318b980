//! Header-plus-rows table extraction.
//!
//! OCR flattens lab tables into whitespace-separated text. A header line
//! is found first, its tokens are regrouped into column labels (`N (%)`,
//! `Exch. K (meq%)`), and the following lines are zipped against those
//! columns. Some OCR engines emit header and every row on a single line;
//! rows are then split out of the header line at sample-ID markers.

use tracing::debug;

use super::coerce::{coerce_str, is_numeric_token};
use super::patterns::{BoundaryMatch, PairForm};
use super::types::{FieldValue, Parameter, RawSample, StrategyKind};
use crate::pipeline::strategy::{has_digit, ExtractionStrategy, StrategyInput};

/// Words that qualify the column name after them (`Total P`, `Exch. K`).
const QUALIFIERS: &[&str] = &[
    "total",
    "avail",
    "available",
    "av",
    "exch",
    "exchangeable",
    "org",
    "organic",
    "bray",
];

/// Tokens that complete a `Sample`/`Lab` column name.
const ID_SUFFIXES: &[&str] = &["id", "no", "number", "#", "code"];

/// Column labels that hold the sample identifier, punctuation stripped.
const ID_LABELS: &[&str] = &[
    "sample",
    "sample id",
    "sample no",
    "sample number",
    "sample code",
    "lab",
    "lab id",
    "lab no",
    "lab number",
    "no",
    "id",
    "code",
];

#[derive(Debug, Clone, PartialEq)]
struct Column {
    label: String,
    parameter: Option<Parameter>,
    is_id: bool,
}

#[derive(Debug)]
struct Header<'a> {
    line: usize,
    columns: Vec<Column>,
    inline_rows: Vec<Row<'a>>,
}

/// One candidate data row. `marker` is set when the row was cut out of a
/// longer line at a sample-ID marker; `body` then excludes the marker.
#[derive(Debug, Clone, PartialEq)]
struct Row<'a> {
    marker: Option<String>,
    source: &'a str,
    body: &'a str,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TableStrategy;

impl ExtractionStrategy for TableStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Table
    }

    fn applies(&self, input: &StrategyInput<'_>) -> bool {
        has_digit(input.text)
    }

    fn extract(&self, input: &StrategyInput<'_>) -> Vec<RawSample> {
        let Some(header) = find_header(input) else {
            debug!(domain = %input.domain, "No table header found");
            return Vec::new();
        };
        debug!(
            domain = %input.domain,
            line = header.line,
            columns = header.columns.len(),
            inline_rows = header.inline_rows.len(),
            "Table header detected"
        );

        let following = input.lines[header.line + 1..]
            .iter()
            .flat_map(|line| split_rows(input, line));

        header
            .inline_rows
            .into_iter()
            .chain(following)
            .take(input.config.max_table_rows)
            .filter(|row| row.source.chars().count() > input.config.min_row_chars)
            .filter_map(|row| parse_row(input, &header.columns, &row))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Header detection
// ═══════════════════════════════════════════════════════════

fn find_header<'a>(input: &StrategyInput<'a>) -> Option<Header<'a>> {
    input
        .lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| header_at(input, index, line))
}

fn header_at<'a>(input: &StrategyInput<'a>, index: usize, line: &'a str) -> Option<Header<'a>> {
    let boundaries = input.patterns.find_boundaries(input.domain, line);
    let header_end = boundaries.first().map_or(line.len(), |b| b.start);
    let header_text = &line[..header_end];

    let tokens: Vec<&str> = header_text.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    // `Nitrogen: 2.3` is a key/value line, not a header
    let labelled_pair = input
        .patterns
        .pair_forms()
        .iter()
        .any(|(form, re)| *form != PairForm::Spaced && re.is_match(header_text));
    if labelled_pair {
        return None;
    }

    let numeric = tokens.iter().filter(|t| is_numeric_token(t)).count();
    if numeric as f32 / tokens.len() as f32 > input.config.max_header_numeric_ratio {
        debug!(
            line = index,
            numeric,
            tokens = tokens.len(),
            "Mostly numeric header candidate skipped"
        );
        return None;
    }

    let columns = header_columns(input, &tokens);
    if columns.len() < 2 || columns.iter().all(|c| c.parameter.is_none()) {
        return None;
    }

    let has_keyword = tokens.iter().any(|t| input.aliases.is_header_keyword(t));
    let strict = columns
        .iter()
        .filter(|c| input.aliases.resolve_strict(&c.label).is_some())
        .count();
    if !has_keyword && strict < input.config.min_resolved_header_columns {
        return None;
    }

    Some(Header {
        line: index,
        columns,
        inline_rows: marker_rows(line, &boundaries),
    })
}

/// Group header tokens into column labels, then drop title words that
/// precede the first identifier or parameter column.
fn header_columns(input: &StrategyInput<'_>, tokens: &[&str]) -> Vec<Column> {
    let labels = group_tokens(tokens);
    let Some(start) = labels
        .iter()
        .position(|l| is_id_label(l) || input.aliases.resolve_strict(l).is_some())
    else {
        return Vec::new();
    };

    labels[start..]
        .iter()
        .map(|label| {
            let is_id = is_id_label(label);
            Column {
                label: label.clone(),
                parameter: if is_id { None } else { input.aliases.resolve(label) },
                is_id,
            }
        })
        .collect()
}

/// Merge unit groups into the preceding label and qualifiers into the
/// following one: `N (%)`, `Org. C (%)`, `Sample ID`.
fn group_tokens(tokens: &[&str]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut open = 0i32;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        if let Some(last) = labels.last_mut() {
            if open > 0 || token.starts_with('(') {
                last.push(' ');
                last.push_str(token);
                open = (open + paren_balance(token)).max(0);
                i += 1;
                continue;
            }
        }

        let mut label = token.to_string();
        open = paren_balance(token).max(0);
        if open == 0 && joins_next(token, tokens.get(i + 1).copied()) {
            let next = tokens[i + 1];
            label.push(' ');
            label.push_str(next);
            open = paren_balance(next).max(0);
            i += 1;
        }
        labels.push(label);
        i += 1;
    }
    labels
}

fn joins_next(token: &str, next: Option<&str>) -> bool {
    let Some(next) = next else {
        return false;
    };
    if next.starts_with('(') {
        return false;
    }

    let bare = token.trim_end_matches('.').to_lowercase();
    if bare == "sample" || bare == "lab" {
        let suffix = next.trim_end_matches(['.', ':']).to_lowercase();
        return ID_SUFFIXES.contains(&suffix.as_str());
    }
    if ID_SUFFIXES.contains(&bare.as_str()) {
        return false;
    }
    QUALIFIERS.contains(&bare.as_str()) || is_abbreviation(token)
}

/// `Org.`, `Exch.`: an alphabetic stem of two or more letters and a dot.
fn is_abbreviation(token: &str) -> bool {
    token
        .strip_suffix('.')
        .is_some_and(|stem| stem.chars().count() >= 2 && stem.chars().all(char::is_alphabetic))
}

fn paren_balance(token: &str) -> i32 {
    token.chars().fold(0, |acc, c| match c {
        '(' => acc + 1,
        ')' => acc - 1,
        _ => acc,
    })
}

fn is_id_label(label: &str) -> bool {
    let bare = label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    ID_LABELS.contains(&bare.as_str())
}

// ═══════════════════════════════════════════════════════════
// Rows
// ═══════════════════════════════════════════════════════════

/// Cut a line into one row per sample-ID marker.
fn marker_rows<'a>(line: &'a str, boundaries: &[BoundaryMatch]) -> Vec<Row<'a>> {
    boundaries
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let end = boundaries.get(i + 1).map_or(line.len(), |next| next.start);
            Row {
                marker: Some(b.id.clone()),
                source: line[b.start..end].trim(),
                body: &line[b.end..end],
            }
        })
        .collect()
}

/// A data line is one row unless it carries several sample markers.
fn split_rows<'a>(input: &StrategyInput<'_>, line: &'a str) -> Vec<Row<'a>> {
    let boundaries = input.patterns.find_boundaries(input.domain, line);
    if boundaries.len() < 2 {
        return vec![Row {
            marker: None,
            source: line,
            body: line,
        }];
    }

    let head = line[..boundaries[0].start].trim();
    let mut rows = Vec::with_capacity(boundaries.len() + 1);
    if !head.is_empty() {
        rows.push(Row {
            marker: None,
            source: head,
            body: head,
        });
    }
    rows.extend(marker_rows(line, &boundaries));
    rows
}

/// Zip a row's cells onto the header columns.
///
/// Accepted when the row has at least `columns - 1` cells (a missing ID
/// cell is tolerated) and at least one numeric value lands under a column
/// that resolves to a parameter.
fn parse_row(input: &StrategyInput<'_>, columns: &[Column], row: &Row<'_>) -> Option<RawSample> {
    let tokens: Vec<&str> = row.body.split_whitespace().collect();
    let has_id_column = columns.first().is_some_and(|c| c.is_id);
    let value_columns = if has_id_column { &columns[1..] } else { columns };

    let (id, values): (Option<String>, &[&str]) = match (&row.marker, tokens.first()) {
        (Some(marker), _) => (Some(marker.clone()), &tokens[..]),
        (None, Some(first)) if input.patterns.is_boundary_token(input.domain, first) => {
            (Some(first.to_string()), &tokens[1..])
        }
        (None, Some(first)) if has_id_column && tokens.len() >= columns.len() => {
            (Some(first.to_string()), &tokens[1..])
        }
        _ => (None, &tokens[..]),
    };

    let cells = values.len() + usize::from(id.is_some());
    if values.is_empty() || cells + 1 < columns.len() {
        return None;
    }

    let mut sample = RawSample::new(id);
    let mut mapped = 0;
    for (column, token) in value_columns.iter().zip(values) {
        let value = coerce_str(token);
        if column.parameter.is_some() && matches!(value, FieldValue::Number(_)) {
            mapped += 1;
        }
        sample.insert(column.label.clone(), value);
    }

    if mapped == 0 {
        debug!(cells = tokens.len(), "Row has no numeric parameter values");
        return None;
    }
    Some(sample)
}

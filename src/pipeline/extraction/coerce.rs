//! Best-effort numeric coercion of OCR cell text.
//!
//! `try_coerce` reports why a token is not a number; `coerce` wraps it and
//! hands back the original value on failure, so a field is never lost.

use super::types::FieldValue;
use super::CoercionError;

/// Units laboratories print after a value. Compared lower-cased with
/// whitespace and surrounding parentheses removed.
const UNIT_SUFFIXES: &[&str] = &[
    "%",
    "%dm",
    "cmol(+)/kg",
    "cmol/kg",
    "g/kg",
    "meq",
    "meq%",
    "meq/100g",
    "mg/kg",
    "mg/kgdm",
    "mg/l",
    "mgkg",
    "ppm",
];

/// Parse a token as a number, tolerating inequality prefixes, thousands
/// separators, a decimal comma and a trailing unit.
pub fn try_coerce(raw: &str) -> Result<f64, CoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoercionError::Empty);
    }

    let body = trimmed
        .trim_start_matches(['<', '>', '\u{2264}', '\u{2265}', '~', '='])
        .trim_start();
    let (number, suffix) = split_numeric_prefix(body);

    if !number.chars().any(|c| c.is_ascii_digit()) {
        return Err(CoercionError::NotNumeric(trimmed.to_string()));
    }
    if !is_unit_suffix(suffix) {
        return Err(CoercionError::TrailingText(trimmed.to_string()));
    }

    let normalized = normalize_separators(number)
        .ok_or_else(|| CoercionError::NotNumeric(trimmed.to_string()))?;
    let value: f64 = normalized
        .parse()
        .map_err(|_| CoercionError::NotNumeric(trimmed.to_string()))?;

    if !value.is_finite() {
        return Err(CoercionError::NonFinite);
    }
    Ok(value)
}

/// Coerce a captured value, returning it unchanged when it is not numeric.
pub fn coerce(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Number(_) => value,
        FieldValue::Text(text) => match try_coerce(&text) {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Text(text),
        },
    }
}

/// Coerce a borrowed token.
pub fn coerce_str(token: &str) -> FieldValue {
    coerce(FieldValue::Text(token.to_string()))
}

/// True when the token would coerce to a number.
pub fn is_numeric_token(token: &str) -> bool {
    try_coerce(token).is_ok()
}

/// Split `"1,234.5 mg/kg"` into `("1,234.5", "mg/kg")`.
fn split_numeric_prefix(s: &str) -> (&str, &str) {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let sign = i == 0 && (c == '-' || c == '+');
        if c.is_ascii_digit() || c == '.' || c == ',' || sign {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    (&s[..end], s[end..].trim())
}

fn is_unit_suffix(suffix: &str) -> bool {
    if suffix.is_empty() {
        return true;
    }
    let compact: String = suffix
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let unwrapped = compact
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(&compact);
    UNIT_SUFFIXES.contains(&unwrapped)
}

/// Resolve `,` as thousands separator or decimal comma. `None` when the
/// grouping is inconsistent (e.g. `1,23,4`).
fn normalize_separators(number: &str) -> Option<String> {
    let number = number.trim_end_matches(',');
    if !number.contains(',') {
        return Some(number.to_string());
    }
    if number.contains('.') {
        return Some(number.replace(',', ""));
    }

    let parts: Vec<&str> = number.split(',').collect();
    let head = parts[0].trim_start_matches(['-', '+']);
    let grouped = !head.is_empty()
        && head.len() <= 3
        && parts[1..].iter().all(|p| p.len() == 3);
    if grouped {
        return Some(parts.concat());
    }
    if parts.len() == 2 {
        return Some(format!("{}.{}", parts[0], parts[1]));
    }
    None
}

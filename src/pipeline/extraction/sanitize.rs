//! Text cleanup applied before any strategy sees OCR output.

/// Strip control characters OCR engines leak into their output.
///
/// Line breaks and tabs survive; table rules (`|`, box-drawing bars) and
/// non-breaking spaces become plain spaces so cells split on whitespace.
pub fn sanitize_text(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(c),
            '|' | '\u{2502}' | '\u{00A6}' | '\u{00A0}' | '\u{2007}' | '\u{202F}' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Split OCR text into trimmed, non-empty lines.
///
/// Accepts `\n`, `\r\n` and bare `\r` line breaks.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    sanitize_text(raw)
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

//! Locale-tolerant numeric parsing and fixed-precision formatting.

/// Remove grouping and map the decimal separator to `.`.
///
/// When both `,` and `.` occur, the last one is the decimal separator and the
/// other is grouping. A single separator character occurring once is decimal;
/// occurring several times it is grouping. Spaces are always grouping.
fn canonical_number(value: &str) -> Option<String> {
    let compact: String = value
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if compact.is_empty() {
        return None;
    }

    let last_comma = compact.rfind(',');
    let last_dot = compact.rfind('.');
    let decimal = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => Some(if comma > dot { ',' } else { '.' }),
        (Some(_), None) if compact.matches(',').count() == 1 => Some(','),
        (None, Some(_)) if compact.matches('.').count() == 1 => Some('.'),
        _ => None,
    };

    let mut out = String::with_capacity(compact.len());
    let mut seen_decimal = false;
    for (idx, ch) in compact.char_indices() {
        match ch {
            ',' | '.' => {
                let is_decimal = Some(ch) == decimal
                    && Some(idx) == if ch == ',' { last_comma } else { last_dot };
                if is_decimal {
                    seen_decimal = true;
                    out.push('.');
                }
            }
            '0'..='9' | '+' | '-' | 'e' | 'E' => out.push(ch),
            _ => return None,
        }
    }
    if seen_decimal && out == "." {
        return None;
    }
    Some(out)
}

/// Parse a float with comma or dot decimal separators. Rejects non-finite
/// values and anything that is not plain numeric text.
pub fn parse_float(value: &str) -> Option<f64> {
    let canonical = canonical_number(value)?;
    canonical
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

/// Parse an integer. Float text without a fractional part (`"12.0"`) is
/// accepted.
pub fn parse_int(value: &str) -> Option<i64> {
    let canonical = canonical_number(value)?;
    if let Ok(parsed) = canonical.parse::<i64>() {
        return Some(parsed);
    }
    let parsed = canonical.parse::<f64>().ok()?;
    let in_range = parsed >= i64::MIN as f64 && parsed < i64::MAX as f64;
    if parsed.is_finite() && parsed.fract() == 0.0 && in_range {
        Some(parsed as i64)
    } else {
        None
    }
}

/// Format with exactly `decimals` fraction digits. Non-finite values format
/// as an empty string and negative zero loses its sign.
pub fn format_fixed(value: f64, decimals: u8) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let precision = usize::from(decimals);
    let formatted = format!("{value:.precision$}");
    match formatted.strip_prefix('-') {
        Some(unsigned) if unsigned.chars().all(|ch| ch == '0' || ch == '.') => {
            unsigned.to_string()
        }
        _ => formatted,
    }
}

/// Text form of a number read from a typed source (JSON, spreadsheets):
/// integral values print without a fraction.
pub fn number_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

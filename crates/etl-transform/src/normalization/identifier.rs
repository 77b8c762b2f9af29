/// Normalize an identifier token.
///
/// Ids exported through spreadsheets often arrive as float text (`"1234.0"`);
/// the zero fraction is dropped. Allowed characters are letters, digits and
/// `-_./`.
pub fn normalize_identifier(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let token = strip_zero_fraction(trimmed);
    let valid = token
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/'));
    valid.then(|| token.to_string())
}

fn strip_zero_fraction(value: &str) -> &str {
    let Some(pos) = value.rfind(['.', ',']) else {
        return value;
    };
    let (whole, fraction) = (&value[..pos], &value[pos + 1..]);
    let numeric_whole = !whole.is_empty() && whole.bytes().all(|b| b.is_ascii_digit());
    let zero_fraction = !fraction.is_empty() && fraction.bytes().all(|b| b == b'0');
    if numeric_whole && zero_fraction {
        whole
    } else {
        value
    }
}

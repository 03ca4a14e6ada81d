use serde_json::Value;

/// Converts a loosely-typed provider value into a finite number.
///
/// Strings are stripped of everything except digits, `.` and `-` before parsing,
/// so currency-formatted values such as `"$1,234.50"` are accepted.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()),
        Value::String(raw) => parse_loose(raw),
        _ => None,
    }
}

pub(crate) fn parse_loose(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Renders scalar provider values as text. Objects and arrays yield `None`.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

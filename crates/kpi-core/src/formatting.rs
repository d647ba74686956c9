use crate::models::Value;

/// Round `value` to `decimals` places, resolving exact ties to the even
/// neighbour (`0.125 → 0.12`, `0.135 → 0.14`).
///
/// The scaled value is rounded, so the result matches what array libraries
/// produce for `round(decimals)` on the same input.
///
/// # Examples
///
/// ```
/// use kpi_core::formatting::round_to;
///
/// assert_eq!(round_to(66.666_666, 2), 66.67);
/// assert_eq!(round_to(2.5, 0), 2.0);
/// assert_eq!(round_to(-1.5, 0), -2.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `None` if `whole` is zero.
///
/// # Examples
///
/// ```
/// use kpi_core::formatting::percentage;
///
/// assert_eq!(percentage(1.0, 3.0, 2), Some(33.33));
/// assert_eq!(percentage(5.0, 0.0, 2), None);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> Option<f64> {
    if whole == 0.0 {
        return None;
    }
    Some(round_to(part / whole * 100.0, decimal_places))
}

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use kpi_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let rounded = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };

    let grouped = group_thousands(int_part);
    let body = match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    };

    // "-0.00" reads as noise
    if value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", body)
    } else {
        body
    }
}

/// Render a cell for display. Floats get grouping and two decimals;
/// integers and text print unchanged; nulls are empty.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format_number(*v, 2),
        Value::Text(s) => s.clone(),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

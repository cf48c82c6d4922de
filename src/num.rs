//! Number-to-literal formatting shared by scalar, inline and row emission.

use serde_json::Number;

/// Append the TOON literal for a JSON number. Integers keep their integer
/// spelling; floats use the shortest decimal form, with a bare trailing
/// `.0` dropped so integral floats read as integers.
pub(crate) fn push_number(out: &mut String, number: &Number) {
    if let Some(value) = number.as_i64() {
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(value));
        return;
    }
    if let Some(value) = number.as_u64() {
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(value));
        return;
    }
    if let Some(value) = number.as_f64() {
        push_f64(out, value);
        return;
    }
    out.push_str("null");
}

fn push_f64(out: &mut String, value: f64) {
    if !value.is_finite() {
        out.push_str("null");
        return;
    }
    if value == 0.0 {
        out.push('0');
        return;
    }
    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format_finite(value);
    match formatted.strip_suffix(".0") {
        Some(integral) => out.push_str(integral),
        None => out.push_str(formatted),
    }
}

pub(crate) fn format_number(number: &Number) -> String {
    let mut out = String::with_capacity(16);
    push_number(&mut out, number);
    out
}

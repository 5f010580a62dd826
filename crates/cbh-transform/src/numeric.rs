//! Numeric coercion.

/// Coerces a cell to a number, or `None` when nothing numeric remains.
///
/// Every character outside `[0-9.-]` is stripped first, so currency symbols
/// and thousands separators are ignored: `"$1,234"` becomes `1234`.
pub fn coerce_number(value: &str) -> Option<f64> {
    let stripped: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok()
}

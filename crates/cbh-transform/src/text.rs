//! Text concatenation across mapped columns.

/// Delimiter used when a column has none configured.
pub const DEFAULT_DELIMITER: &str = "-";

/// Joins non-empty values, placing each appended value's own delimiter in
/// front of it. Returns `None` when every value is empty.
///
/// The delimiter of the first contributing value is never used.
pub fn concat_columns<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut joined: Option<String> = None;
    for (value, delimiter) in parts {
        if value.is_empty() {
            continue;
        }
        match joined.as_mut() {
            Some(text) => {
                text.push_str(delimiter);
                text.push_str(value);
            }
            None => joined = Some(value.to_string()),
        }
    }
    joined
}

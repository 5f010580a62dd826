//! Flexible collection-date parsing.
//!
//! Cells are matched against an ordered battery of patterns and the first
//! match wins. The battery only extracts components: calendar validity (for
//! example `02/30/2022`) is left to schema validation.
//!
//! `MM/DD/YYYY` is tried before `DD/MM/YYYY`, so a value valid under both
//! readings, such as `03/04/2022`, is read as March 4th. A first component
//! above 12 cannot be a month and falls through to the day-first pattern.

use std::sync::LazyLock;

use cbh_model::DateParts;
use regex::{Captures, Regex};

/// Year assumed when a pattern carries no year component.
pub const DEFAULT_YEAR: i32 = 2022;

/// One entry of the date battery: a regex plus the capture groups holding
/// each component. A component without a group takes its default.
#[derive(Debug)]
pub struct DatePattern {
    pub name: &'static str,
    regex: Regex,
    year: Option<usize>,
    month: Option<usize>,
    day: Option<usize>,
}

impl DatePattern {
    fn new(
        name: &'static str,
        pattern: &str,
        year: Option<usize>,
        month: Option<usize>,
        day: Option<usize>,
    ) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Invalid date pattern regex"),
            year,
            month,
            day,
        }
    }

    /// Extracts date components if the whole value matches.
    pub fn extract(&self, value: &str) -> Option<DateParts> {
        let captures = self.regex.captures(value)?;
        let year = group(&captures, self.year).unwrap_or(DEFAULT_YEAR);
        let month = group(&captures, self.month).unwrap_or(1);
        let day = group(&captures, self.day).unwrap_or(1);
        Some(DateParts::new(year, month, day))
    }
}

fn group<T: std::str::FromStr>(captures: &Captures<'_>, index: Option<usize>) -> Option<T> {
    captures.get(index?)?.as_str().parse().ok()
}

const MONTH: &str = r"(0?[1-9]|1[0-2])";
const DAY: &str = r"(0?[1-9]|[12]\d|3[01])";

static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        DatePattern::new(
            "MM/DD/YYYY",
            &format!(r"^{MONTH}/{DAY}/(\d{{4}})$"),
            Some(3),
            Some(1),
            Some(2),
        ),
        DatePattern::new(
            "DD/MM/YYYY",
            &format!(r"^{DAY}/{MONTH}/(\d{{4}})$"),
            Some(3),
            Some(2),
            Some(1),
        ),
        DatePattern::new(
            "DD.MM.YYYY",
            &format!(r"^{DAY}\.{MONTH}\.(\d{{4}})$"),
            Some(3),
            Some(2),
            Some(1),
        ),
        DatePattern::new(
            "MM.DD.YYYY",
            &format!(r"^{MONTH}\.{DAY}\.(\d{{4}})$"),
            Some(3),
            Some(1),
            Some(2),
        ),
        DatePattern::new(
            "YYYY-MM-DDThh:mm:ss",
            r"^(\d{4})-(\d{2})-(\d{2})(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
            Some(1),
            Some(2),
            Some(3),
        ),
        DatePattern::new("YYYY", r"^(\d{4})$", Some(1), None, None),
        DatePattern::new(
            "YYYY-MM",
            &format!(r"^(\d{{4}})[-/.]{MONTH}$"),
            Some(1),
            Some(2),
            None,
        ),
        DatePattern::new(
            "MM-YYYY",
            &format!(r"^{MONTH}[-/.](\d{{4}})$"),
            Some(2),
            Some(1),
            None,
        ),
    ]
});

/// The battery in priority order.
pub fn date_patterns() -> &'static [DatePattern] {
    &DATE_PATTERNS
}

/// Parses a cell into date components; `None` when no pattern matches.
pub fn parse_date(value: &str) -> Option<DateParts> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parts = DATE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.extract(value));
    if parts.is_none() {
        tracing::trace!("date matched no pattern");
    }
    parts
}

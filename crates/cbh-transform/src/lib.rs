//! Cell coercion for the canonical schema.
//!
//! Every function here is total: malformed input yields `None`, never an
//! error. Schema validation happens later, on the assembled record.
//!
//! - **numeric**: strip-and-parse number coercion
//! - **datetime**: ordered date pattern battery
//! - **text**: delimiter-aware concatenation of several columns

pub mod datetime;
pub mod numeric;
pub mod text;

use cbh_model::{CandidateValue, FieldKind};

pub use datetime::{DEFAULT_YEAR, DatePattern, date_patterns, parse_date};
pub use numeric::coerce_number;
pub use text::{DEFAULT_DELIMITER, concat_columns};

/// Coerces one cell according to a field kind.
///
/// Identifiers are returned as trimmed text; resolving them to canonical ids
/// is the registry's job.
pub fn coerce_cell(kind: FieldKind, raw: &str) -> Option<CandidateValue> {
    match kind {
        FieldKind::Number => coerce_number(raw).map(CandidateValue::Number),
        FieldKind::Date => parse_date(raw).map(CandidateValue::Date),
        FieldKind::Text | FieldKind::Identifier(_) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| CandidateValue::Text(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbh_model::{DateParts, IdKind};

    #[test]
    fn coerce_dispatches_by_kind() {
        assert_eq!(
            coerce_cell(FieldKind::Number, "34"),
            Some(CandidateValue::Number(34.0))
        );
        assert_eq!(
            coerce_cell(FieldKind::Date, "2022"),
            Some(CandidateValue::Date(DateParts::new(2022, 1, 1)))
        );
        assert_eq!(
            coerce_cell(FieldKind::Text, " Serum "),
            Some(CandidateValue::Text("Serum".to_string()))
        );
        assert_eq!(coerce_cell(FieldKind::Identifier(IdKind::Donor), "  "), None);
    }
}

#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::field::FieldKey;

/// The three cross-referenced identifier families.
///
/// Each kind owns its own counter and lookup table; canonical identifiers of
/// different kinds never share a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    Donor,
    Master,
    Sample,
}

impl IdKind {
    pub const ALL: [IdKind; 3] = [IdKind::Donor, IdKind::Master, IdKind::Sample];

    /// Prefix prepended to the counter value of a canonical identifier.
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Donor => "CBHD",
            IdKind::Master => "CBHM",
            IdKind::Sample => "CBHS",
        }
    }

    /// Canonical field that carries this identifier.
    pub fn field(&self) -> FieldKey {
        match self {
            IdKind::Donor => FieldKey::DonorId,
            IdKind::Master => FieldKey::MasterId,
            IdKind::Sample => FieldKey::SampleId,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Donor => "donor",
            IdKind::Master => "master",
            IdKind::Sample => "sample",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "donor" => Ok(IdKind::Donor),
            "master" => Ok(IdKind::Master),
            "sample" => Ok(IdKind::Sample),
            _ => Err(ModelError::UnknownIdKind(s.to_string())),
        }
    }
}

/// A generated identifier of the form `<prefix><counter>`, e.g. `CBHD1000007`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Formats a counter value for `kind`. No zero padding is applied.
    pub fn mint(kind: IdKind, counter: u64) -> Self {
        Self(format!("{}{counter}", kind.prefix()))
    }

    /// Parses an identifier, detecting its kind from the prefix.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let trimmed = value.trim();
        let valid = IdKind::ALL.iter().any(|kind| {
            trimmed
                .strip_prefix(kind.prefix())
                .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        });
        if !valid {
            return Err(ModelError::InvalidCanonicalId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn kind(&self) -> IdKind {
        IdKind::ALL
            .into_iter()
            .find(|kind| self.0.starts_with(kind.prefix()))
            .unwrap_or(IdKind::Donor)
    }

    /// Numeric counter part of the identifier.
    ///
    /// Returns `None` when the digits overflow `u64`.
    pub fn counter(&self) -> Option<u64> {
        self.0[self.kind().prefix().len()..].parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalId> for String {
    fn from(value: CanonicalId) -> Self {
        value.0
    }
}

/// One row of a donor/master/sample lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub kind: IdKind,
    pub external_id: String,
    pub canonical_id: CanonicalId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_uses_kind_prefix_without_padding() {
        assert_eq!(CanonicalId::mint(IdKind::Donor, 1_000_007).as_str(), "CBHD1000007");
        assert_eq!(CanonicalId::mint(IdKind::Master, 5).as_str(), "CBHM5");
        assert_eq!(CanonicalId::mint(IdKind::Sample, 42).as_str(), "CBHS42");
    }

    #[test]
    fn parse_detects_kind_and_counter() {
        let id = CanonicalId::parse("CBHS1000123").unwrap();
        assert_eq!(id.kind(), IdKind::Sample);
        assert_eq!(id.counter(), Some(1_000_123));
    }

    #[test]
    fn parse_rejects_foreign_or_empty_suffix() {
        assert!(CanonicalId::parse("CBHX12").is_err());
        assert!(CanonicalId::parse("CBHD").is_err());
        assert!(CanonicalId::parse("CBHD12a").is_err());
        assert!(CanonicalId::parse("D-1").is_err());
    }

    #[test]
    fn id_kind_round_trips_through_str() {
        for kind in IdKind::ALL {
            assert_eq!(kind.as_str().parse::<IdKind>().unwrap(), kind);
        }
    }
}

//! TOML mapping files.
//!
//! A mapping file names, per canonical field, the input columns it reads,
//! plus optional per-column delimiters:
//!
//! ```toml
//! [fields]
//! CBH_Donor_ID = ["ExtDonor"]
//! Age = [1]
//! Lab_Parameter = ["Parameter", "Method"]
//!
//! [delimiters]
//! Method = " / "
//! ```
//!
//! Columns are referenced by header name (case-insensitive) or zero-based
//! index. Fields may be named by storage name or display label.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cbh_model::FieldKey;

use crate::error::{MappingError, Result};
use crate::state::FieldMapper;

/// Reference to an input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Header(String),
}

impl ColumnRef {
    /// Resolves to a zero-based column index.
    pub fn resolve(&self, headers: &[String]) -> Result<usize> {
        match self {
            Self::Index(index) if *index < headers.len() => Ok(*index),
            Self::Index(index) => Err(MappingError::ColumnOutOfRange {
                index: *index,
                width: headers.len(),
            }),
            Self::Header(name) => find_header(headers, name).ok_or_else(|| {
                MappingError::ColumnNotFound {
                    column: name.clone(),
                }
            }),
        }
    }
}

fn find_header(headers: &[String], name: &str) -> Option<usize> {
    let needle = name.trim();
    headers.iter().position(|h| h.eq_ignore_ascii_case(needle))
}

/// On-disk form of a [`FieldMapper`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<ColumnRef>>,
    /// Column (header name or index) to delimiter.
    #[serde(default)]
    pub delimiters: BTreeMap<String, String>,
}

impl MappingFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_toml_string()?;
        fs::write(path, text).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds a mapper against the headers of a concrete input.
    ///
    /// Unknown fields and columns are errors. Columns listed twice for a
    /// field are kept once.
    pub fn resolve(&self, headers: &[String]) -> Result<FieldMapper> {
        let mut mapper = FieldMapper::new();
        for (name, columns) in &self.fields {
            let field: FieldKey = name
                .parse()
                .map_err(|_| MappingError::UnknownField(name.clone()))?;
            for column in columns {
                let index = column.resolve(headers)?;
                if !mapper.columns(field).contains(&index) {
                    mapper.assign(field, index);
                }
            }
        }
        for (column, delimiter) in &self.delimiters {
            let index = match find_header(headers, column) {
                Some(index) => index,
                None => match column.trim().parse::<usize>() {
                    Ok(index) => ColumnRef::Index(index).resolve(headers)?,
                    Err(_) => {
                        return Err(MappingError::ColumnNotFound {
                            column: column.clone(),
                        });
                    }
                },
            };
            mapper.set_delimiter(index, delimiter.clone());
        }

        for (field, column) in mapper.ignored_columns() {
            tracing::warn!(
                field = %field,
                column,
                "only the first column is read for this field; extra column ignored"
            );
        }
        tracing::debug!(fields = mapper.mapped_fields().count(), "resolved mapping file");
        Ok(mapper)
    }

    /// Captures a mapper, naming columns by header where the header is
    /// non-empty and unique.
    pub fn from_mapper(mapper: &FieldMapper, headers: &[String]) -> Self {
        let column_ref = |index: usize| match headers.get(index) {
            Some(header)
                if !header.is_empty() && find_header(headers, header) == Some(index) =>
            {
                ColumnRef::Header(header.clone())
            }
            _ => ColumnRef::Index(index),
        };
        let fields = mapper
            .mapped_fields()
            .map(|(field, columns)| {
                (
                    field.name().to_string(),
                    columns.iter().map(|&c| column_ref(c)).collect(),
                )
            })
            .collect();
        let delimiters = mapper
            .delimiters()
            .iter()
            .map(|(&index, delimiter)| {
                let key = match column_ref(index) {
                    ColumnRef::Header(name) => name,
                    ColumnRef::Index(index) => index.to_string(),
                };
                (key, delimiter.clone())
            })
            .collect();
        Self { fields, delimiters }
    }
}

//! Table view over stored sample records.
//!
//! Rows sharing a sample identifier are merged into one [`DisplayRow`];
//! a [`TableQuery`] then filters, sorts and pages them.

pub mod group;
pub mod query;

pub use group::{DisplayRow, LIST_SEPARATOR, group_by_sample};
pub use query::{
    DEFAULT_COLUMNS, DEFAULT_PAGE_SIZE, SortDirection, SortSpec, TablePage, TableQuery,
};

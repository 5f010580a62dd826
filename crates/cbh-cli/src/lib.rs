//! Library components of the `cbh` command-line tool.

pub mod logging;

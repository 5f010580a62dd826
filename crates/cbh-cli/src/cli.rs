//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use cbh_core::{DEFAULT_CHUNK_SIZE, SubmitMode, UploadConfig};
use cbh_model::FieldKey;
use cbh_report::DEFAULT_PAGE_SIZE;

#[derive(Parser)]
#[command(
    name = "cbh",
    version,
    about = "Harmonize sample spreadsheets into the canonical sample schema",
    long_about = "Map the columns of an uploaded spreadsheet onto the canonical sample schema,\n\
                  assign canonical donor/master/sample identifiers, validate every row and\n\
                  upload accepted records in rate-limited chunks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values in trace logs. Sample data may identify donors.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the canonical fields with their kinds.
    Fields,

    /// Print the columns of a spreadsheet with their indices.
    Headers(HeadersArgs),

    /// Map, validate and upload a spreadsheet.
    Import(ImportArgs),

    /// Re-validate an edited quarantine file and upload what now passes.
    Resubmit(ResubmitArgs),

    /// Show stored samples grouped by sample ID.
    Browse(BrowseArgs),
}

#[derive(Args)]
pub struct HeadersArgs {
    /// Spreadsheet to inspect (.xlsx or semicolon-delimited .csv).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// 1-based row holding the column headers (workbooks only).
    #[arg(long = "header-row", value_name = "N", default_value_t = 1)]
    pub header_row: usize,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Spreadsheet to import (.xlsx or semicolon-delimited .csv).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// TOML file mapping canonical fields to input columns.
    #[arg(long = "mapping", value_name = "TOML")]
    pub mapping: PathBuf,

    /// Store directory (created if missing).
    #[arg(long = "store", value_name = "DIR")]
    pub store: PathBuf,

    /// 1-based row holding the column headers (workbooks only).
    #[arg(long = "header-row", value_name = "N", default_value_t = 1)]
    pub header_row: usize,

    /// Normalize and report without writing to the store.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// File quarantined records are appended to
    /// (default: <DIR>/quarantine.json; dry runs write only when set).
    #[arg(long = "quarantine-out", value_name = "PATH")]
    pub quarantine_out: Option<PathBuf>,

    #[command(flatten)]
    pub upload: UploadArgs,
}

#[derive(Args)]
pub struct ResubmitArgs {
    /// Quarantine file written by `import`.
    #[arg(value_name = "QUARANTINE_JSON")]
    pub quarantine: PathBuf,

    /// Store directory.
    #[arg(long = "store", value_name = "DIR")]
    pub store: PathBuf,

    /// Where to write entries that still fail (default: overwrite the input).
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub upload: UploadArgs,
}

#[derive(Args, Clone)]
pub struct UploadArgs {
    /// Records per upload chunk.
    #[arg(long = "chunk-size", value_name = "N", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Delay added per chunk index, in milliseconds.
    #[arg(long = "chunk-delay-ms", value_name = "MS", default_value_t = 1000)]
    pub chunk_delay_ms: u64,

    /// Submit records one at a time instead of one bulk call per chunk.
    #[arg(long = "per-record")]
    pub per_record: bool,
}

impl UploadArgs {
    pub fn config(&self) -> UploadConfig {
        UploadConfig {
            chunk_size: self.chunk_size,
            chunk_delay: std::time::Duration::from_millis(self.chunk_delay_ms),
            mode: if self.per_record {
                SubmitMode::PerRecord
            } else {
                SubmitMode::Bulk
            },
        }
    }
}

#[derive(Args)]
pub struct BrowseArgs {
    /// Store directory.
    #[arg(long = "store", value_name = "DIR")]
    pub store: PathBuf,

    /// Case-insensitive text matched against visible cells.
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Field to sort by (storage name or label).
    #[arg(long = "sort", value_name = "FIELD")]
    pub sort: Option<FieldKey>,

    /// Sort descending.
    #[arg(long = "desc", requires = "sort")]
    pub desc: bool,

    /// Comma-separated fields to show.
    #[arg(long = "columns", value_name = "FIELDS", value_delimiter = ',')]
    pub columns: Vec<FieldKey>,

    /// 1-based page number.
    #[arg(long = "page", value_name = "N", default_value_t = 1)]
    pub page: usize,

    /// Samples per page.
    #[arg(long = "page-size", value_name = "N", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_defaults_match_upload_defaults() {
        let cli = Cli::try_parse_from([
            "cbh",
            "import",
            "samples.csv",
            "--mapping",
            "mapping.toml",
            "--store",
            "store",
        ])
        .unwrap();
        let Command::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.header_row, 1);
        assert!(!args.dry_run);
        assert_eq!(args.upload.config(), UploadConfig::default());
    }

    #[test]
    fn browse_parses_fields_by_name_or_label() {
        let cli = Cli::try_parse_from([
            "cbh",
            "browse",
            "--store",
            "store",
            "--sort",
            "date of collection",
            "--desc",
            "--columns",
            "CBH_Sample_ID,Lab Parameter",
        ])
        .unwrap();
        let Command::Browse(args) = cli.command else {
            panic!("expected browse");
        };
        assert_eq!(args.sort, Some(FieldKey::DateOfCollection));
        assert!(args.desc);
        assert_eq!(args.columns, vec![FieldKey::SampleId, FieldKey::LabParameter]);
        assert_eq!(args.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn per_record_flag_selects_per_record_mode() {
        let cli = Cli::try_parse_from([
            "cbh",
            "resubmit",
            "quarantine.json",
            "--store",
            "store",
            "--per-record",
            "--chunk-size",
            "10",
        ])
        .unwrap();
        let Command::Resubmit(args) = cli.command else {
            panic!("expected resubmit");
        };
        let config = args.upload.config();
        assert_eq!(config.mode, SubmitMode::PerRecord);
        assert_eq!(config.chunk_size, 10);
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::loader::DEFAULT_MAX_RETRIES;

#[derive(Debug, Parser)]
#[command(author, version, about = "Load, filter and export messy CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect the delimiter from the first line of a file
    Sniff(SniffArgs),
    /// Show a window of rows in a formatted table
    Preview(PreviewArgs),
    /// List columns with their inferred type and filter classification
    Columns(ColumnsArgs),
    /// Apply column filters and export the matching rows as CSV
    Filter(FilterArgs),
}

#[derive(Debug, Args)]
pub struct SniffArgs {
    /// Input file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

/// Options shared by every command that loads a file.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Input delimited file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Delimiter override (supports ',', 'tab', ';', '|'); sniffed when omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Malformed lines to skip before giving up
    #[arg(long = "max-retries", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct WindowArgs {
    /// Valid data rows to skip before the window starts
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Maximum rows to load after the offset
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Valid data rows to skip before the window starts
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub window: WindowArgs,
    /// Emit the column summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub window: WindowArgs,
    /// Keep rows whose value is listed, e.g. `status=shipped|pending`
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include: Vec<String>,
    /// Keep rows inside an inclusive range, e.g. `amount=10..30` or `amount=..5`
    #[arg(long = "range", action = clap::ArgAction::Append)]
    pub range: Vec<String>,
    /// Keep rows where this column has a value
    #[arg(long = "present", action = clap::ArgAction::Append)]
    pub present: Vec<String>,
    /// Keep rows where this column is empty
    #[arg(long = "absent", action = clap::ArgAction::Append)]
    pub absent: Vec<String>,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Render the filtered rows as a table instead of CSV
    #[arg(long = "table", conflicts_with = "output")]
    pub table: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

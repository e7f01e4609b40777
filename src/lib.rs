pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod io_utils;
pub mod loader;
pub mod session;
pub mod sniff;
pub mod table;
pub mod tabular;
pub mod window;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, ColumnsArgs, Commands, FilterArgs, PreviewArgs, SniffArgs, SourceArgs},
    filter::{FilterSpec, Presence},
    loader::LoadOptions,
    session::{FilterSession, ViewerSession},
    window::RowWindow,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_sieve", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sniff(args) => handle_sniff(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Columns(args) => handle_columns(&args),
        Commands::Filter(args) => handle_filter(&args),
    }
}

fn handle_sniff(args: &SniffArgs) -> Result<()> {
    let delimiter = sniff::sniff_delimiter(&args.input)?;
    println!("{}", printable_delimiter(delimiter));
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let window = RowWindow::new(args.offset, Some(args.limit));
    let mut session = open_session(&args.source)?;
    let loaded = session
        .open(&args.source.input, window)
        .with_context(|| format!("Loading {:?}", args.source.input))?;
    table::print_table(&loaded);
    info!(
        "Displayed {} row(s) from {:?} starting at offset {}",
        loaded.row_count(),
        args.source.input,
        args.offset
    );
    Ok(())
}

fn handle_columns(args: &ColumnsArgs) -> Result<()> {
    let window = RowWindow::new(args.window.offset, args.window.limit);
    let mut session = open_session(&args.source)?;
    let loaded = session
        .open(&args.source.input, window)
        .with_context(|| format!("Loading {:?}", args.source.input))?;
    let summaries = loaded.summaries();
    if args.json {
        let rendered =
            serde_json::to_string_pretty(&summaries).context("Serializing column summary")?;
        println!("{rendered}");
        return Ok(());
    }

    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.name.clone(),
                summary.data_type.to_string(),
                summary.kind.to_string(),
                summary.nulls.to_string(),
                summary.distinct.to_string(),
                summary.min.map(|v| v.to_string()).unwrap_or_default(),
                summary.max.map(|v| v.to_string()).unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    let headers = ["column", "type", "kind", "nulls", "distinct", "min", "max"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    table::print_rows(&headers, &rows);
    info!(
        "Listed {} column(s) from {:?}",
        summaries.len(),
        args.source.input
    );
    Ok(())
}

fn handle_filter(args: &FilterArgs) -> Result<()> {
    let filters = build_filter_session(args)?;
    let window = RowWindow::new(args.window.offset, args.window.limit);
    let mut session = open_session(&args.source)?;
    session
        .open(&args.source.input, window)
        .with_context(|| format!("Loading {:?}", args.source.input))?;
    let filtered = session
        .filtered(&filters)?
        .context("No table loaded")?;
    info!(
        "{} filter(s) kept {} row(s)",
        filters.len(),
        filtered.row_count()
    );
    if args.table {
        table::print_table(&filtered);
        return Ok(());
    }
    export::export_to_path(&filtered, args.output.as_deref())
}

fn build_filter_session(args: &FilterArgs) -> Result<FilterSession> {
    let mut session = FilterSession::new();
    for raw in &args.include {
        session.add(filter::parse_include(raw)?);
    }
    for raw in &args.range {
        session.add(filter::parse_range(raw)?);
    }
    for column in &args.present {
        session.add(FilterSpec::presence(column.trim(), Presence::MustExist));
    }
    for column in &args.absent {
        session.add(FilterSpec::presence(column.trim(), Presence::MustBeAbsent));
    }
    Ok(session)
}

fn open_session(source: &SourceArgs) -> Result<ViewerSession> {
    let options = LoadOptions {
        delimiter: source.delimiter,
        encoding: io_utils::resolve_encoding(source.input_encoding.as_deref())?,
        max_retries: source.max_retries,
    };
    Ok(ViewerSession::new(options))
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

//! Reader/writer construction and text decoding.
//!
//! - **Readers** are strict about field counts (`flexible(false)`) so a row
//!   with the wrong shape surfaces as a structured `UnequalLengths` error that
//!   carries the raw line position.
//! - **Decoding** goes through `encoding_rs`, defaulting to UTF-8.
//! - **Writers** emit comma-delimited output with minimal quoting; the `-`
//!   path convention routes to stdout.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::error::LoadError;

pub const EXPORT_DELIMITER: u8 = b',';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<BufReader<File>>, LoadError> {
    let file = File::open(path).map_err(|err| LoadError::file_access(path, err))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

/// Decodes every field of `record`, returning `None` if any field is not
/// valid in `encoding`.
pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| {
            let (text, had_errors) = encoding.decode_without_bom_handling(field);
            (!had_errors).then(|| text.into_owned())
        })
        .collect()
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let output: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    Ok(output)
}

pub fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(EXPORT_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

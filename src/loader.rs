//! Resilient row-skipping loader.
//!
//! Each attempt parses the whole file with a strict reader. A row whose field
//! count differs from the header raises `UnequalLengths`, which carries the raw
//! line the row starts on. That line joins the [`SkipSet`] and the file is
//! parsed again from the top. Skip-set entries are raw file line numbers, so
//! they stay valid across attempts no matter how many earlier lines were
//! dropped.
//!
//! An attempt never reports a line that is already in the skip set, so every
//! retry grows the set by one. [`LoadOptions::max_retries`] is the only bound
//! on the loop.
//!
//! Column types are decided over every valid row of the file, not just the
//! rows inside the window, so a window always carries the same typed values as
//! the matching slice of a full load. Rows outside the window are decoded and
//! observed for typing but never stored.

use std::{collections::BTreeSet, path::Path};

use csv::ByteRecord;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};

use crate::{
    data::TypeCandidate, error::LoadError, io_utils, printable_delimiter,
    sniff::sniff_delimiter, tabular::Table, window::RowWindow,
};

/// Raw 1-based file line numbers excluded from parsing.
pub type SkipSet = BTreeSet<u64>;

pub const DEFAULT_MAX_RETRIES: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Delimiter override; sniffed from the first line when `None`.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Number of malformed lines the loader may skip before giving up.
    pub max_retries: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

enum Attempt {
    Loaded(Table),
    Malformed { line: u64, expected: u64, found: u64 },
}

/// Loads `window` from `path`, skipping every line in `skip` and any further
/// malformed lines discovered along the way. Discovered lines are added to
/// `skip`, which the caller can inspect afterwards.
pub fn load_resilient(
    path: &Path,
    delimiter: Option<u8>,
    skip: &mut SkipSet,
    window: RowWindow,
    options: &LoadOptions,
) -> Result<Table, LoadError> {
    let delimiter = match delimiter.or(options.delimiter) {
        Some(delimiter) => delimiter,
        None => sniff_delimiter(path)?,
    };
    debug!(
        "Loading {:?} with delimiter '{}', window {:?}",
        path,
        printable_delimiter(delimiter),
        window
    );

    let mut retries = 0usize;
    loop {
        match parse_attempt(path, delimiter, skip, window, options.encoding)? {
            Attempt::Loaded(table) => {
                info!(
                    "Loaded {} row(s) x {} column(s) from {:?} ({} malformed line(s) skipped)",
                    table.row_count(),
                    table.column_count(),
                    path,
                    skip.len()
                );
                return Ok(table);
            }
            Attempt::Malformed {
                line,
                expected,
                found,
            } => {
                skip.insert(line);
                warn!(
                    "Skipping malformed line {line} in {path:?}: expected {expected} field(s), found {found}"
                );
                retries += 1;
                if retries > options.max_retries {
                    return Err(unrecoverable(
                        path,
                        format!("retry ceiling of {} reached", options.max_retries),
                        skip,
                    ));
                }
            }
        }
    }
}

fn parse_attempt(
    path: &Path,
    delimiter: u8,
    skip: &SkipSet,
    window: RowWindow,
    encoding: &'static Encoding,
) -> Result<Attempt, LoadError> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let raw_headers = match reader.byte_headers() {
        Ok(headers) => headers.clone(),
        Err(err) => return Err(fatal_csv_error(path, err, skip)),
    };
    let headers =
        io_utils::decode_record(&raw_headers, encoding).ok_or_else(|| LoadError::Decode {
            path: path.to_path_buf(),
            line: 1,
            encoding: encoding.name(),
        })?;

    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    let mut rows = Vec::new();
    let mut lines = Vec::new();
    let mut valid_rows = 0usize;
    let mut record = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record.position().map(|pos| pos.line()).unwrap_or_default();
                if skip.contains(&line) {
                    continue;
                }
                let decoded = io_utils::decode_record(&record, encoding).ok_or_else(|| {
                    LoadError::Decode {
                        path: path.to_path_buf(),
                        line,
                        encoding: encoding.name(),
                    }
                })?;
                for (candidate, field) in candidates.iter_mut().zip(&decoded) {
                    candidate.observe(field);
                }
                valid_rows += 1;
                let in_window = valid_rows > window.offset
                    && window.limit.is_none_or(|limit| rows.len() < limit);
                if in_window {
                    rows.push(decoded);
                    lines.push(line);
                }
            }
            Err(err) => {
                if let csv::ErrorKind::UnequalLengths {
                    pos: Some(pos),
                    expected_len,
                    len,
                } = err.kind()
                {
                    if skip.contains(&pos.line()) {
                        continue;
                    }
                    return Ok(Attempt::Malformed {
                        line: pos.line(),
                        expected: *expected_len,
                        found: *len,
                    });
                }
                return Err(fatal_csv_error(path, err, skip));
            }
        }
    }

    let types = candidates.iter().map(TypeCandidate::decide).collect::<Vec<_>>();
    Ok(Attempt::Loaded(Table::from_typed(headers, &types, rows, lines)))
}

fn fatal_csv_error(path: &Path, err: csv::Error, skip: &SkipSet) -> LoadError {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::file_access(path, source),
        _ => unrecoverable(path, reason, skip),
    }
}

fn unrecoverable(path: &Path, reason: String, skip: &SkipSet) -> LoadError {
    LoadError::UnrecoverableParse {
        path: path.to_path_buf(),
        reason,
        skipped: skip.iter().copied().collect(),
    }
}

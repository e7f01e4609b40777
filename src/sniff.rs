//! Delimiter detection from the first line of a file.
//!
//! Only the header line is inspected. Candidate separators are counted outside
//! double-quoted sections; the most frequent wins and ties fall back to the
//! order of [`CANDIDATE_DELIMITERS`].

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::debug;

use crate::{error::LoadError, printable_delimiter};

pub const CANDIDATE_DELIMITERS: &[u8] = b",\t;|:";

pub fn sniff_delimiter(path: &Path) -> Result<u8, LoadError> {
    let file = File::open(path).map_err(|err| LoadError::DelimiterDetection {
        path: path.to_path_buf(),
        reason: "file cannot be opened".to_string(),
        source: Some(Box::new(LoadError::file_access(path, err))),
    })?;
    let mut reader = BufReader::new(file);
    let mut first_line = Vec::new();
    reader
        .read_until(b'\n', &mut first_line)
        .map_err(|err| LoadError::DelimiterDetection {
            path: path.to_path_buf(),
            reason: "first line cannot be read".to_string(),
            source: Some(Box::new(LoadError::file_access(path, err))),
        })?;

    let delimiter = detect_in_line(&first_line).map_err(|reason| {
        LoadError::DelimiterDetection {
            path: path.to_path_buf(),
            reason: reason.to_string(),
            source: None,
        }
    })?;
    debug!(
        "Detected delimiter '{}' for {:?}",
        printable_delimiter(delimiter),
        path
    );
    Ok(delimiter)
}

/// Picks the delimiter for a single header line.
pub fn detect_in_line(line: &[u8]) -> Result<u8, &'static str> {
    let line = strip_line_ending(strip_bom(line));
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return Err("first line is empty");
    }

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for &byte in line {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(slot) = CANDIDATE_DELIMITERS.iter().position(|&c| c == byte) {
            counts[slot] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (slot, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((slot, count)),
        }
    }
    best.map(|(slot, _)| CANDIDATE_DELIMITERS[slot])
        .ok_or("no candidate delimiter found in first line")
}

fn strip_bom(line: &[u8]) -> &[u8] {
    line.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(line)
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

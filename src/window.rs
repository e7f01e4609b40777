//! Offset/limit windows over the valid data rows of a file.
//!
//! Offsets count rows that survive malformed-line removal, so a window always
//! matches the same slice of a full load: `load(path, (k, Some(n)))` returns
//! rows `k..k + n` of `load(path, (0, None))`.

use std::path::Path;

use serde::Serialize;

use crate::{
    error::LoadError,
    loader::{LoadOptions, SkipSet, load_resilient},
    tabular::Table,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RowWindow {
    /// Leading valid data rows to skip.
    pub offset: usize,
    /// Maximum rows to materialize after the offset; `None` reads to the end.
    pub limit: Option<usize>,
}

impl RowWindow {
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn first(limit: usize) -> Self {
        Self::new(0, Some(limit))
    }
}

pub fn load(path: &Path, window: RowWindow) -> Result<Table, LoadError> {
    load_with(path, window, &LoadOptions::default())
}

pub fn load_with(path: &Path, window: RowWindow, options: &LoadOptions) -> Result<Table, LoadError> {
    let mut skip = SkipSet::new();
    load_resilient(path, options.delimiter, &mut skip, window, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn zero_limit_keeps_schema() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"id;name\n1;a\n2;b\n").expect("write");
        let table = load(file.path(), RowWindow::first(0)).expect("load");
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.headers(), vec!["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn offset_past_end_yields_empty_table() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"id,name\n1,a\n2,b\n").expect("write");
        let table = load(file.path(), RowWindow::new(5, None)).expect("load");
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 2);
    }
}

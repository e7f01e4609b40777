//! In-memory table produced by a successful load.
//!
//! A [`Table`] is a list of named, typed columns whose value vectors are
//! index-aligned. Every column holds the same number of rows. Tables are never
//! mutated once built; filtering produces a new table through
//! [`Table::select_rows`].

use std::collections::HashSet;

use serde::Serialize;

use crate::data::{ColumnKind, ColumnType, TypeCandidate, Value, parse_cell};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: ColumnType,
    values: Vec<Option<Value>>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> ColumnType {
        self.data_type
    }

    pub fn kind(&self) -> ColumnKind {
        self.data_type.kind()
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    source_lines: Vec<u64>,
}

/// Per-column summary used by `columns` output and filter widgets.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: ColumnType,
    pub kind: ColumnKind,
    pub nulls: usize,
    pub distinct: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Table {
    /// Builds a typed table from raw decoded rows, inferring each column's
    /// type from `rows` alone. `lines` holds the raw file line each row
    /// started on and must be as long as `rows`.
    pub fn from_raw(headers: Vec<String>, rows: Vec<Vec<String>>, lines: Vec<u64>) -> Self {
        let mut candidates = vec![TypeCandidate::new(); headers.len()];
        for row in &rows {
            for (candidate, field) in candidates.iter_mut().zip(row) {
                candidate.observe(field);
            }
        }
        let types = candidates.iter().map(TypeCandidate::decide).collect::<Vec<_>>();
        Self::from_typed(headers, &types, rows, lines)
    }

    /// Builds a table whose column types were decided elsewhere, e.g. over a
    /// whole file while `rows` is only a window of it. Missing types default
    /// to [`ColumnType::String`].
    pub fn from_typed(
        headers: Vec<String>,
        types: &[ColumnType],
        rows: Vec<Vec<String>>,
        lines: Vec<u64>,
    ) -> Self {
        debug_assert_eq!(rows.len(), lines.len());
        let mut columns = dedupe_headers(headers)
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                name,
                data_type: types.get(idx).copied().unwrap_or(ColumnType::String),
                values: Vec::with_capacity(rows.len()),
            })
            .collect::<Vec<_>>();
        for row in &rows {
            for (idx, column) in columns.iter_mut().enumerate() {
                let raw = row.get(idx).map(|s| s.as_str()).unwrap_or("");
                column.values.push(parse_cell(raw, column.data_type));
            }
        }
        Table {
            columns,
            source_lines: lines,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.source_lines.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Raw 1-based file line each row was read from.
    pub fn source_lines(&self) -> &[u64] {
        &self.source_lines
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.columns
            .get(column)
            .and_then(|c| c.values.get(row))
            .and_then(|v| v.as_ref())
    }

    pub fn row(&self, row: usize) -> Vec<Option<&Value>> {
        self.columns
            .iter()
            .map(|c| c.values.get(row).and_then(|v| v.as_ref()))
            .collect()
    }

    /// Row cells rendered as text, nulls as empty strings.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count())
            .map(|row| {
                self.row(row)
                    .into_iter()
                    .map(|cell| cell.map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// New table containing only `rows`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                data_type: column.data_type,
                values: rows.iter().map(|&idx| column.values[idx].clone()).collect(),
            })
            .collect();
        Table {
            columns,
            source_lines: rows.iter().map(|&idx| self.source_lines[idx]).collect(),
        }
    }

    /// Distinct non-null display values in first-seen order.
    pub fn distinct_values(&self, name: &str) -> Option<Vec<String>> {
        let column = self.column(name)?;
        let mut seen = HashSet::new();
        let values = column
            .values
            .iter()
            .flatten()
            .map(Value::as_display)
            .filter(|v| seen.insert(v.clone()))
            .collect();
        Some(values)
    }

    /// Minimum and maximum of a numeric column, ignoring nulls.
    pub fn numeric_bounds(&self, name: &str) -> Option<(f64, f64)> {
        let column = self.column(name)?;
        if !column.data_type.is_numeric() {
            return None;
        }
        column
            .values
            .iter()
            .flatten()
            .filter_map(Value::as_f64)
            .fold(None::<(f64, f64)>, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn summaries(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|column| {
                let bounds = self.numeric_bounds(&column.name);
                ColumnSummary {
                    name: column.name.clone(),
                    data_type: column.data_type,
                    kind: column.kind(),
                    nulls: column.null_count(),
                    distinct: self
                        .distinct_values(&column.name)
                        .map(|v| v.len())
                        .unwrap_or_default(),
                    min: bounds.map(|(lo, _)| lo),
                    max: bounds.map(|(_, hi)| hi),
                }
            })
            .collect()
    }
}

/// Names blank headers `Unnamed: <idx>` and suffixes repeats with `.1`, `.2`.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut used = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !used.insert(candidate.clone()) {
                candidate = format!("{base}.{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample() -> Table {
        Table::from_raw(
            strings(&["id", "name", "amount"]),
            vec![
                strings(&["1", "Alice", "10"]),
                strings(&["2", "Bob", ""]),
                strings(&["3", "Alice", "30.5"]),
            ],
            vec![2, 3, 4],
        )
    }

    #[test]
    fn from_raw_infers_types_and_nulls() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.column("id").unwrap().data_type(), ColumnType::Integer);
        assert_eq!(table.column("name").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(table.column("amount").unwrap().data_type(), ColumnType::Float);
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.column("amount").unwrap().null_count(), 1);
    }

    #[test]
    fn select_rows_keeps_alignment_and_source_lines() {
        let table = sample();
        let selected = table.select_rows(&[2, 0]);
        assert_eq!(selected.source_lines(), &[4, 2]);
        assert_eq!(
            selected.display_rows(),
            vec![strings(&["3", "Alice", "30.5"]), strings(&["1", "Alice", "10"])]
        );
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn distinct_values_and_bounds() {
        let table = sample();
        assert_eq!(
            table.distinct_values("name").unwrap(),
            strings(&["Alice", "Bob"])
        );
        assert_eq!(table.numeric_bounds("amount"), Some((10.0, 30.5)));
        assert_eq!(table.numeric_bounds("name"), None);
        assert_eq!(table.numeric_bounds("missing"), None);
    }

    #[test]
    fn from_typed_keeps_supplied_types() {
        let table = Table::from_typed(
            strings(&["code"]),
            &[ColumnType::String],
            vec![strings(&["007"])],
            vec![2],
        );
        assert_eq!(table.cell(0, 0), Some(&Value::String("007".to_string())));
        assert_eq!(table.column("code").unwrap().kind(), ColumnKind::Categorical);
    }

    #[test]
    fn dedupe_headers_renames_blank_and_repeated_names() {
        let renamed = dedupe_headers(strings(&["a", "", "a", "a"]));
        assert_eq!(renamed, strings(&["a", "Unnamed: 1", "a.1", "a.2"]));
    }
}

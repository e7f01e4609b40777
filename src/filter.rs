//! Column filters: categorical membership, inclusive numeric ranges and null
//! presence.
//!
//! Whether a filter selects anything is decided against the table passed to
//! [`apply_filters`], before any filter runs. After that each filter is a fixed
//! row predicate, so the order of the list does not change the result. The
//! source table is never modified.

use std::collections::BTreeSet;

use anyhow::{Result, anyhow, bail};

use crate::{
    data::Value,
    tabular::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Any,
    MustExist,
    MustBeAbsent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Keep rows whose display value is one of the set.
    Categorical(BTreeSet<String>),
    /// Keep rows whose numeric value lies in `[min, max]`; a missing bound is
    /// open.
    NumericRange { min: Option<f64>, max: Option<f64> },
    Nullness(Presence),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub kind: FilterKind,
}

impl FilterSpec {
    pub fn categorical<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            kind: FilterKind::Categorical(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn range(column: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            column: column.into(),
            kind: FilterKind::NumericRange { min, max },
        }
    }

    pub fn presence(column: impl Into<String>, presence: Presence) -> Self {
        Self {
            column: column.into(),
            kind: FilterKind::Nullness(presence),
        }
    }
}

pub fn apply_filters(table: &Table, filters: &[FilterSpec]) -> Result<Table> {
    let mut rows = (0..table.row_count()).collect::<Vec<_>>();
    for filter in filters {
        retain_matching(table, filter, &mut rows)?;
    }
    Ok(table.select_rows(&rows))
}

fn retain_matching(table: &Table, filter: &FilterSpec, rows: &mut Vec<usize>) -> Result<()> {
    let column = table
        .column(&filter.column)
        .ok_or_else(|| anyhow!("Column '{}' not found for filter", filter.column))?;
    let values = column.values();
    match &filter.kind {
        FilterKind::Categorical(allowed) => {
            if allowed.is_empty() {
                return Ok(());
            }
            rows.retain(|&row| {
                values[row]
                    .as_ref()
                    .is_some_and(|value| allowed.contains(&value.as_display()))
            });
        }
        FilterKind::NumericRange { min, max } => {
            if !column.data_type().is_numeric() {
                bail!(
                    "Column '{}' is {} and cannot take a numeric range",
                    column.name(),
                    column.data_type()
                );
            }
            if let (Some(lo), Some(hi)) = (min, max)
                && lo > hi
            {
                bail!(
                    "Range for '{}' has minimum {lo} greater than maximum {hi}",
                    column.name()
                );
            }
            if range_is_unselected(table.numeric_bounds(column.name()), *min, *max) {
                return Ok(());
            }
            rows.retain(|&row| {
                values[row]
                    .as_ref()
                    .and_then(Value::as_f64)
                    .is_some_and(|v| min.is_none_or(|lo| v >= lo) && max.is_none_or(|hi| v <= hi))
            });
        }
        FilterKind::Nullness(Presence::Any) => {}
        FilterKind::Nullness(Presence::MustExist) => rows.retain(|&row| values[row].is_some()),
        FilterKind::Nullness(Presence::MustBeAbsent) => rows.retain(|&row| values[row].is_none()),
    }
    Ok(())
}

/// A range with no bounds, or one spanning the full min/max of the source
/// column, is treated as no selection.
fn range_is_unselected(bounds: Option<(f64, f64)>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    match bounds {
        Some((lo, hi)) => min.is_none_or(|m| m <= lo) && max.is_none_or(|m| m >= hi),
        None => false,
    }
}

/// Parses `column=a|b|c` into a categorical filter.
pub fn parse_include(raw: &str) -> Result<FilterSpec> {
    let (column, values) = split_assignment(raw)?;
    let values = values
        .split('|')
        .map(|v| unquote(v.trim()))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>();
    Ok(FilterSpec {
        column,
        kind: FilterKind::Categorical(values),
    })
}

/// Parses `column=min..max`; either bound may be omitted (`amount=10..`).
pub fn parse_range(raw: &str) -> Result<FilterSpec> {
    let (column, range) = split_assignment(raw)?;
    let (lo, hi) = range
        .split_once("..")
        .ok_or_else(|| anyhow!("Range '{range}' must look like min..max"))?;
    let parse_bound = |bound: &str| -> Result<Option<f64>> {
        let bound = bound.trim();
        if bound.is_empty() {
            return Ok(None);
        }
        bound
            .parse::<f64>()
            .map(Some)
            .map_err(|_| anyhow!("Range bound '{bound}' is not a number"))
    };
    Ok(FilterSpec::range(column, parse_bound(lo)?, parse_bound(hi)?))
}

fn split_assignment(raw: &str) -> Result<(String, &str)> {
    let trimmed = raw.trim();
    let (column, rest) = trimmed
        .split_once('=')
        .ok_or_else(|| anyhow!("Failed to parse filter '{trimmed}', expected column=value"))?;
    let column = unquote(column.trim());
    if column.is_empty() {
        bail!("Filter '{trimmed}' is missing a column name");
    }
    Ok((column.to_string(), rest.trim()))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_include_splits_on_pipes() {
        let spec = parse_include("name = Alice|'Bob Smith'|").unwrap();
        assert_eq!(spec.column, "name");
        assert_eq!(
            spec.kind,
            FilterKind::Categorical(BTreeSet::from([
                "Alice".to_string(),
                "Bob Smith".to_string()
            ]))
        );
    }

    #[test]
    fn parse_range_accepts_open_bounds() {
        assert_eq!(
            parse_range("amount=10..30").unwrap(),
            FilterSpec::range("amount", Some(10.0), Some(30.0))
        );
        assert_eq!(
            parse_range("amount=..2.5").unwrap(),
            FilterSpec::range("amount", None, Some(2.5))
        );
        assert!(parse_range("amount=ten..20").is_err());
        assert!(parse_range("amount=10").is_err());
        assert!(parse_range("=1..2").is_err());
    }

    #[test]
    fn full_span_range_is_judged_on_the_source_column() {
        let table = Table::from_raw(
            vec!["name".to_string(), "amount".to_string()],
            vec![
                vec!["x".to_string(), "5".to_string()],
                vec!["y".to_string(), "10".to_string()],
                vec!["z".to_string(), String::new()],
            ],
            vec![2, 3, 4],
        );
        let range = FilterSpec::range("amount", Some(8.0), Some(20.0));
        let names = FilterSpec::categorical("name", ["y", "z"]);

        let forward = apply_filters(&table, &[range.clone(), names.clone()]).unwrap();
        let backward = apply_filters(&table, &[names, range]).unwrap();
        assert_eq!(forward.source_lines(), &[3]);
        assert_eq!(backward.source_lines(), &[3]);
    }
}

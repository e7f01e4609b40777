use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{data::Value, io_utils, tabular::Table};

/// Writes `table` as comma-delimited text with a header row. Nulls become
/// empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = io_utils::csv_writer(writer);
    writer
        .write_record(table.headers())
        .context("Writing output headers")?;
    for row in 0..table.row_count() {
        let fields = table
            .row(row)
            .into_iter()
            .map(|cell| cell.map(Value::as_display).unwrap_or_default());
        writer
            .write_record(fields)
            .with_context(|| format!("Writing output row {}", row + 1))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    String::from_utf8(buffer).context("Export produced invalid UTF-8")
}

/// Exports to `path`, or stdout when `path` is `None` or `-`.
pub fn export_to_path(table: &Table, path: Option<&Path>) -> Result<()> {
    write_csv(table, io_utils::open_output(path)?)?;
    let destination = path
        .filter(|p| !io_utils::is_dash(p))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!("Exported {} row(s) -> {}", table.row_count(), destination);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_csv_quotes_only_when_needed_and_blanks_nulls() {
        let table = Table::from_raw(
            vec!["id".to_string(), "note".to_string(), "amount".to_string()],
            vec![
                vec!["1".to_string(), "plain".to_string(), "10".to_string()],
                vec!["2".to_string(), "a, b".to_string(), "".to_string()],
            ],
            vec![2, 3],
        );
        let text = to_csv_string(&table).unwrap();
        assert_eq!(text, "id,note,amount\n1,plain,10\n2,\"a, b\",\n");
    }
}

//! Plain-text rendering of a [`Table`] for terminal preview.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::tabular::Table;

/// Cells wider than this are cut and end in `…`.
pub const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Renders a loaded table; numeric columns are right-aligned and nulls blank.
pub fn render_table(table: &Table) -> String {
    let aligns = table
        .columns()
        .iter()
        .map(|c| {
            if c.data_type().is_numeric() {
                Align::Right
            } else {
                Align::Left
            }
        })
        .collect::<Vec<_>>();
    render_grid(&table.headers(), &table.display_rows(), &aligns)
}

/// Renders plain text rows, all left-aligned.
pub fn render_rows(headers: &[String], rows: &[Vec<String>]) -> String {
    render_grid(headers, rows, &vec![Align::Left; headers.len()])
}

fn render_grid(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell)).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, aligns));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, aligns));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }
    output
}

pub fn print_table(table: &Table) {
    print!("{}", render_table(table));
}

pub fn print_rows(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_rows(headers, rows));
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .zip(aligns)
        .map(|((value, &width), align)| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match align {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn clip(value: &str) -> String {
    if display_width(value) <= MAX_CELL_WIDTH || value.contains('\u{1b}') {
        return value.to_string();
    }
    let mut clipped = value.chars().take(MAX_CELL_WIDTH - 1).collect::<String>();
    clipped.push('…');
    clipped
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

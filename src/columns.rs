use serde::{Deserialize, Serialize};

use crate::error::{MonthbookError, Result};
use crate::importer::parse_amount;
use crate::models::{Field, ParsedRow};

/// Labels used to find the header row and the three canonical columns.
/// Each entry is a list of needles; a header matches when it contains any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default = "default_marker")]
    pub marker: Vec<String>,
    #[serde(default = "default_date")]
    pub date: Vec<String>,
    #[serde(default = "default_description")]
    pub description: Vec<String>,
    #[serde(default = "default_amount")]
    pub amount: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// Richart export labels first, English fallbacks after.
fn default_marker() -> Vec<String> {
    strings(&["消費明細", "Transaction Details"])
}

fn default_date() -> Vec<String> {
    strings(&["日期", "Date"])
}

fn default_description() -> Vec<String> {
    strings(&["明細", "Description", "Details"])
}

fn default_amount() -> Vec<String> {
    strings(&["金額", "Amount"])
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            date: default_date(),
            description: default_description(),
            amount: default_amount(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub header_row: usize,
    pub date: usize,
    pub description: usize,
    pub amount: usize,
}

/// First row whose concatenated cell text contains a marker.
pub fn find_header_row(grid: &[Vec<String>], markers: &[String]) -> Option<usize> {
    grid.iter().position(|row| {
        let joined: String = row.concat();
        markers
            .iter()
            .filter(|m| !m.is_empty())
            .any(|m| joined.contains(m.as_str()))
    })
}

fn find_column(headers: &[String], needles: &[String], field: Field) -> Result<usize> {
    headers
        .iter()
        .position(|h| {
            needles
                .iter()
                .filter(|n| !n.is_empty())
                .any(|n| h.to_lowercase().contains(&n.to_lowercase()))
        })
        .ok_or(MonthbookError::MissingColumn(field))
}

/// Locate the header row and map date/description/amount onto column
/// indexes. Any unresolved field is an error; no column is ever guessed.
pub fn resolve(grid: &[Vec<String>], spec: &ColumnSpec) -> Result<ResolvedColumns> {
    let header_row = find_header_row(grid, &spec.marker)
        .ok_or_else(|| MonthbookError::MissingHeader(spec.marker.join(" / ")))?;
    let headers: Vec<String> = grid[header_row].iter().map(|h| h.trim().to_string()).collect();
    let resolved = ResolvedColumns {
        header_row,
        date: find_column(&headers, &spec.date, Field::Date)?,
        description: find_column(&headers, &spec.description, Field::Description)?,
        amount: find_column(&headers, &spec.amount, Field::Amount)?,
    };
    log::debug!(
        "header at row {}: date={:?} description={:?} amount={:?}",
        header_row,
        headers[resolved.date],
        headers[resolved.description],
        headers[resolved.amount]
    );
    Ok(resolved)
}

/// Data rows below the header. Blank rows are skipped; short rows read
/// missing cells as empty.
pub fn extract_rows(grid: &[Vec<String>], cols: &ResolvedColumns) -> Vec<ParsedRow> {
    let cell = |row: &[String], idx: usize| row.get(idx).map(|c| c.trim()).unwrap_or("").to_string();
    grid.iter()
        .skip(cols.header_row + 1)
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| ParsedRow {
            date: cell(row, cols.date),
            description: cell(row, cols.description),
            amount: parse_amount(&cell(row, cols.amount)),
        })
        .collect()
}

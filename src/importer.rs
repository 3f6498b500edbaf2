use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::columns::{extract_rows, resolve, ColumnSpec};
#[cfg(feature = "xlsx")]
use crate::error::MonthbookError;
use crate::error::Result;
use crate::models::ParsedRow;

/// Raw rows of an uploaded export, every cell as text.
pub type Grid = Vec<Vec<String>>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lenient amount parsing: separators, currency marks and parenthesized
/// negatives are accepted, anything unparsable counts as zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | ' ' | '\u{a0}'))
        .collect();
    let s = s
        .trim_start_matches("NT")
        .trim_start_matches("TWD")
        .trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -parse_decimal(inner);
    }
    parse_decimal(s)
}

fn parse_decimal(s: &str) -> Decimal {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

fn is_spreadsheet(file_path: &Path) -> bool {
    file_path.extension().map_or(false, |e| {
        ["xlsx", "xlsm", "xls", "ods"]
            .iter()
            .any(|ext| e.eq_ignore_ascii_case(ext))
    })
}

// ---------------------------------------------------------------------------
// Grid loading
// ---------------------------------------------------------------------------

pub fn load_grid(file_path: &Path) -> Result<Grid> {
    if is_spreadsheet(file_path) {
        load_spreadsheet(file_path)
    } else {
        load_csv(file_path)
    }
}

fn load_csv(file_path: &Path) -> Result<Grid> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(grid)
}

#[cfg(feature = "xlsx")]
fn load_spreadsheet(file_path: &Path) -> Result<Grid> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| MonthbookError::Xlsx(format!("Failed to open {}: {e}", file_path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MonthbookError::Xlsx(format!("{} has no worksheets", file_path.display())))?
        .map_err(|e| MonthbookError::Xlsx(e.to_string()))?;

    let grid = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();
    Ok(grid)
}

#[cfg(not(feature = "xlsx"))]
fn load_spreadsheet(file_path: &Path) -> Result<Grid> {
    Err(crate::error::MonthbookError::Other(format!(
        "{}: spreadsheet support is disabled (build with the `xlsx` feature)",
        file_path.display()
    )))
}

pub fn parse_grid(grid: &[Vec<String>], spec: &ColumnSpec) -> Result<Vec<ParsedRow>> {
    let cols = resolve(grid, spec)?;
    Ok(extract_rows(grid, &cols))
}

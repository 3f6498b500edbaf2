use std::path::PathBuf;

use super::report::print_summary;
use super::{open_session, parse_period};
use crate::error::{MonthbookError, Result};
use crate::importer::load_grid;

pub fn run(file: &str, period: Option<String>, replace: bool) -> Result<()> {
    let file_path = PathBuf::from(file);
    let (settings, mut session) = open_session(parse_period(period.as_deref())?)?;

    if let Some(existing) = session.ledger() {
        if !replace {
            return Err(MonthbookError::Other(format!(
                "Period {} already has {} transactions. Pass --replace to overwrite them.",
                session.period(),
                existing.len()
            )));
        }
    }

    let grid = load_grid(&file_path)?;
    let result = session.ingest(&grid, &settings.columns)?;

    println!("{} imported into {}", result.imported, session.period());
    println!(
        "{} categorized, {} unclassified",
        result.categorize.classified, result.categorize.unclassified
    );
    print_summary(session.period(), &session.summary()?);
    Ok(())
}

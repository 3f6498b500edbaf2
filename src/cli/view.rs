use std::path::Path;

use comfy_table::{Cell, Table};

use super::{open_session, parse_period};
use crate::error::{MonthbookError, Result};
use crate::fmt::money;
use crate::models::UNCLASSIFIED;
use crate::reconciler::{CategoryFilter, FilteredView};

pub fn run(period: Option<String>, categories: Vec<String>) -> Result<()> {
    let (settings, session) = open_session(parse_period(period.as_deref())?)?;
    let filter = if categories.is_empty() {
        CategoryFilter::all()
    } else {
        CategoryFilter::only(categories)
    };
    let view = session.view(&filter)?;
    save_view(&settings.view_path(), &view)?;

    let Some(ledger) = session.ledger() else {
        return Ok(());
    };
    if view.is_empty() {
        println!("No rows in {} match the selected categories.", session.period());
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Date", "Description", "Amount", "Category"]);
    for (pos, txn) in view.rows(ledger) {
        table.add_row(vec![
            Cell::new(pos),
            Cell::new(txn.id()),
            Cell::new(txn.date()),
            Cell::new(txn.description()),
            Cell::new(money(txn.amount())),
            Cell::new(txn.category()),
        ]);
    }
    println!("{} ({} of {} rows)\n{table}", session.period(), view.len(), ledger.len());

    let mut options: Vec<&str> = session.rules().category_names();
    options.push(UNCLASSIFIED);
    println!("Categories: {}", options.join(", "));
    println!("Correct a row with: monthbook edit --set <#>:category=<name>");
    Ok(())
}

pub(crate) fn save_view(path: &Path, view: &FilteredView) -> Result<()> {
    let json = serde_json::to_string_pretty(view).map_err(|e| MonthbookError::Other(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub(crate) fn load_view(path: &Path) -> Result<FilteredView> {
    if !path.exists() {
        return Err(MonthbookError::Other(
            "No view to edit. Run `monthbook view` first.".to_string(),
        ));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| MonthbookError::Other(format!("Unreadable view file {}: {e}", path.display())))
}

use comfy_table::{Cell, Table};

use super::open_store;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;
use crate::store::PeriodStore;

pub fn run() -> Result<()> {
    let store = open_store(&load_settings())?;
    let periods = store.list_periods()?;
    if periods.is_empty() {
        println!("No periods stored yet. Run `monthbook import <file>` to add one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Period", "Rows", "Total"]);
    for period in &periods {
        match store.read(period)? {
            Some(ledger) => table.add_row(vec![
                Cell::new(period),
                Cell::new(ledger.len()),
                Cell::new(money(ledger.total())),
            ]),
            None => table.add_row(vec![Cell::new(period), Cell::new(0), Cell::new("")]),
        };
    }
    println!("Periods\n{table}");
    Ok(())
}

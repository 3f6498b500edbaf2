use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{open_session, parse_period};
use crate::error::Result;
use crate::fmt::{money, percent};
use crate::models::{PeriodKey, UNCLASSIFIED};
use crate::reports::Summary;

pub fn run(period: Option<String>) -> Result<()> {
    let (_settings, session) = open_session(parse_period(period.as_deref())?)?;
    let summary = session.summary()?;
    print_summary(session.period(), &summary);
    Ok(())
}

pub(crate) fn print_summary(period: &PeriodKey, summary: &Summary) {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count"]);
    for line in &summary.lines {
        let name = if line.category == UNCLASSIFIED {
            line.category.yellow().to_string()
        } else {
            line.category.clone()
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(money(line.total)),
            Cell::new(percent(line.share)),
            Cell::new(line.count),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(summary.grand_total)),
        Cell::new(""),
        Cell::new(summary.row_count),
    ]);
    println!("Spending {period}\n{table}");
}

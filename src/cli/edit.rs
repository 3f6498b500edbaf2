use colored::Colorize;
use comfy_table::{Cell, Table};

use super::open_session;
use super::report::print_summary;
use super::view::load_view;
use crate::error::Result;
use crate::reconciler::{Edit, EditOutcome};
use crate::settings::load_settings;

pub fn run(sets: &[String], dry_run: bool) -> Result<()> {
    let edits = sets
        .iter()
        .map(|s| s.parse::<Edit>())
        .collect::<Result<Vec<_>>>()?;
    let view = load_view(&load_settings().view_path())?;
    let (_settings, mut session) = open_session(view.period().clone())?;

    let (report, summary) = session.apply_edits(&view, &edits)?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Field", "Value", "Result"]);
    for (edit, outcome) in &report.outcomes {
        let result = match outcome {
            EditOutcome::Applied(id) => format!("updated {id}").green().to_string(),
            EditOutcome::Unchanged(id) => format!("{id} unchanged"),
            EditOutcome::Dropped(reason) => format!("skipped: {reason}").yellow().to_string(),
        };
        table.add_row(vec![
            Cell::new(edit.position),
            Cell::new(edit.field),
            Cell::new(&edit.value),
            Cell::new(result),
        ]);
    }
    println!("Edits\n{table}");
    if report.dropped() > 0 {
        println!("{} edit(s) skipped; run `monthbook view` again if the view is stale.", report.dropped());
    }

    if dry_run {
        println!("Dry run: {} change(s) not saved.", report.applied());
    } else if report.applied() > 0 {
        session.save()?;
        println!("Saved {} change(s) to {}.", report.applied(), session.period());
    } else {
        println!("Nothing to save.");
    }
    print_summary(session.period(), &summary);
    Ok(())
}

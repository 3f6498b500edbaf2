use comfy_table::{Cell, Table};

use super::report::print_summary;
use super::{open_rules, open_session, parse_period, warn_rules_unavailable};
use crate::error::Result;
use crate::settings::load_settings;

pub fn list() -> Result<()> {
    let settings = load_settings();
    let store = open_rules(&settings);
    if let Some(reason) = store.degraded() {
        warn_rules_unavailable(reason);
        return Ok(());
    }

    if store.snapshot().is_empty() {
        println!("No rules defined in {}.", settings.rules_path().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Keywords"]);
    for (i, rule) in store.snapshot().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rule.name),
            Cell::new(rule.keywords.join(", ")),
        ]);
    }
    println!("Rules ({})\n{table}", settings.rules_path().display());
    Ok(())
}

pub fn sync(period: Option<String>) -> Result<()> {
    let (_settings, mut session) = open_session(parse_period(period.as_deref())?)?;
    match session.sync_rules() {
        Some(result) => {
            session.save()?;
            println!(
                "Rules reloaded ({} categories). {} categorized, {} unclassified ({} changed)",
                session.rules().len(),
                result.classified,
                result.unclassified,
                result.changed
            );
            print_summary(session.period(), &session.summary()?);
        }
        None => println!(
            "Rules reloaded ({} categories). No transactions stored for {}.",
            session.rules().len(),
            session.period()
        ),
    }
    Ok(())
}

use super::report::print_summary;
use super::{open_session, parse_period};
use crate::error::Result;

pub fn run(period: Option<String>) -> Result<()> {
    let (_settings, mut session) = open_session(parse_period(period.as_deref())?)?;
    let result = session.reclassify()?;
    session.save()?;
    println!(
        "{} categorized, {} unclassified ({} changed)",
        result.classified, result.unclassified, result.changed
    );
    print_summary(session.period(), &session.summary()?);
    Ok(())
}

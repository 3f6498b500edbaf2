use crate::ledger::Ledger;
use crate::models::UNCLASSIFIED;
use crate::rules::RuleSet;

/// First category (in rule order) with a keyword contained in the
/// lower-cased description, else `unclassified`.
pub fn classify<'r>(description: &str, rules: &'r RuleSet) -> &'r str {
    let desc = description.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| desc.contains(kw.as_str())))
        .map(|rule| rule.name.as_str())
        .unwrap_or(UNCLASSIFIED)
}

pub struct CategorizeResult {
    pub changed: usize,
    pub classified: usize,
    pub unclassified: usize,
}

/// Overwrite every row's category from `rules`. Repeating the call with the
/// same rules changes nothing.
pub fn categorize_ledger(ledger: &mut Ledger, rules: &RuleSet) -> CategorizeResult {
    let mut result = CategorizeResult {
        changed: 0,
        classified: 0,
        unclassified: 0,
    };
    for txn in ledger.rows_mut() {
        let category = classify(txn.description(), rules);
        if category == UNCLASSIFIED {
            result.unclassified += 1;
        } else {
            result.classified += 1;
        }
        if txn.set_category(category) {
            result.changed += 1;
        }
    }
    log::debug!(
        "categorized {} rows: {} changed, {} unclassified",
        ledger.len(),
        result.changed,
        result.unclassified
    );
    result
}

/// Stored categories that are neither a rule name nor `unclassified`,
/// in first-encountered order.
pub fn unknown_categories<'l>(ledger: &'l Ledger, rules: &RuleSet) -> Vec<&'l str> {
    let mut unknown: Vec<&str> = Vec::new();
    for txn in ledger.rows() {
        let category = txn.category();
        if category != UNCLASSIFIED && !rules.contains(category) && !unknown.contains(&category) {
            unknown.push(category);
        }
    }
    unknown
}

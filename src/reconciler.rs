use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MonthbookError, Result};
use crate::ledger::Ledger;
use crate::models::{Field, PeriodKey, RowId, Transaction, UNCLASSIFIED};
use crate::rules::RuleSet;

/// Categories to show; empty selects every row.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    selected: Vec<String>,
}

impl CategoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        self.selected.is_empty() || self.selected.iter().any(|c| c == txn.category())
    }
}

/// A row as it looked when the view was rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CapturedRow {
    id: RowId,
    date: String,
    description: String,
    amount: String,
}

impl CapturedRow {
    fn of(txn: &Transaction) -> Self {
        Self {
            id: txn.id(),
            date: txn.date().to_string(),
            description: txn.description().to_string(),
            amount: txn.amount().normalize().to_string(),
        }
    }

    /// Same id is not enough: ids are reassigned when a period is re-read,
    /// so the immutable fields must still agree.
    fn matches(&self, txn: &Transaction) -> bool {
        *self == Self::of(txn)
    }
}

/// The rows of a filtered subset, captured when the subset was rendered.
/// Positions in edits are resolved against this list only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredView {
    period: PeriodKey,
    rows: Vec<CapturedRow>,
}

impl FilteredView {
    pub fn capture(ledger: &Ledger, filter: &CategoryFilter) -> Self {
        Self {
            period: ledger.period().clone(),
            rows: ledger
                .rows()
                .iter()
                .filter(|t| filter.matches(t))
                .map(CapturedRow::of)
                .collect(),
        }
    }

    pub fn period(&self) -> &PeriodKey {
        &self.period
    }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of the subset for display, with their positions. Rows that no
    /// longer match what was captured are skipped.
    pub fn rows<'l>(&'l self, ledger: &'l Ledger) -> impl Iterator<Item = (usize, &'l Transaction)> + 'l {
        self.rows.iter().enumerate().filter_map(move |(pos, captured)| {
            ledger
                .get(captured.id)
                .filter(|t| captured.matches(t))
                .map(|t| (pos, t))
        })
    }
}

/// One cell edit against a view: `POSITION:FIELD=VALUE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub position: usize,
    pub field: Field,
    pub value: String,
}

impl FromStr for Edit {
    type Err = MonthbookError;

    fn from_str(s: &str) -> Result<Self> {
        let re = Regex::new(r"^\s*(\d+)\s*:\s*([A-Za-z_]+)\s*=(.*)$")
            .map_err(|e| MonthbookError::Other(e.to_string()))?;
        let caps = re
            .captures(s)
            .ok_or_else(|| MonthbookError::InvalidEdit(format!("'{s}' (expected POSITION:FIELD=VALUE)")))?;
        // All digits; only overflow can fail, and that is out of range anyway.
        let position = caps[1].parse().unwrap_or(usize::MAX);
        Ok(Self {
            position,
            field: caps[2].parse()?,
            value: caps[3].trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    OutOfRange { position: usize, len: usize },
    MissingRow(RowId),
    StaleRow(RowId),
    ImmutableField(Field),
    UnknownCategory(String),
    PeriodMismatch { view: PeriodKey, ledger: PeriodKey },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { position, len } => {
                write!(f, "position {position} is outside the view ({len} rows)")
            }
            Self::MissingRow(id) => write!(f, "row {id} is no longer in the ledger"),
            Self::StaleRow(id) => write!(f, "row {id} changed since the view was taken"),
            Self::ImmutableField(field) => write!(f, "{field} cannot be changed after import"),
            Self::UnknownCategory(c) => write!(f, "'{c}' is not a known category"),
            Self::PeriodMismatch { view, ledger } => {
                write!(f, "view was captured for {view}, ledger is {ledger}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied(RowId),
    Unchanged(RowId),
    Dropped(DropReason),
}

pub struct ReconcileReport {
    pub outcomes: Vec<(Edit, EditOutcome)>,
}

impl ReconcileReport {
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, EditOutcome::Applied(_)))
            .count()
    }

    pub fn dropped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, EditOutcome::Dropped(_)))
            .count()
    }
}

fn apply_one(ledger: &mut Ledger, view: &FilteredView, edit: &Edit, rules: &RuleSet) -> EditOutcome {
    let Some(captured) = view.rows.get(edit.position) else {
        return EditOutcome::Dropped(DropReason::OutOfRange {
            position: edit.position,
            len: view.len(),
        });
    };
    let id = captured.id;
    match ledger.get(id) {
        None => return EditOutcome::Dropped(DropReason::MissingRow(id)),
        Some(txn) if !captured.matches(txn) => return EditOutcome::Dropped(DropReason::StaleRow(id)),
        Some(_) => {}
    }
    if !edit.field.is_mutable() {
        return EditOutcome::Dropped(DropReason::ImmutableField(edit.field));
    }
    let category = edit.value.trim();
    if category != UNCLASSIFIED && !rules.contains(category) {
        return EditOutcome::Dropped(DropReason::UnknownCategory(category.to_string()));
    }
    match ledger.set_category(id, category) {
        Some(true) => EditOutcome::Applied(id),
        Some(false) => EditOutcome::Unchanged(id),
        None => EditOutcome::Dropped(DropReason::MissingRow(id)),
    }
}

/// Merge edits made against `view` into `ledger`, addressing rows through
/// the view's captured ids. Edits that cannot be applied are dropped and
/// reported; they never touch other rows.
pub fn reconcile(ledger: &mut Ledger, view: &FilteredView, edits: &[Edit], rules: &RuleSet) -> ReconcileReport {
    let mut outcomes = Vec::with_capacity(edits.len());
    for edit in edits {
        let outcome = if view.period() != ledger.period() {
            EditOutcome::Dropped(DropReason::PeriodMismatch {
                view: view.period().clone(),
                ledger: ledger.period().clone(),
            })
        } else {
            apply_one(ledger, view, edit, rules)
        };
        if let EditOutcome::Dropped(reason) = &outcome {
            log::warn!("dropped edit at position {}: {reason}", edit.position);
        }
        outcomes.push((edit.clone(), outcome));
    }
    ReconcileReport { outcomes }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::categorizer::categorize_ledger;
    use crate::models::ParsedRow;
    use crate::reports::summarize;

    fn rules() -> RuleSet {
        [("Coffee", "starbucks"), ("Transit", "metro")].into_iter().collect()
    }

    fn sample_ledger() -> Ledger {
        let rows = [
            ("2026-02-01", "Starbucks Taipei", 120),
            ("2026-02-02", "Metro Card", 30),
            ("2026-02-03", "Unknown Merchant", 50),
            ("2026-02-04", "Metro Card", 30),
            ("2026-02-05", "Starbucks Taipei", 120),
        ]
        .into_iter()
        .map(|(date, description, amount)| ParsedRow {
            date: date.to_string(),
            description: description.to_string(),
            amount: Decimal::from(amount),
        })
        .collect();
        let mut ledger = Ledger::from_parsed(PeriodKey::parse("202602").unwrap(), rows);
        categorize_ledger(&mut ledger, &rules());
        ledger
    }

    fn edit(position: usize, field: Field, value: &str) -> Edit {
        Edit {
            position,
            field,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_capture_filters_by_category() {
        let ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));
        assert_eq!(view.ids(), vec![RowId(2), RowId(4)]);
        let all = FilteredView::capture(&ledger, &CategoryFilter::all());
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_edit_addresses_captured_id() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));
        let report = reconcile(&mut ledger, &view, &[edit(1, Field::Category, "Coffee")], &rules());

        assert_eq!(report.outcomes[0].1, EditOutcome::Applied(RowId(4)));
        assert_eq!(ledger.len(), before.len());
        for (old, new) in before.rows().iter().zip(ledger.rows()) {
            assert_eq!(old.id(), new.id());
            assert_eq!(old.amount(), new.amount());
            assert_eq!(old.description(), new.description());
            if new.id() == RowId(4) {
                assert_eq!(new.category(), "Coffee");
            } else {
                assert_eq!(old.category(), new.category());
            }
        }
    }

    #[test]
    fn test_positions_stay_bound_after_earlier_edits() {
        // Editing position 0 moves r2 out of the Transit filter; position 1
        // must still mean r4, not whatever is second in a fresh filter.
        let mut ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));
        let edits = [
            edit(0, Field::Category, "Coffee"),
            edit(1, Field::Category, UNCLASSIFIED),
        ];
        let report = reconcile(&mut ledger, &view, &edits, &rules());
        assert_eq!(report.applied(), 2);
        assert_eq!(ledger.get(RowId(2)).unwrap().category(), "Coffee");
        assert_eq!(ledger.get(RowId(4)).unwrap().category(), UNCLASSIFIED);
        assert_eq!(ledger.get(RowId(3)).unwrap().category(), UNCLASSIFIED);
    }

    #[test]
    fn test_out_of_range_edit_is_dropped() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));
        let report = reconcile(&mut ledger, &view, &[edit(2, Field::Category, "Coffee")], &rules());
        assert_eq!(
            report.outcomes[0].1,
            EditOutcome::Dropped(DropReason::OutOfRange { position: 2, len: 2 })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_overflowing_position_is_dropped_not_rejected() {
        let e: Edit = "99999999999999999999999:category=Coffee".parse().unwrap();
        assert_eq!(e.position, usize::MAX);

        let mut ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));
        let report = reconcile(&mut ledger, &view, &[edit(0, Field::Category, "Coffee"), e], &rules());
        assert_eq!(report.outcomes[0].1, EditOutcome::Applied(RowId(2)));
        assert_eq!(
            report.outcomes[1].1,
            EditOutcome::Dropped(DropReason::OutOfRange {
                position: usize::MAX,
                len: 2
            })
        );
    }

    #[test]
    fn test_edit_against_reimported_ledger_is_dropped() {
        let ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));

        // Same period re-imported: r2 now names a different transaction.
        let rows = [("2026-02-02", "Metro Card", 30), ("2026-02-28", "Rent", 9000)]
            .into_iter()
            .map(|(date, description, amount)| ParsedRow {
                date: date.to_string(),
                description: description.to_string(),
                amount: Decimal::from(amount),
            })
            .collect();
        let mut replaced = Ledger::from_parsed(ledger.period().clone(), rows);
        categorize_ledger(&mut replaced, &rules());
        let before = replaced.clone();

        let report = reconcile(&mut replaced, &view, &[edit(0, Field::Category, "Coffee")], &rules());
        assert_eq!(
            report.outcomes[0].1,
            EditOutcome::Dropped(DropReason::StaleRow(RowId(2)))
        );
        assert_eq!(replaced, before);
        assert_eq!(view.rows(&replaced).count(), 0);
    }

    #[test]
    fn test_captured_rows_survive_a_store_roundtrip() {
        // Amounts written as "30.50" come back equal after a re-read.
        let mut ledger = Ledger::new(PeriodKey::parse("202602").unwrap());
        ledger.push(
            ParsedRow {
                date: "2026-02-02".to_string(),
                description: "Metro Card".to_string(),
                amount: Decimal::from_str("30.50").unwrap(),
            },
            "Transit",
        );
        let view = FilteredView::capture(&ledger, &CategoryFilter::all());
        let mut reread = Ledger::new(ledger.period().clone());
        reread.push(
            ParsedRow {
                date: "2026-02-02".to_string(),
                description: "Metro Card".to_string(),
                amount: Decimal::from_str("30.5").unwrap(),
            },
            "Transit",
        );
        let report = reconcile(&mut reread, &view, &[edit(0, Field::Category, "Coffee")], &rules());
        assert_eq!(report.outcomes[0].1, EditOutcome::Applied(RowId(1)));
    }

    #[test]
    fn test_immutable_fields_and_unknown_categories_are_dropped() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();
        let view = FilteredView::capture(&ledger, &CategoryFilter::all());
        let edits = [
            edit(0, Field::Amount, "1"),
            edit(0, Field::Description, "x"),
            edit(0, Field::Category, "Groceries"),
        ];
        let report = reconcile(&mut ledger, &view, &edits, &rules());
        assert_eq!(report.dropped(), 3);
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_stale_view_from_other_ledger_is_dropped() {
        let mut ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::all());
        let mut shorter = Ledger::new(ledger.period().clone());
        shorter.push(
            ParsedRow {
                date: "2026-02-01".to_string(),
                description: "Starbucks".to_string(),
                amount: Decimal::from(1),
            },
            "Coffee",
        );
        let report = reconcile(&mut shorter, &view, &[edit(4, Field::Category, "Transit")], &rules());
        assert_eq!(
            report.outcomes[0].1,
            EditOutcome::Dropped(DropReason::MissingRow(RowId(5)))
        );

        let other = Ledger::new(PeriodKey::parse("202603").unwrap());
        let other_view = FilteredView::capture(&other, &CategoryFilter::all());
        let report = reconcile(&mut ledger, &other_view, &[edit(0, Field::Category, "Coffee")], &rules());
        assert!(matches!(
            report.outcomes[0].1,
            EditOutcome::Dropped(DropReason::PeriodMismatch { .. })
        ));
    }

    #[test]
    fn test_unchanged_edit() {
        let mut ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Coffee"]));
        let report = reconcile(&mut ledger, &view, &[edit(0, Field::Category, "Coffee")], &rules());
        assert_eq!(report.outcomes[0].1, EditOutcome::Unchanged(RowId(1)));
        assert_eq!(report.applied(), 0);
    }

    #[test]
    fn test_reaggregate_after_emptying_a_category() {
        let rows = [
            ("2026-02-01", "Starbucks Taipei", 120),
            ("2026-02-02", "Metro Card", 30),
            ("2026-02-03", "Unknown Merchant", 50),
        ]
        .into_iter()
        .map(|(date, description, amount)| ParsedRow {
            date: date.to_string(),
            description: description.to_string(),
            amount: Decimal::from(amount),
        })
        .collect();
        let mut ledger = Ledger::from_parsed(PeriodKey::parse("202602").unwrap(), rows);
        categorize_ledger(&mut ledger, &rules());

        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Transit"]));
        assert_eq!(view.ids(), vec![RowId(2)]);
        reconcile(&mut ledger, &view, &[edit(0, Field::Category, "Coffee")], &rules());

        let summary = summarize(&ledger);
        assert_eq!(summary.total_for("Coffee"), Decimal::from(150));
        assert_eq!(summary.total_for("Transit"), Decimal::ZERO);
        assert_eq!(summary.grand_total, Decimal::from(200));
    }

    #[test]
    fn test_view_rows_and_serde() {
        let ledger = sample_ledger();
        let view = FilteredView::capture(&ledger, &CategoryFilter::only(["Coffee"]));
        let shown: Vec<(usize, RowId)> = view.rows(&ledger).map(|(p, t)| (p, t.id())).collect();
        assert_eq!(shown, vec![(0, RowId(1)), (1, RowId(5))]);

        let json = serde_json::to_string(&view).unwrap();
        let back: FilteredView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }

    #[test]
    fn test_parse_edit() {
        let e: Edit = "3:category=Coffee".parse().unwrap();
        assert_eq!(e, edit(3, Field::Category, "Coffee"));
        let e: Edit = "0:category=餐飲 ".parse().unwrap();
        assert_eq!(e.value, "餐飲");
        assert!("category=Coffee".parse::<Edit>().is_err());
        assert!("1:vendor=x".parse::<Edit>().is_err());
    }
}

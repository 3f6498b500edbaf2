use crate::categorizer::{categorize_ledger, unknown_categories, CategorizeResult};
use crate::columns::ColumnSpec;
use crate::error::{MonthbookError, Result};
use crate::importer::parse_grid;
use crate::ledger::Ledger;
use crate::models::PeriodKey;
use crate::reconciler::{reconcile, CategoryFilter, Edit, FilteredView, ReconcileReport};
use crate::reports::{summarize, Summary};
use crate::rules::{RuleSet, RuleStore};
use crate::store::PeriodStore;

pub struct IngestResult {
    pub imported: usize,
    pub categorize: CategorizeResult,
}

/// Everything one interaction works on: the period store, the rule store
/// and the working ledger of the active period.
pub struct Session<S: PeriodStore> {
    store: S,
    rules: RuleStore,
    period: PeriodKey,
    ledger: Option<Ledger>,
}

impl<S: PeriodStore> Session<S> {
    /// A session with no ledger loaded. Call `open_period` to load one.
    pub fn new(store: S, rules: RuleStore, period: PeriodKey) -> Self {
        Self {
            store,
            rules,
            period,
            ledger: None,
        }
    }

    /// Switch to `period`, replacing the working ledger with the stored
    /// record. Returns false when the period has nothing stored yet.
    pub fn open_period(&mut self, period: PeriodKey) -> Result<bool> {
        self.clear();
        self.period = period;
        self.ledger = self.store.read(&self.period)?.filter(|l| !l.is_empty());
        if let (Some(ledger), None) = (&self.ledger, self.rules.degraded()) {
            let unknown = unknown_categories(ledger, self.rules.snapshot());
            if !unknown.is_empty() {
                log::warn!(
                    "period {} uses categories missing from the rules: {}; run `monthbook rules sync` to reclassify",
                    self.period,
                    unknown.join(", ")
                );
            }
        }
        Ok(self.ledger.is_some())
    }

    pub fn period(&self) -> &PeriodKey {
        &self.period
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }

    fn require_ledger(&self) -> Result<&Ledger> {
        self.ledger
            .as_ref()
            .ok_or_else(|| MonthbookError::PeriodEmpty(self.period.to_string()))
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules.snapshot()
    }

    pub fn rules_degraded(&self) -> Option<&str> {
        self.rules.degraded()
    }

    /// Replace the working ledger wholesale.
    pub fn replace(&mut self, ledger: Ledger) {
        self.period = ledger.period().clone();
        self.ledger = Some(ledger);
    }

    /// Drop the working ledger without touching the store.
    pub fn clear(&mut self) {
        self.ledger = None;
    }

    /// Turn an uploaded grid into the working ledger of the active period,
    /// classify it, and persist it. A grid whose columns cannot be resolved
    /// leaves the session untouched. If the write fails the new ledger is
    /// kept in memory so `save` can be retried.
    pub fn ingest(&mut self, grid: &[Vec<String>], columns: &ColumnSpec) -> Result<IngestResult> {
        let rows = parse_grid(grid, columns)?;
        let mut ledger = Ledger::from_parsed(self.period.clone(), rows);
        let categorize = categorize_ledger(&mut ledger, self.rules.snapshot());
        let imported = ledger.len();
        self.replace(ledger);
        self.store.ensure_exists(&self.period)?;
        self.save()?;
        Ok(IngestResult {
            imported,
            categorize,
        })
    }

    /// Bulk-reclassify the working ledger against the current rule snapshot.
    pub fn reclassify(&mut self) -> Result<CategorizeResult> {
        let Self { rules, ledger, period, .. } = self;
        let ledger = ledger
            .as_mut()
            .ok_or_else(|| MonthbookError::PeriodEmpty(period.to_string()))?;
        Ok(categorize_ledger(ledger, rules.snapshot()))
    }

    /// Re-read the rule source and reclassify the working ledger, if any.
    pub fn sync_rules(&mut self) -> Option<CategorizeResult> {
        self.rules.reload();
        self.reclassify().ok()
    }

    pub fn view(&self, filter: &CategoryFilter) -> Result<FilteredView> {
        Ok(FilteredView::capture(self.require_ledger()?, filter))
    }

    /// Apply every edit to the working ledger, then summarize the full
    /// ledger. The summary never sees a partially edited or filtered ledger.
    pub fn apply_edits(&mut self, view: &FilteredView, edits: &[Edit]) -> Result<(ReconcileReport, Summary)> {
        let Self { rules, ledger, period, .. } = self;
        let ledger = ledger
            .as_mut()
            .ok_or_else(|| MonthbookError::PeriodEmpty(period.to_string()))?;
        let report = reconcile(ledger, view, edits, rules.snapshot());
        let summary = summarize(ledger);
        Ok((report, summary))
    }

    pub fn summary(&self) -> Result<Summary> {
        Ok(summarize(self.require_ledger()?))
    }

    /// Write the working ledger over the stored record of its period.
    pub fn save(&mut self) -> Result<()> {
        let Self { store, ledger, period, .. } = self;
        let ledger = ledger
            .as_ref()
            .ok_or_else(|| MonthbookError::PeriodEmpty(period.to_string()))?;
        store.write(ledger.period(), ledger)
    }

    #[cfg(test)]
    fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    fn ledger_mut(&mut self) -> Option<&mut Ledger> {
        self.ledger.as_mut()
    }
}

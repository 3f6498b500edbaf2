use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{ParsedRow, PeriodKey, RowId, Transaction, UNCLASSIFIED};

/// Canonical transaction table for one period.
///
/// Rows are only ever appended; row ids are handed out sequentially and never
/// reused, so an id captured by a view keeps pointing at the same row for the
/// lifetime of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    period: PeriodKey,
    rows: Vec<Transaction>,
    index: HashMap<RowId, usize>,
    next_id: u64,
}

impl Ledger {
    pub fn new(period: PeriodKey) -> Self {
        Self {
            period,
            rows: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Build a ledger from parsed upload rows; every row starts unclassified.
    pub fn from_parsed(period: PeriodKey, rows: Vec<ParsedRow>) -> Self {
        let mut ledger = Self::new(period);
        for row in rows {
            ledger.push(row, UNCLASSIFIED);
        }
        ledger
    }

    pub fn push(&mut self, row: ParsedRow, category: &str) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.rows.len());
        self.rows.push(Transaction::new(id, row, category.to_string()));
        id
    }

    pub fn period(&self) -> &PeriodKey {
        &self.period
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&Transaction> {
        self.index.get(&id).map(|&pos| &self.rows[pos])
    }

    /// Overwrite the category of one row. Returns `None` when the id is
    /// unknown, otherwise whether the value changed.
    pub fn set_category(&mut self, id: RowId, category: &str) -> Option<bool> {
        let pos = *self.index.get(&id)?;
        Some(self.rows[pos].set_category(category))
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Transaction> {
        self.rows.iter_mut()
    }

    pub fn total(&self) -> Decimal {
        self.rows.iter().map(|t| t.amount()).sum()
    }
}

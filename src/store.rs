use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::PeriodKey;

/// Persistence of one ledger snapshot per period.
///
/// Records are never deleted. `write` always replaces the whole record.
pub trait PeriodStore {
    /// `None` when the period has no record, an empty record, or a record
    /// that does not have the expected columns.
    fn read(&self, period: &PeriodKey) -> Result<Option<Ledger>>;

    /// Create an empty record for `period` if there is none.
    fn ensure_exists(&mut self, period: &PeriodKey) -> Result<()>;

    /// Replace the record for `period` with `ledger`.
    fn write(&mut self, period: &PeriodKey, ledger: &Ledger) -> Result<()>;

    fn list_periods(&self) -> Result<Vec<PeriodKey>>;
}

#[cfg(test)]
pub use memory::MemoryStore;

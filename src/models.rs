use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MonthbookError, Result};

/// Category assigned when no rule matches, or when no rules are loaded.
pub const UNCLASSIFIED: &str = "unclassified";

/// Stable identity of a ledger row, assigned once at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub(crate) u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Reporting period, `YYYYMM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || MonthbookError::InvalidPeriod(raw.to_string());
        if raw.len() != 6 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = raw[..4].parse().map_err(|_| invalid())?;
        let month: u32 = raw[4..].parse().map_err(|_| invalid())?;
        chrono::NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self(raw.to_string()))
    }

    /// The current local month.
    pub fn current() -> Self {
        Self(chrono::Local::now().format("%Y%m").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn table_name(&self) -> String {
        format!("period_{}", self.0)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKey {
    type Err = MonthbookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = MonthbookError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.0
    }
}

/// Transaction fields as addressed by the column resolver and by edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Description,
    Amount,
    Category,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Category => "category",
        }
    }

    /// Only the category may change after ingestion.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Category)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = MonthbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "description" | "desc" => Ok(Self::Description),
            "amount" => Ok(Self::Amount),
            "category" | "cat" => Ok(Self::Category),
            other => Err(MonthbookError::InvalidEdit(format!("unknown field '{other}'"))),
        }
    }
}

/// Intermediate representation from an uploaded grid before it enters a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub date: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    id: RowId,
    date: String,
    description: String,
    amount: Decimal,
    category: String,
}

impl Transaction {
    pub(crate) fn new(id: RowId, row: ParsedRow, category: String) -> Self {
        Self {
            id,
            date: row.date,
            description: row.description,
            amount: row.amount,
            category,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn set_category(&mut self, category: &str) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category.to_string();
        true
    }
}

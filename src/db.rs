use std::path::Path;

use rusqlite::types::Value;
use rusqlite::Connection;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{MonthbookError, Result};
use crate::importer::parse_amount;
use crate::ledger::Ledger;
use crate::models::{ParsedRow, PeriodKey, UNCLASSIFIED};
use crate::store::PeriodStore;

/// Exact column set of a period table.
pub const COLUMNS: [&str; 4] = ["date", "description", "amount", "category"];

const TABLE_PREFIX: &str = "period_";

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount TEXT NOT NULL,
    category TEXT NOT NULL
);"
    )
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

fn value_to_amount(value: Value) -> Decimal {
    match value {
        Value::Integer(i) => Decimal::from(i),
        Value::Real(f) => Decimal::from_f64(f).unwrap_or(Decimal::ZERO),
        Value::Text(s) => parse_amount(&s),
        _ => Decimal::ZERO,
    }
}

/// SQLite-backed period store: one table per period key.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::from_connection(get_connection(db_path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        Ok(stmt.exists([table])?)
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn read_rows(&self, table: &str) -> rusqlite::Result<Vec<(ParsedRow, String)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT date, description, amount, category FROM \"{table}\" ORDER BY rowid"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                let date: Option<String> = row.get(0)?;
                let description: Option<String> = row.get(1)?;
                let amount: Value = row.get(2)?;
                let category: Option<String> = row.get(3)?;
                Ok((
                    ParsedRow {
                        date: date.unwrap_or_default(),
                        description: description.unwrap_or_default(),
                        amount: value_to_amount(amount),
                    },
                    category
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| UNCLASSIFIED.to_string()),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn overwrite(&mut self, table: &str, ledger: &Ledger) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\";\n{}",
            create_table_sql(table)
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{table}\" (date, description, amount, category) VALUES (?1, ?2, ?3, ?4)"
            ))?;
            for txn in ledger.rows() {
                stmt.execute(rusqlite::params![
                    txn.date(),
                    txn.description(),
                    txn.amount().to_string(),
                    txn.category(),
                ])?;
            }
        }
        tx.commit()
    }
}

impl PeriodStore for SqliteStore {
    fn read(&self, period: &PeriodKey) -> Result<Option<Ledger>> {
        let table = period.table_name();
        if !self.table_exists(&table)? {
            return Ok(None);
        }
        let columns = self.table_columns(&table)?;
        if columns != COLUMNS {
            log::warn!("period {period} has unexpected columns {columns:?}; treating as missing");
            return Ok(None);
        }
        let rows = match self.read_rows(&table) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("period {period} could not be read ({e}); treating as missing");
                return Ok(None);
            }
        };
        if rows.is_empty() {
            return Ok(None);
        }
        let mut ledger = Ledger::new(period.clone());
        for (row, category) in rows {
            ledger.push(row, &category);
        }
        log::debug!("read {} rows for period {period}", ledger.len());
        Ok(Some(ledger))
    }

    fn ensure_exists(&mut self, period: &PeriodKey) -> Result<()> {
        self.conn.execute_batch(&create_table_sql(&period.table_name()))?;
        Ok(())
    }

    fn write(&mut self, period: &PeriodKey, ledger: &Ledger) -> Result<()> {
        self.overwrite(&period.table_name(), ledger)
            .map_err(|e| MonthbookError::StoreWrite {
                period: period.to_string(),
                reason: e.to_string(),
            })?;
        log::debug!("wrote {} rows to period {period}", ledger.len());
        Ok(())
    }

    fn list_periods(&self) -> Result<Vec<PeriodKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'period_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names
            .iter()
            .filter_map(|n| n.strip_prefix(TABLE_PREFIX))
            .filter_map(|k| PeriodKey::parse(k).ok())
            .collect())
    }
}

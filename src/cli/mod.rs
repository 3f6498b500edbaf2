pub mod classify;
pub mod edit;
pub mod import;
pub mod init;
pub mod periods;
pub mod report;
pub mod rules;
pub mod view;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::db::SqliteStore;
use crate::error::{MonthbookError, Result};
use crate::models::PeriodKey;
use crate::rules::{CsvRuleSource, RuleStore};
use crate::session::Session;
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "monthbook",
    version,
    about = "Monthly spending ledger: classify bank exports by keyword rules, correct, and summarize."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up monthbook: choose a data directory, create the database and a starter rules file.
    Init {
        /// Path for monthbook data (default: ~/Documents/monthbook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a CSV/XLSX export as a period's ledger and classify it.
    Import {
        /// Path to the CSV or XLSX export
        file: String,
        /// Period: YYYYMM (default: current month)
        #[arg(long)]
        period: Option<String>,
        /// Overwrite a period that already has transactions
        #[arg(long)]
        replace: bool,
    },
    /// Inspect or re-read the keyword rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Re-run classification over every transaction of a period.
    Classify {
        /// Period: YYYYMM (default: current month)
        #[arg(long)]
        period: Option<String>,
    },
    /// Show a filtered, numbered view of a period for editing.
    View {
        /// Period: YYYYMM (default: current month)
        #[arg(long)]
        period: Option<String>,
        /// Only show these categories (repeatable; default: all)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Correct rows of the last view, then save and summarize.
    Edit {
        /// Edit as POSITION:FIELD=VALUE, e.g. 0:category=Coffee (repeatable)
        #[arg(long = "set", required = true)]
        sets: Vec<String>,
        /// Apply and summarize without saving
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Category totals and shares for a period.
    Report {
        /// Period: YYYYMM (default: current month)
        #[arg(long)]
        period: Option<String>,
    },
    /// List stored periods.
    Periods,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List categories and keywords in rule order.
    List,
    /// Re-read the rules file and reclassify a period.
    Sync {
        /// Period: YYYYMM (default: current month)
        #[arg(long)]
        period: Option<String>,
    },
}

pub(crate) fn parse_period(period: Option<&str>) -> Result<PeriodKey> {
    match period {
        Some(p) => PeriodKey::parse(p),
        None => Ok(PeriodKey::current()),
    }
}

pub(crate) fn open_store(settings: &Settings) -> Result<SqliteStore> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(MonthbookError::Settings(format!(
            "No database found at {}\nRun `monthbook init` to create one.",
            db_path.display()
        )));
    }
    SqliteStore::open(&db_path)
}

pub(crate) fn open_rules(settings: &Settings) -> RuleStore {
    let source = CsvRuleSource::new(settings.rules_path(), settings.rule_columns.clone());
    RuleStore::open(Box::new(source))
}

/// Load settings, the store and the rules, and open `period`.
pub(crate) fn open_session(period: PeriodKey) -> Result<(Settings, Session<SqliteStore>)> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let mut session = Session::new(store, open_rules(&settings), period.clone());
    session.open_period(period)?;
    if let Some(reason) = session.rules_degraded() {
        warn_rules_unavailable(reason);
    }
    Ok((settings, session))
}

pub(crate) fn warn_rules_unavailable(reason: &str) {
    eprintln!(
        "{}",
        format!("Warning: rules unavailable ({reason}); transactions will be unclassified.").yellow()
    );
}

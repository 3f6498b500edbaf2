use std::path::PathBuf;

use crate::db::SqliteStore;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

const STARTER_RULES: &str = "\
category,keywords
Coffee,\"starbucks,louisa,cama\"
Transit,\"metro,mrt,uber,taxi\"
Groceries,\"pxmart,carrefour,全聯\"
Dining,\"mcdonald,麥當勞,摩斯\"
";

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    SqliteStore::open(&settings.db_path())?;

    let rules_path = settings.rules_path();
    if !rules_path.exists() {
        std::fs::write(&rules_path, STARTER_RULES)?;
        println!("Wrote starter rules to {}", rules_path.display());
    }

    println!("Initialized monthbook at {}", resolved.display());
    Ok(())
}

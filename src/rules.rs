use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MonthbookError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered category -> keyword mapping. Order decides which category wins
/// when several match the same description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source row. Keywords are trimmed and lower-cased, empties are
    /// dropped; a blank category name skips the row. A repeated category
    /// keeps its first position and gains the new keywords.
    pub fn push_row(&mut self, category: &str, keywords: &str) {
        let name = category.trim();
        if name.is_empty() {
            return;
        }
        let keywords: Vec<String> = keywords
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(existing) => {
                for kw in keywords {
                    if !existing.keywords.contains(&kw) {
                        existing.keywords.push(kw);
                    }
                }
            }
            None => self.rules.push(CategoryRule {
                name: name.to_string(),
                keywords,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.rules.iter().any(|r| r.name == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut rules = RuleSet::new();
        for (category, keywords) in iter {
            rules.push_row(category, keywords);
        }
        rules
    }
}

/// Where rules come from. Implementations re-read the whole source on every
/// fetch.
pub trait RuleSource {
    fn fetch(&self) -> Result<RuleSet>;
    fn describe(&self) -> String;
}

/// Header names of the two rule columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleColumns {
    #[serde(default = "default_category_headers")]
    pub category: Vec<String>,
    #[serde(default = "default_keyword_headers")]
    pub keywords: Vec<String>,
}

fn default_category_headers() -> Vec<String> {
    vec!["category".to_string(), "分類名稱".to_string()]
}

fn default_keyword_headers() -> Vec<String> {
    vec!["keywords".to_string(), "關鍵字".to_string()]
}

impl Default for RuleColumns {
    fn default() -> Self {
        Self {
            category: default_category_headers(),
            keywords: default_keyword_headers(),
        }
    }
}

/// A human-edited CSV file: one row per category, keywords comma-separated.
pub struct CsvRuleSource {
    path: PathBuf,
    columns: RuleColumns,
}

impl CsvRuleSource {
    pub fn new(path: impl Into<PathBuf>, columns: RuleColumns) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }
}

fn header_index(headers: &csv::StringRecord, names: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().trim_start_matches('\u{feff}');
        names.iter().any(|n| h.eq_ignore_ascii_case(n.trim()))
    })
}

impl RuleSource for CsvRuleSource {
    fn fetch(&self) -> Result<RuleSet> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            MonthbookError::RuleSource(format!("{}: {e}", self.path.display()))
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(std::io::BufReader::new(file));
        let headers = rdr.headers()?.clone();
        let cat_idx = header_index(&headers, &self.columns.category).ok_or_else(|| {
            MonthbookError::RuleSource(format!(
                "{}: no category column (looked for {})",
                self.path.display(),
                self.columns.category.join(", ")
            ))
        })?;
        let kw_idx = header_index(&headers, &self.columns.keywords).ok_or_else(|| {
            MonthbookError::RuleSource(format!(
                "{}: no keywords column (looked for {})",
                self.path.display(),
                self.columns.keywords.join(", ")
            ))
        })?;

        let mut rules = RuleSet::new();
        for result in rdr.records() {
            let record = result?;
            rules.push_row(
                record.get(cat_idx).unwrap_or(""),
                record.get(kw_idx).unwrap_or(""),
            );
        }
        Ok(rules)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Cached copy of the rule source.
///
/// A failed reload never raises: the cache becomes empty, everything
/// classifies as unclassified, and `is_degraded` reports it.
pub struct RuleStore {
    source: Box<dyn RuleSource>,
    cache: RuleSet,
    degraded: Option<String>,
}

impl RuleStore {
    /// Create the store and perform the initial fetch.
    pub fn open(source: Box<dyn RuleSource>) -> Self {
        let mut store = Self {
            source,
            cache: RuleSet::new(),
            degraded: None,
        };
        store.reload();
        store
    }

    /// Discard the cache and re-read the source in full.
    pub fn reload(&mut self) -> &RuleSet {
        match self.source.fetch() {
            Ok(rules) => {
                log::debug!(
                    "loaded {} rule categories from {}",
                    rules.len(),
                    self.source.describe()
                );
                self.cache = rules;
                self.degraded = None;
            }
            Err(e) => {
                let reason = match e {
                    MonthbookError::RuleSource(reason) => reason,
                    other => format!("{}: {other}", self.source.describe()),
                };
                log::warn!("rule source unavailable, classifying without rules: {reason}");
                self.cache = RuleSet::new();
                self.degraded = Some(reason);
            }
        }
        &self.cache
    }

    pub fn snapshot(&self) -> &RuleSet {
        &self.cache
    }

    /// Reason the last reload fell back to an empty rule set, if it did.
    pub fn degraded(&self) -> Option<&str> {
        self.degraded.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    struct Unreachable;

    impl RuleSource for Unreachable {
        fn fetch(&self) -> Result<RuleSet> {
            Err(MonthbookError::RuleSource("connection refused".to_string()))
        }

        fn describe(&self) -> String {
            "unreachable".to_string()
        }
    }

    fn write_rules(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("rules.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_push_row_normalizes_keywords() {
        let mut rules = RuleSet::new();
        rules.push_row("  Coffee ", " Starbucks, LOUISA ,, ");
        rules.push_row("   ", "ignored");
        assert_eq!(rules.len(), 1);
        let rule = rules.iter().next().unwrap();
        assert_eq!(rule.name, "Coffee");
        assert_eq!(rule.keywords, vec!["starbucks", "louisa"]);
    }

    #[test]
    fn test_repeated_category_keeps_first_position() {
        let rules: RuleSet = [("Coffee", "starbucks"), ("Transit", "metro"), ("Coffee", "louisa")]
            .into_iter()
            .collect();
        assert_eq!(rules.category_names(), vec!["Coffee", "Transit"]);
        assert_eq!(rules.iter().next().unwrap().keywords, vec!["starbucks", "louisa"]);
    }

    #[test]
    fn test_csv_source_reads_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rules(
            dir.path(),
            "category,keywords\nCoffee,\"starbucks, louisa\"\nTransit,metro\n,orphan\n",
        );
        let rules = CsvRuleSource::new(&path, RuleColumns::default()).fetch().unwrap();
        assert_eq!(rules.category_names(), vec!["Coffee", "Transit"]);
    }

    #[test]
    fn test_csv_source_accepts_localized_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rules(dir.path(), " 分類名稱 , 關鍵字 \n餐飲,\"麥當勞,摩斯\"\n");
        let rules = CsvRuleSource::new(&path, RuleColumns::default()).fetch().unwrap();
        assert_eq!(rules.category_names(), vec!["餐飲"]);
        assert_eq!(rules.iter().next().unwrap().keywords, vec!["麥當勞", "摩斯"]);
    }

    #[test]
    fn test_csv_source_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rules(dir.path(), "name,words\nCoffee,starbucks\n");
        let err = CsvRuleSource::new(&path, RuleColumns::default()).fetch().unwrap_err();
        assert!(matches!(err, MonthbookError::RuleSource(_)));
    }

    #[test]
    fn test_store_degrades_to_empty_rules() {
        let store = RuleStore::open(Box::new(Unreachable));
        assert!(store.snapshot().is_empty());
        assert_eq!(store.degraded(), Some("connection refused"));
    }

    #[test]
    fn test_store_degrades_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvRuleSource::new(dir.path().join("absent.csv"), RuleColumns::default());
        let store = RuleStore::open(Box::new(source));
        assert!(store.snapshot().is_empty());
        assert!(store.degraded().is_some());
    }

    #[test]
    fn test_reload_picks_up_out_of_band_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rules(dir.path(), "category,keywords\nCoffee,starbucks\n");
        let mut store = RuleStore::open(Box::new(CsvRuleSource::new(&path, RuleColumns::default())));
        assert_eq!(store.snapshot().category_names(), vec!["Coffee"]);

        write_rules(dir.path(), "category,keywords\nTransit,metro\nCoffee,starbucks\n");
        assert_eq!(store.snapshot().category_names(), vec!["Coffee"]);
        store.reload();
        assert_eq!(store.snapshot().category_names(), vec!["Transit", "Coffee"]);

        std::fs::remove_file(&path).unwrap();
        store.reload();
        assert!(store.snapshot().is_empty());
        assert!(store.degraded().is_some());
    }
}

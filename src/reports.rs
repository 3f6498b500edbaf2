use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ledger::Ledger;

pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    /// Fraction of the grand total, 0 when the grand total is 0.
    pub share: f64,
}

pub struct Summary {
    pub lines: Vec<CategoryTotal>,
    pub grand_total: Decimal,
    pub row_count: usize,
}

impl Summary {
    #[cfg(test)]
    pub fn total_for(&self, category: &str) -> Decimal {
        self.lines
            .iter()
            .find(|l| l.category == category)
            .map(|l| l.total)
            .unwrap_or(Decimal::ZERO)
    }
}

pub fn share(total: Decimal, grand_total: Decimal) -> f64 {
    if grand_total.is_zero() {
        return 0.0;
    }
    (total / grand_total).to_f64().unwrap_or(0.0)
}

/// Per-category totals of the full ledger, largest first. Equal totals keep
/// the order in which their categories first appear.
pub fn summarize(ledger: &Ledger) -> Summary {
    let mut lines: Vec<CategoryTotal> = Vec::new();
    for txn in ledger.rows() {
        match lines.iter_mut().find(|l| l.category == txn.category()) {
            Some(line) => {
                line.total += txn.amount();
                line.count += 1;
            }
            None => lines.push(CategoryTotal {
                category: txn.category().to_string(),
                total: txn.amount(),
                count: 1,
                share: 0.0,
            }),
        }
    }
    // sort_by is stable
    lines.sort_by(|a, b| b.total.cmp(&a.total));

    let grand_total = ledger.total();
    for line in &mut lines {
        line.share = share(line.total, grand_total);
    }

    Summary {
        lines,
        grand_total,
        row_count: ledger.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::models::{ParsedRow, PeriodKey, UNCLASSIFIED};

    fn ledger(rows: &[(&str, &str)]) -> Ledger {
        let mut ledger = Ledger::new(PeriodKey::parse("202602").unwrap());
        for (i, (category, amount)) in rows.iter().enumerate() {
            ledger.push(
                ParsedRow {
                    date: "2026-02-01".to_string(),
                    description: format!("row {i}"),
                    amount: Decimal::from_str(amount).unwrap(),
                },
                category,
            );
        }
        ledger
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scenario_totals_and_shares() {
        let l = ledger(&[("Coffee", "120"), ("Transit", "30"), (UNCLASSIFIED, "50")]);
        let s = summarize(&l);
        let names: Vec<&str> = s.lines.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(names, vec!["Coffee", UNCLASSIFIED, "Transit"]);
        assert_eq!(s.grand_total, Decimal::from(200));
        assert!(approx(s.lines[0].share, 0.60));
        assert!(approx(s.lines[1].share, 0.25));
        assert!(approx(s.lines[2].share, 0.15));
    }

    #[test]
    fn test_line_totals_sum_to_grand_total() {
        let l = ledger(&[
            ("Food", "10.10"),
            ("Food", "20.20"),
            (UNCLASSIFIED, "0.30"),
            ("Transit", "1234.56"),
            ("Food", "-5.05"),
        ]);
        let s = summarize(&l);
        let sum: Decimal = s.lines.iter().map(|l| l.total).sum();
        assert_eq!(sum, s.grand_total);
        assert_eq!(s.grand_total, Decimal::from_str("1260.11").unwrap());
        assert_eq!(s.lines.iter().map(|l| l.count).sum::<usize>(), 5);
    }

    #[test]
    fn test_equal_totals_keep_encounter_order() {
        let l = ledger(&[("B", "10"), ("A", "10"), ("C", "30"), ("D", "10")]);
        let names: Vec<String> = summarize(&l).lines.into_iter().map(|l| l.category).collect();
        assert_eq!(names, vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn test_zero_grand_total_has_zero_shares() {
        let l = ledger(&[("Refund", "-50"), ("Food", "50")]);
        let s = summarize(&l);
        assert!(s.grand_total.is_zero());
        assert!(s.lines.iter().all(|l| l.share == 0.0));
    }

    #[test]
    fn test_empty_ledger() {
        let s = summarize(&ledger(&[]));
        assert!(s.lines.is_empty());
        assert_eq!(s.grand_total, Decimal::ZERO);
        assert_eq!(s.total_for("Coffee"), Decimal::ZERO);
    }
}

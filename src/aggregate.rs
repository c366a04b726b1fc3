use std::collections::HashMap;

use chrono::NaiveDate;

use crate::date::Increment;
use crate::models::{Transaction, TransactionType};

/// Per-bucket income and expense sums. One point per populated bucket,
/// keyed by the bucket's first day.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPoint {
    pub date: NaiveDate,
    pub income: f64,
    pub expense: f64,
}

/// Group matching transactions into calendar buckets. Buckets with no
/// matches are not materialized; output is sorted ascending by bucket date
/// so results are stable across runs.
pub fn aggregate<F>(txns: &[Transaction], inc: Increment, matches: F) -> Vec<AggregationPoint>
where
    F: Fn(&Transaction) -> bool,
{
    // AllTime is one bucket spanning everything, keyed by the earliest
    // matching date rather than a calendar boundary.
    if inc == Increment::AllTime {
        let mut min: Option<NaiveDate> = None;
        let (mut income, mut expense) = (0.0, 0.0);
        for txn in txns.iter().filter(|t| matches(t)) {
            min = Some(min.map_or(txn.date, |m| m.min(txn.date)));
            match txn.txn_type {
                TransactionType::Income => income += txn.amount,
                TransactionType::Expense => expense += txn.amount,
            }
        }
        return match min {
            Some(date) => vec![AggregationPoint {
                date,
                income,
                expense,
            }],
            None => Vec::new(),
        };
    }

    let mut buckets: HashMap<NaiveDate, (f64, f64)> = HashMap::new();
    for txn in txns {
        if !matches(txn) {
            continue;
        }
        let bucket = buckets.entry(inc.first_day(txn.date)).or_default();
        match txn.txn_type {
            TransactionType::Income => bucket.0 += txn.amount,
            TransactionType::Expense => bucket.1 += txn.amount,
        }
    }
    let mut points: Vec<AggregationPoint> = buckets
        .into_iter()
        .map(|(date, (income, expense))| AggregationPoint {
            date,
            income,
            expense,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Aggregate a single account's transactions, or all accounts when
/// `account` is `None`.
pub fn aggregate_by_account(
    txns: &[Transaction],
    inc: Increment,
    account: Option<&str>,
) -> Vec<AggregationPoint> {
    aggregate(txns, inc, |t| {
        account.map_or(true, |name| t.account == name)
    })
}

pub fn aggregate_by_category(
    txns: &[Transaction],
    inc: Increment,
    category: &str,
) -> Vec<AggregationPoint> {
    aggregate(txns, inc, |t| t.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;

    fn txn(date: &str, txn_type: TransactionType, account: &str, amount: f64) -> Transaction {
        Transaction {
            date: date.parse().unwrap(),
            txn_type,
            account_type: AccountType::BankAccount,
            account: account.to_string(),
            category: "General".to_string(),
            amount,
            description: "test".to_string(),
        }
    }

    #[test]
    fn test_weekly_bucket_sums() {
        // Mon 2024-02-26 through Sun 2024-03-03 share one ISO week.
        let txns = vec![
            txn("2024-02-27", TransactionType::Income, "Checking", 100.0),
            txn("2024-03-01", TransactionType::Income, "Checking", 50.0),
            txn("2024-03-02", TransactionType::Expense, "Checking", 30.0),
        ];
        let points = aggregate(&txns, Increment::Weekly, |_| true);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, "2024-02-26".parse().unwrap());
        assert_eq!(points[0].income, 150.0);
        assert_eq!(points[0].expense, 30.0);
    }

    #[test]
    fn test_empty_buckets_not_materialized() {
        let txns = vec![
            txn("2024-01-05", TransactionType::Expense, "Checking", 10.0),
            txn("2024-04-05", TransactionType::Expense, "Checking", 20.0),
        ];
        let points = aggregate(&txns, Increment::Monthly, |_| true);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "2024-01-01".parse().unwrap());
        assert_eq!(points[1].date, "2024-04-01".parse().unwrap());
    }

    #[test]
    fn test_sorted_ascending() {
        let txns = vec![
            txn("2024-06-10", TransactionType::Expense, "Checking", 5.0),
            txn("2024-01-10", TransactionType::Expense, "Checking", 5.0),
            txn("2024-03-10", TransactionType::Expense, "Checking", 5.0),
        ];
        let points = aggregate(&txns, Increment::Monthly, |_| true);
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_all_time_is_a_single_bucket() {
        // Multi-year data still collapses into one bucket, keyed by the
        // earliest matching date.
        let txns = vec![
            txn("2023-06-10", TransactionType::Income, "Checking", 100.0),
            txn("2024-02-01", TransactionType::Expense, "Checking", 40.0),
            txn("2023-01-15", TransactionType::Expense, "Checking", 10.0),
        ];
        let points = aggregate(&txns, Increment::AllTime, |_| true);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, "2023-01-15".parse().unwrap());
        assert_eq!(points[0].income, 100.0);
        assert_eq!(points[0].expense, 50.0);
    }

    #[test]
    fn test_all_time_with_no_matches_is_empty() {
        let txns = vec![txn("2024-01-05", TransactionType::Expense, "Checking", 10.0)];
        let points = aggregate(&txns, Increment::AllTime, |_| false);
        assert!(points.is_empty());
    }

    #[test]
    fn test_aggregate_by_account_filters() {
        let txns = vec![
            txn("2024-01-05", TransactionType::Expense, "Checking", 10.0),
            txn("2024-01-06", TransactionType::Expense, "Savings", 20.0),
        ];
        let points = aggregate_by_account(&txns, Increment::Monthly, Some("Savings"));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].expense, 20.0);

        let all = aggregate_by_account(&txns, Increment::Monthly, None);
        assert_eq!(all[0].expense, 30.0);
    }

    #[test]
    fn test_aggregate_by_category_filters() {
        let mut a = txn("2024-01-05", TransactionType::Expense, "Checking", 10.0);
        a.category = "Dining".to_string();
        let b = txn("2024-01-06", TransactionType::Expense, "Checking", 20.0);
        let points = aggregate_by_category(&[a, b], Increment::Monthly, "Dining");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].expense, 10.0);
    }
}

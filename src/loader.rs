use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Result, TallyError};
use crate::importer::{self, CsvConfig};
use crate::journal;
use crate::models::Transaction;

/// Where transactions come from, built once from the command line and
/// passed into the loaders. No process-wide state.
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    /// Glob patterns from repeated --csv flags.
    pub csv_patterns: Vec<String>,
    /// Journal path from --ledger; LEDGER_FILE/HLEDGER_FILE are consulted
    /// when absent.
    pub ledger_file: Option<String>,
    /// Optional JSON file overriding the default CSV mapping.
    pub csv_config_path: Option<String>,
}

/// Pick a data source and load it. CSV wins when any --csv pattern was
/// given; otherwise the ledger journal if a path resolves. The returned
/// list is always sorted ascending by date; consumers binary-search over
/// that ordering.
pub fn load_transactions(source: &SourceConfig) -> Result<Vec<Transaction>> {
    if !source.csv_patterns.is_empty() {
        let config = CsvConfig::load(source.csv_config_path.as_deref().map(Path::new))?;
        return importer::load_from_csv(&source.csv_patterns, &config);
    }
    if let Some(path) = journal::resolve_ledger_file(source.ledger_file.as_deref()) {
        return journal::load_from_ledger(&path);
    }
    Err(TallyError::NoDataSource)
}

/// Sub-slice of a date-sorted list covering `[start, end)`.
pub fn slice_date_range(txns: &[Transaction], start: NaiveDate, end: NaiveDate) -> &[Transaction] {
    let lo = txns.partition_point(|t| t.date < start);
    let hi = txns.partition_point(|t| t.date < end);
    &txns[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountType, TransactionType};
    use std::io::Write;

    fn txn(date: &str) -> Transaction {
        Transaction {
            date: date.parse().unwrap(),
            txn_type: TransactionType::Expense,
            account_type: AccountType::BankAccount,
            account: "Checking".to_string(),
            category: "Dining".to_string(),
            amount: 1.0,
            description: "test".to_string(),
        }
    }

    #[test]
    fn test_slice_date_range() {
        let txns = vec![
            txn("2024-01-05"),
            txn("2024-02-10"),
            txn("2024-02-20"),
            txn("2024-03-01"),
        ];
        let feb = slice_date_range(
            &txns,
            "2024-02-01".parse().unwrap(),
            "2024-03-01".parse().unwrap(),
        );
        assert_eq!(feb.len(), 2);
        assert_eq!(feb[0].date, "2024-02-10".parse().unwrap());
    }

    #[test]
    fn test_slice_date_range_empty_window() {
        let txns = vec![txn("2024-01-05")];
        let none = slice_date_range(
            &txns,
            "2024-06-01".parse().unwrap(),
            "2024-07-01".parse().unwrap(),
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_csv_source_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txns.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(
            b"Date,Account,Category,Description,Amount,Type\n2024-03-01,Checking,Dining,Coffee,4.50,Expense\n",
        )
        .unwrap();
        let source = SourceConfig {
            csv_patterns: vec![path.display().to_string()],
            // The ledger flag is ignored when CSV patterns are present.
            ledger_file: Some("/nonexistent.journal".to_string()),
            csv_config_path: None,
        };
        let txns = load_transactions(&source).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "Coffee");
    }
}

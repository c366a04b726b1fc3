use std::collections::HashMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, TallyError};
use crate::models::{
    AccountType, Transaction, TransactionDraft, TransactionField, TransactionType,
};

// ---------------------------------------------------------------------------
// Mapping configuration
// ---------------------------------------------------------------------------

/// How CSV columns map onto transaction fields. Loaded once at startup from
/// an optional JSON file; map entries in the file are merged over the
/// built-in defaults, list fields replace them wholesale. Value-mapping
/// keys (`transaction_types`, `account_types`) are matched
/// case-insensitively and must be written in lowercase.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column header text to transaction field.
    pub columns: HashMap<String, TransactionField>,
    /// Explicit column index to transaction field. When non-empty this wins
    /// over header-based resolution.
    pub column_indexes: HashMap<TransactionField, usize>,
    /// chrono format strings tried in order when parsing dates.
    pub date_formats: Vec<String>,
    /// Raw CSV value to transaction type.
    pub transaction_types: HashMap<String, TransactionType>,
    /// Raw CSV value to account type.
    pub account_types: HashMap<String, AccountType>,
    /// Ordered fallback patterns matched against the lower-cased account
    /// name when the CSV has no account-type column. First match wins.
    pub account_type_from_name: Vec<NamePattern>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamePattern {
    pub pattern: String,
    pub account_type: AccountType,
}

impl Default for CsvConfig {
    fn default() -> Self {
        let columns = TransactionField::ALL
            .iter()
            .map(|f| (f.name().to_string(), *f))
            .collect();
        CsvConfig {
            columns,
            column_indexes: HashMap::new(),
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%m/%d/%Y".to_string(),
                "%m/%d/%Y %H:%M:%S".to_string(),
            ],
            transaction_types: [
                ("income", TransactionType::Income),
                ("inc.", TransactionType::Income),
                ("expense", TransactionType::Expense),
                ("exp.", TransactionType::Expense),
                ("exps.", TransactionType::Expense),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
            account_types: [
                ("cash", AccountType::Cash),
                ("bank account", AccountType::BankAccount),
                ("bankaccount", AccountType::BankAccount),
                ("bank", AccountType::BankAccount),
                ("checking account", AccountType::BankAccount),
                ("checking", AccountType::BankAccount),
                ("saving account", AccountType::BankAccount),
                ("saving", AccountType::BankAccount),
                ("credit card", AccountType::CreditCard),
                ("creditcard", AccountType::CreditCard),
                ("credit", AccountType::CreditCard),
                ("cc", AccountType::CreditCard),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
            account_type_from_name: vec![
                NamePattern {
                    pattern: "^cash$".to_string(),
                    account_type: AccountType::Cash,
                },
                NamePattern {
                    pattern: "checking$".to_string(),
                    account_type: AccountType::BankAccount,
                },
                NamePattern {
                    pattern: "saving$".to_string(),
                    account_type: AccountType::BankAccount,
                },
            ],
        }
    }
}

/// What the JSON file may set. Kept separate from [`CsvConfig`] so a file
/// that names only one field leaves the rest at their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvConfigFile {
    columns: HashMap<String, TransactionField>,
    column_indexes: HashMap<TransactionField, usize>,
    date_formats: Vec<String>,
    transaction_types: HashMap<String, TransactionType>,
    account_types: HashMap<String, AccountType>,
    account_type_from_name: Vec<NamePattern>,
}

impl CsvConfig {
    /// Built-in defaults, or the JSON file at `path` layered over them:
    /// map entries are added to the default maps, list fields replace the
    /// default lists when non-empty.
    pub fn load(path: Option<&Path>) -> Result<CsvConfig> {
        let mut config = CsvConfig::default();
        let Some(p) = path else {
            return Ok(config);
        };
        let content = std::fs::read_to_string(p)?;
        let file: CsvConfigFile = serde_json::from_str(&content)?;
        config.columns.extend(file.columns);
        config.column_indexes.extend(file.column_indexes);
        config.transaction_types.extend(file.transaction_types);
        config.account_types.extend(file.account_types);
        if !file.date_formats.is_empty() {
            config.date_formats = file.date_formats;
        }
        if !file.account_type_from_name.is_empty() {
            config.account_type_from_name = file.account_type_from_name;
        }
        Ok(config)
    }

    fn compile_fallbacks(&self) -> Result<Vec<(Regex, AccountType)>> {
        self.account_type_from_name
            .iter()
            .map(|np| {
                Regex::new(&np.pattern)
                    .map(|re| (re, np.account_type))
                    .map_err(|e| TallyError::BadFallbackPattern {
                        pattern: np.pattern.clone(),
                        source: e,
                    })
            })
            .collect()
    }

    /// Locate a column index for each transaction field by scanning the
    /// header row, unless explicit indexes were configured. Every field
    /// except AccountType must resolve; AccountType may instead be inferred
    /// from the account name per row.
    fn resolve_columns(&mut self, header: &StringRecord, file: &str) -> Result<()> {
        if !self.column_indexes.is_empty() {
            return Ok(());
        }
        for (index, col) in header.iter().enumerate() {
            if let Some(&field) = self.columns.get(col.trim()) {
                self.column_indexes.insert(field, index);
            }
        }
        for field in TransactionField::ALL {
            if field != TransactionField::AccountType && !self.column_indexes.contains_key(&field) {
                return Err(TallyError::CsvColumnMissing {
                    file: file.to_string(),
                    field: field.name(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    for format in formats {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Some(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    None
}

fn infer_account_type(account: &str, fallbacks: &[(Regex, AccountType)]) -> AccountType {
    let lowered = account.to_lowercase();
    for (re, account_type) in fallbacks {
        if re.is_match(&lowered) {
            return *account_type;
        }
    }
    tracing::warn!(account, "no account-type pattern matched, defaulting to credit card");
    AccountType::CreditCard
}

/// Convert one data row. Field extraction and coercion is an explicit match
/// over `TransactionField`, so adding a field breaks the build here instead
/// of failing at runtime.
fn parse_row(
    record: &StringRecord,
    row: usize,
    config: &CsvConfig,
    fallbacks: &[(Regex, AccountType)],
) -> Result<Transaction> {
    let mut draft = TransactionDraft::default();

    for field in TransactionField::ALL {
        let index = match config.column_indexes.get(&field) {
            Some(&i) => i,
            // AccountType may be inferred from the account name below.
            None if field == TransactionField::AccountType => continue,
            None => {
                return Err(TallyError::CsvColumnMissing {
                    file: String::new(),
                    field: field.name(),
                })
            }
        };
        let value = record.get(index).ok_or(TallyError::CsvRowShort {
            row,
            field: field.name(),
        })?;

        match field {
            TransactionField::Date => {
                draft.date = Some(parse_date(value, &config.date_formats).ok_or_else(|| {
                    TallyError::CsvDate {
                        row,
                        value: value.to_string(),
                    }
                })?);
            }
            TransactionField::Type => {
                draft.txn_type = Some(
                    *config
                        .transaction_types
                        .get(&value.to_lowercase())
                        .ok_or_else(|| TallyError::CsvValue {
                            row,
                            field: field.name(),
                            value: value.to_string(),
                        })?,
                );
            }
            TransactionField::AccountType => {
                draft.account_type = Some(
                    *config
                        .account_types
                        .get(&value.to_lowercase())
                        .ok_or_else(|| TallyError::CsvValue {
                            row,
                            field: field.name(),
                            value: value.to_string(),
                        })?,
                );
            }
            TransactionField::Account => draft.account = value.to_string(),
            TransactionField::Category => draft.category = value.to_string(),
            TransactionField::Amount => {
                draft.amount = value.parse::<f64>().map_err(|_| TallyError::CsvValue {
                    row,
                    field: field.name(),
                    value: value.to_string(),
                })?;
            }
            TransactionField::Description => draft.description = value.to_string(),
        }
    }

    if draft.account_type.is_none() {
        draft.account_type = Some(infer_account_type(&draft.account, fallbacks));
    }

    draft
        .build()
        .map_err(|reason| TallyError::CsvInvalidRow { row, reason })
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

/// Parse a single CSV file (first row = header) against a private snapshot
/// of the mapping configuration.
pub fn read_csv_file(path: &Path, config: &CsvConfig) -> Result<Vec<Transaction>> {
    let fallbacks = config.compile_fallbacks()?;
    // Per-file snapshot: column resolution mutates the index map and must
    // not leak between concurrently-parsed files.
    let mut config = config.clone();

    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let mut records = rdr.records();

    let file_name = path.display().to_string();
    let header = match records.next() {
        Some(result) => result?,
        None => return Err(TallyError::Other(format!("{file_name}: empty CSV file"))),
    };
    config.resolve_columns(&header, &file_name)?;

    let mut txns = Vec::new();
    for (i, result) in records.enumerate() {
        let record = result?;
        // Row numbers are 1-based and count the header row.
        txns.push(parse_row(&record, i + 2, &config, &fallbacks)?);
    }
    Ok(txns)
}

/// Resolve glob patterns and parse every matching file, one worker thread
/// per file. The first failure aborts the whole load; a caller never sees
/// a partial result set. Output is sorted ascending by date.
pub fn load_from_csv(patterns: &[String], config: &CsvConfig) -> Result<Vec<Transaction>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let matches = glob::glob(pattern).map_err(|e| TallyError::GlobPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        for entry in matches {
            paths.push(entry?);
        }
    }
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let mut all = Vec::new();
    thread::scope(|scope| -> Result<()> {
        let (tx, rx) = mpsc::channel();
        for path in &paths {
            let tx = tx.clone();
            let config = config.clone();
            scope.spawn(move || {
                // A send only fails when the collector already bailed on an
                // earlier error, and then the result is discarded anyway.
                let _ = tx.send(read_csv_file(path, &config));
            });
        }
        drop(tx);
        for result in rx {
            all.extend(result?);
        }
        Ok(())
    })?;

    all.sort_by_key(|t| t.date);
    Ok(all)
}

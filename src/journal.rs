use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TallyError};
use crate::models::{AccountType, Transaction, TransactionDraft, TransactionType};

// The four reserved posting tokens. income/expenses legs carry the
// category; assets/liability legs carry the account.
const TOKEN_INCOME: &str = "income";
const TOKEN_EXPENSES: &str = "expenses";
const TOKEN_ASSETS: &str = "assets";
const TOKEN_LIABILITY: &str = "liability";

// Header: YYYY-MM-DD  <description>
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+(.*)$").unwrap());
// Posting: indented "<type>:<name>" then at least two spaces and a dollar
// amount, e.g. "  expenses:Utilities   $49.99" or "  assets:BoA Checking   $-47.11".
static POSTING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+(.+):(.+)\s{2,}\$(-?[\d,]+\.?\d*)$").unwrap());

/// Parse a two-posting ledger journal stream into transactions, in input
/// order. A transaction is emitted when the second posting of the current
/// header is seen. Unrecognized lines are tolerated; malformed dates and
/// amounts, extra postings, and incomplete transactions abort the parse.
pub fn parse_journal<R: BufRead>(reader: R) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();
    let mut draft = TransactionDraft::default();
    let mut postings = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(caps) = HEADER_RE.captures(&line) {
            let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").map_err(|_| {
                TallyError::JournalDate {
                    line: line_no,
                    value: caps[1].to_string(),
                }
            })?;
            draft = TransactionDraft {
                date: Some(date),
                description: caps[2].trim().to_string(),
                ..Default::default()
            };
            postings = 0;
        } else if let Some(caps) = POSTING_RE.captures(&line) {
            if draft.date.is_none() {
                return Err(TallyError::JournalOrphanPosting { line: line_no });
            }
            postings += 1;
            if postings > 2 {
                return Err(TallyError::JournalExtraPosting { line: line_no });
            }

            let token = caps[1].trim();
            let name = caps[2].trim();
            let raw_amount = caps[3].replace(',', "");
            let amount: f64 = raw_amount.parse().map_err(|_| TallyError::JournalAmount {
                line: line_no,
                value: caps[3].to_string(),
            })?;
            // Direction comes from the reserved token, never from the sign.
            draft.amount = amount.abs();

            match token {
                TOKEN_EXPENSES => {
                    draft.txn_type = Some(TransactionType::Expense);
                    draft.category = name.to_string();
                }
                TOKEN_INCOME => {
                    draft.txn_type = Some(TransactionType::Income);
                    draft.category = name.to_string();
                }
                // The journal grammar has no explicit account-type column;
                // the reserved token itself tells us what kind of account
                // the leg belongs to.
                TOKEN_ASSETS => {
                    draft.account = name.to_string();
                    draft.account_type = Some(AccountType::BankAccount);
                }
                TOKEN_LIABILITY => {
                    draft.account = name.to_string();
                    draft.account_type = Some(AccountType::CreditCard);
                }
                _ => {}
            }

            if postings == 2 {
                let txn = draft
                    .clone()
                    .build()
                    .map_err(|reason| TallyError::JournalIncomplete {
                        line: line_no,
                        reason,
                    })?;
                transactions.push(txn);
            }
        } else {
            tracing::debug!(line = line_no, "skipping unrecognized journal line: {line}");
        }
    }

    Ok(transactions)
}

// ---------------------------------------------------------------------------
// External ledger tool
// ---------------------------------------------------------------------------

const LEDGER_TOOLS: [&str; 2] = ["ledger", "hledger"];

/// Journal path resolution: `--ledger` flag first, then LEDGER_FILE, then
/// HLEDGER_FILE.
pub fn resolve_ledger_file(flag: Option<&str>) -> Option<String> {
    if let Some(path) = flag {
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }
    std::env::var("LEDGER_FILE")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var("HLEDGER_FILE").ok().filter(|v| !v.is_empty()))
}

/// Run the first available ledger tool's `print` subcommand against `path`
/// and stream its stdout into the parser. A missing tool moves on to the
/// next candidate; a tool that starts but exits non-zero is fatal.
pub fn load_from_ledger(path: &str) -> Result<Vec<Transaction>> {
    for tool in LEDGER_TOOLS {
        let mut child = match Command::new(tool)
            .args(["-f", path, "print"])
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TallyError::Other(format!("failed to capture {tool} stdout")))?;
        // Parse while the tool is still writing; no full-output buffering.
        let parsed = parse_journal(BufReader::new(stdout));
        let status = child.wait()?;
        if !status.success() {
            return Err(TallyError::LedgerToolFailed {
                tool: tool.to_string(),
                status: status.to_string(),
            });
        }

        let mut txns = parsed?;
        txns.sort_by_key(|t| t.date);
        return Ok(txns);
    }
    Err(TallyError::LedgerToolNotFound(LEDGER_TOOLS.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;

    fn parse(text: &str) -> Result<Vec<Transaction>> {
        parse_journal(text.as_bytes())
    }

    #[test]
    fn test_parse_expense_transaction() {
        let txns = parse(
            "2024-03-01 Coffee\n  expenses:Dining   $4.50\n  assets:Checking   $-4.50\n",
        )
        .unwrap();
        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.date, "2024-03-01".parse().unwrap());
        assert_eq!(t.txn_type, TransactionType::Expense);
        assert_eq!(t.category, "Dining");
        assert_eq!(t.account, "Checking");
        assert_eq!(t.amount, 4.50);
        assert_eq!(t.description, "Coffee");
    }

    #[test]
    fn test_parse_income_with_negative_posting() {
        // Sign on a posting is discarded; the income token decides direction.
        let txns = parse(
            "2024-04-05 Salary\n  assets:BoA Checking   $3,200.00\n  income:Salary   $-3,200.00\n",
        )
        .unwrap();
        assert_eq!(txns[0].txn_type, TransactionType::Income);
        assert_eq!(txns[0].account, "BoA Checking");
        assert_eq!(txns[0].amount, 3200.0);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let txns = parse(
            "; journal comment\n# another\n\n2024-03-01 Coffee\n  expenses:Dining   $4.50\n  assets:Checking   $-4.50\n",
        )
        .unwrap();
        assert_eq!(txns.len(), 1);
    }

    #[test]
    fn test_unrecognized_lines_tolerated() {
        let txns = parse(
            "account assets:Checking\n2024-03-01 Coffee\n  expenses:Dining   $4.50\n  assets:Checking   $-4.50\nP 2024-03-01 USD 1.00\n",
        )
        .unwrap();
        assert_eq!(txns.len(), 1);
    }

    #[test]
    fn test_multiple_transactions() {
        let txns = parse(
            "2024-03-01 Coffee\n  expenses:Dining   $4.50\n  assets:Checking   $-4.50\n\n2024-03-02 Groceries\n  expenses:Food   $52.10\n  liability:Visa   $-52.10\n",
        )
        .unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[1].account, "Visa");
        assert_eq!(txns[1].account_type, AccountType::CreditCard);
    }

    #[test]
    fn test_bad_header_date_is_fatal() {
        let err = parse("2024-13-01 Impossible\n  expenses:Dining   $4.50\n").unwrap_err();
        assert!(matches!(err, TallyError::JournalDate { line: 1, .. }));
    }

    #[test]
    fn test_bad_amount_is_fatal() {
        // All commas passes the line grammar but strips down to nothing.
        let err = parse("2024-03-01 Coffee\n  expenses:Dining   $,,,\n").unwrap_err();
        assert!(matches!(err, TallyError::JournalAmount { .. }));
    }

    #[test]
    fn test_malformed_posting_line_is_skipped_not_fatal() {
        // A second decimal point breaks the amount grammar entirely, so the
        // line is tolerated as unrecognized and the transaction never
        // completes.
        let txns = parse(
            "2024-03-01 Coffee\n  expenses:Dining   $4.5.0\n  assets:Checking   $-4.50\n",
        )
        .unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn test_third_posting_is_fatal() {
        let err = parse(
            "2024-03-01 Split\n  expenses:Dining   $4.50\n  assets:Checking   $-5.50\n  expenses:Tips   $1.00\n",
        )
        .unwrap_err();
        assert!(matches!(err, TallyError::JournalExtraPosting { line: 4 }));
    }

    #[test]
    fn test_posting_before_header_is_fatal() {
        let err = parse("  expenses:Dining   $4.50\n").unwrap_err();
        assert!(matches!(err, TallyError::JournalOrphanPosting { line: 1 }));
    }

    #[test]
    fn test_same_class_postings_are_fatal() {
        // Two category-bearing legs leave the account unset.
        let err = parse(
            "2024-03-01 Odd\n  expenses:Dining   $4.50\n  income:Refund   $4.50\n",
        )
        .unwrap_err();
        assert!(matches!(err, TallyError::JournalIncomplete { .. }));
    }

    #[test]
    fn test_comma_amounts() {
        let txns = parse(
            "2024-03-01 Rent\n  expenses:Housing   $1,850.00\n  assets:Checking   $-1,850.00\n",
        )
        .unwrap();
        assert_eq!(txns[0].amount, 1850.0);
    }

    #[test]
    fn test_assets_token_maps_to_bank_account() {
        let txns = parse(
            "2024-03-01 Coffee\n  expenses:Dining   $4.50\n  assets:Checking   $-4.50\n",
        )
        .unwrap();
        assert_eq!(txns[0].account_type, AccountType::BankAccount);
    }

    #[test]
    fn test_resolve_ledger_file_prefers_flag() {
        assert_eq!(
            resolve_ledger_file(Some("/tmp/a.journal")).as_deref(),
            Some("/tmp/a.journal")
        );
    }
}

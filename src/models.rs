use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Cash,
    #[serde(rename = "Bank Account")]
    BankAccount,
    #[serde(rename = "Credit Card")]
    CreditCard,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "Cash"),
            Self::BankAccount => write!(f, "Bank Account"),
            Self::CreditCard => write!(f, "Credit Card"),
        }
    }
}

/// One normalized transaction, immutable once built. `amount` is always the
/// absolute value; direction is carried by `txn_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub txn_type: TransactionType,
    pub account_type: AccountType,
    pub account: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
}

// ---------------------------------------------------------------------------
// TransactionField — the CSV-mapping vocabulary
// ---------------------------------------------------------------------------

/// Closed mirror of `Transaction`'s attributes. Adding a field to
/// `Transaction` requires adding it here too; the exhaustive matches in the
/// importer then fail to compile until they handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionField {
    Date,
    Type,
    AccountType,
    Account,
    Category,
    Amount,
    Description,
}

impl TransactionField {
    pub const ALL: [TransactionField; 7] = [
        Self::Date,
        Self::Type,
        Self::AccountType,
        Self::Account,
        Self::Category,
        Self::Amount,
        Self::Description,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Type => "Type",
            Self::AccountType => "AccountType",
            Self::Account => "Account",
            Self::Category => "Category",
            Self::Amount => "Amount",
            Self::Description => "Description",
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionDraft — the only way to construct a Transaction
// ---------------------------------------------------------------------------

/// Field-by-field accumulator used by the parsers. `build` enforces the
/// validity invariant so a partially-populated transaction can never reach
/// a consumer.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub date: Option<NaiveDate>,
    pub txn_type: Option<TransactionType>,
    pub account_type: Option<AccountType>,
    pub account: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
}

impl TransactionDraft {
    pub fn build(self) -> std::result::Result<Transaction, String> {
        let date = self.date.ok_or("missing date")?;
        let txn_type = self.txn_type.ok_or("missing transaction type")?;
        let account_type = self.account_type.ok_or("missing account type")?;
        if self.account.is_empty() {
            return Err("empty account".to_string());
        }
        if self.category.is_empty() {
            return Err("empty category".to_string());
        }
        if self.description.is_empty() {
            return Err("empty description".to_string());
        }
        if self.amount <= 0.0 {
            return Err(format!("non-positive amount {}", self.amount));
        }
        Ok(Transaction {
            date,
            txn_type,
            account_type,
            account: self.account,
            category: self.category,
            amount: self.amount,
            description: self.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> TransactionDraft {
        TransactionDraft {
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            txn_type: Some(TransactionType::Expense),
            account_type: Some(AccountType::BankAccount),
            account: "Checking".to_string(),
            category: "Dining".to_string(),
            amount: 4.50,
            description: "Coffee".to_string(),
        }
    }

    #[test]
    fn test_build_complete_draft() {
        let txn = complete_draft().build().unwrap();
        assert_eq!(txn.account, "Checking");
        assert_eq!(txn.amount, 4.50);
        assert_eq!(txn.txn_type, TransactionType::Expense);
    }

    #[test]
    fn test_build_rejects_missing_fields() {
        let mut draft = complete_draft();
        draft.date = None;
        assert!(draft.build().is_err());

        let mut draft = complete_draft();
        draft.account_type = None;
        assert!(draft.build().is_err());

        let mut draft = complete_draft();
        draft.category = String::new();
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_build_rejects_non_positive_amount() {
        let mut draft = complete_draft();
        draft.amount = 0.0;
        assert!(draft.build().is_err());

        let mut draft = complete_draft();
        draft.amount = -5.0;
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_account_type_serde_names() {
        let a: AccountType = serde_json::from_str("\"Bank Account\"").unwrap();
        assert_eq!(a, AccountType::BankAccount);
        assert!(serde_json::from_str::<AccountType>("\"Wallet\"").is_err());
    }

    #[test]
    fn test_transaction_field_covers_all() {
        assert_eq!(TransactionField::ALL.len(), 7);
        assert_eq!(TransactionField::Amount.name(), "Amount");
    }
}

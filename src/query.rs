use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Transaction;

const PREFIX_DATE: &str = "d:";
const PREFIX_TYPE: &str = "t:";
const PREFIX_ACCOUNT: &str = "a:";
const PREFIX_CATEGORY: &str = "c:";
const PREFIX_AMOUNT: &str = "m:";
const PREFIX_DESCRIPTION: &str = "p:";
const NEGATION: &str = "-";

// Comparison keywords: an operator followed by a date at year, year-month or
// year-month-day granularity, or by a plain decimal number. Anything that
// does not match degrades to substring matching.
static DATE_CMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([<>])(\d{4}(?:-\d{2}(?:-\d{2})?)?)$").unwrap());
static AMOUNT_CMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([<>])([0-9]*\.?[0-9]+)$").unwrap());

/// A parsed search query: sub-queries separated by ` OR `, each a
/// conjunction of lower-cased keywords. Parsing never fails.
#[derive(Debug, Clone, Default)]
pub struct Query {
    sub_queries: Vec<Vec<String>>,
}

impl Query {
    pub fn parse(raw: &str) -> Query {
        let raw = raw.trim();
        if raw.is_empty() {
            return Query::default();
        }
        // The separator is matched before lower-casing, so only an
        // uppercase, space-bounded OR splits sub-queries.
        let sub_queries = raw
            .split(" OR ")
            .map(|q| q.to_lowercase().split_whitespace().map(String::from).collect())
            .collect();
        Query { sub_queries }
    }

    pub fn is_empty(&self) -> bool {
        self.sub_queries.is_empty()
    }

    /// A transaction matches when any sub-query with at least one keyword
    /// matches on every keyword. An empty query matches everything.
    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.sub_queries.is_empty() {
            return true;
        }
        self.sub_queries
            .iter()
            .any(|kws| !kws.is_empty() && kws.iter().all(|kw| matches_keyword(txn, kw)))
    }
}

fn matches_keyword(txn: &Transaction, kw: &str) -> bool {
    match kw.strip_prefix(NEGATION) {
        Some(inner) => !matches_positive(txn, inner),
        None => matches_positive(txn, kw),
    }
}

fn matches_positive(txn: &Transaction, kw: &str) -> bool {
    if let Some(rest) = kw.strip_prefix(PREFIX_DATE) {
        return matches_date(txn, rest);
    }
    if let Some(rest) = kw.strip_prefix(PREFIX_TYPE) {
        return matches_type(txn, rest);
    }
    if let Some(rest) = kw.strip_prefix(PREFIX_ACCOUNT) {
        return matches_account(txn, rest);
    }
    if let Some(rest) = kw.strip_prefix(PREFIX_CATEGORY) {
        return matches_category(txn, rest);
    }
    if let Some(rest) = kw.strip_prefix(PREFIX_AMOUNT) {
        return matches_amount(txn, rest);
    }
    if let Some(rest) = kw.strip_prefix(PREFIX_DESCRIPTION) {
        return matches_description(txn, rest);
    }
    // Unprefixed keywords match on any field.
    matches_date(txn, kw)
        || matches_type(txn, kw)
        || matches_account(txn, kw)
        || matches_category(txn, kw)
        || matches_amount(txn, kw)
        || matches_description(txn, kw)
}

fn matches_date(txn: &Transaction, kw: &str) -> bool {
    if let Some(caps) = DATE_CMP_RE.captures(kw) {
        if let Some(target) = parse_partial_date(&caps[2]) {
            return match &caps[1] {
                ">" => txn.date > target,
                _ => txn.date < target,
            };
        }
    }
    !kw.is_empty() && txn.date.format("%Y-%m-%d").to_string().contains(kw)
}

// Pad a year or year-month value down to the first day of its period.
fn parse_partial_date(s: &str) -> Option<NaiveDate> {
    let padded = match s.len() {
        4 => format!("{s}-01-01"),
        7 => format!("{s}-01"),
        _ => s.to_string(),
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d").ok()
}

fn matches_type(txn: &Transaction, kw: &str) -> bool {
    txn.txn_type.to_string().to_lowercase().contains(kw)
}

fn matches_account(txn: &Transaction, kw: &str) -> bool {
    txn.account.to_lowercase().contains(kw)
}

fn matches_category(txn: &Transaction, kw: &str) -> bool {
    txn.category.to_lowercase().contains(kw)
}

fn matches_amount(txn: &Transaction, kw: &str) -> bool {
    if let Some(caps) = AMOUNT_CMP_RE.captures(kw) {
        if let Ok(target) = caps[2].parse::<f64>() {
            return match &caps[1] {
                ">" => txn.amount > target,
                _ => txn.amount < target,
            };
        }
    }
    !kw.is_empty() && format!("{:.2}", txn.amount).contains(kw)
}

fn matches_description(txn: &Transaction, kw: &str) -> bool {
    txn.description.to_lowercase().contains(kw)
}

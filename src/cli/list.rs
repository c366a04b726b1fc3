use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::SourceArgs;
use crate::date::{DateWindow, Increment};
use crate::error::{Result, TallyError};
use crate::fmt::{money, signed_money};
use crate::loader::{self, slice_date_range};
use crate::models::{Transaction, TransactionType};
use crate::query::Query;
use crate::savedsearch;

pub fn run(
    source: &SourceArgs,
    query: Option<&str>,
    search: Option<&str>,
    range: Option<&str>,
) -> Result<String> {
    let query_str = resolve_query(query, search)?;
    let txns = loader::load_transactions(&source.to_source())?;
    if txns.is_empty() {
        return Ok("No transactions found.".to_string());
    }

    let (slice, heading) = match range {
        Some(range) => {
            let inc: Increment = range.parse().map_err(TallyError::Other)?;
            let min = txns.first().map(|t| t.date).unwrap_or_default();
            let max = txns.last().map(|t| t.date).unwrap_or_default();
            let window = DateWindow::new(inc, min, max, Local::now().date_naive());
            (
                slice_date_range(&txns, window.start(), window.end()),
                Some(window.label()),
            )
        }
        None => (&txns[..], None),
    };

    let q = Query::parse(&query_str);
    let matched: Vec<&Transaction> = slice.iter().filter(|t| q.matches(t)).collect();
    Ok(format_list(&matched, heading.as_deref()))
}

fn resolve_query(query: Option<&str>, search: Option<&str>) -> Result<String> {
    if let Some(q) = query {
        return Ok(q.to_string());
    }
    if let Some(name) = search {
        return savedsearch::load_searches()
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.query)
            .ok_or_else(|| TallyError::Other(format!("no saved search named '{name}'")));
    }
    Ok(String::new())
}

pub fn format_list(txns: &[&Transaction], heading: Option<&str>) -> String {
    if txns.is_empty() {
        return match heading {
            Some(h) => format!("{h}\nNo matching transactions."),
            None => "No matching transactions.".to_string(),
        };
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Date",
        "Type",
        "Account",
        "Category",
        "Description",
        "Amount",
    ]);

    let mut income = 0.0;
    let mut expense = 0.0;
    for t in txns {
        match t.txn_type {
            TransactionType::Income => income += t.amount,
            TransactionType::Expense => expense += t.amount,
        }
        let type_cell = match t.txn_type {
            TransactionType::Income => Cell::new(t.txn_type.to_string().green()),
            TransactionType::Expense => Cell::new(t.txn_type.to_string().red()),
        };
        table.add_row(vec![
            Cell::new(t.date.format("%Y-%m-%d")),
            type_cell,
            Cell::new(&t.account),
            Cell::new(&t.category),
            Cell::new(&t.description),
            Cell::new(signed_money(t.amount, t.txn_type)),
        ]);
    }

    let count = txns.len();
    let summary = format!(
        "{count} transactions | income {} | expenses {} | net {}",
        money(income),
        money(expense),
        money(income - expense)
    );
    match heading {
        Some(h) => format!("{h}\n{table}\n{summary}"),
        None => format!("{table}\n{summary}"),
    }
}

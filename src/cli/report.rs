use comfy_table::{Cell, Table};

use crate::aggregate::{self, AggregationPoint};
use crate::cli::SourceArgs;
use crate::date::Increment;
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::loader;
use crate::models::Transaction;
use crate::query::Query;

pub fn run(
    source: &SourceArgs,
    increment: &str,
    account: Option<&str>,
    category: Option<&str>,
    query: Option<&str>,
) -> Result<String> {
    let inc: Increment = increment.parse().map_err(TallyError::Other)?;
    let txns = loader::load_transactions(&source.to_source())?;
    if txns.is_empty() {
        return Ok("No transactions found.".to_string());
    }

    let q = Query::parse(query.unwrap_or(""));
    let filtered: Vec<Transaction> = txns.into_iter().filter(|t| q.matches(t)).collect();

    let points = if let Some(category) = category {
        aggregate::aggregate_by_category(&filtered, inc, category)
    } else {
        aggregate::aggregate_by_account(&filtered, inc, account)
    };
    Ok(format_report(&points, inc))
}

pub fn format_report(points: &[AggregationPoint], inc: Increment) -> String {
    if points.is_empty() {
        return "No matching transactions.".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec!["Period", "Income", "Expenses", "Net"]);

    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    for p in points {
        total_income += p.income;
        total_expense += p.expense;
        table.add_row(vec![
            Cell::new(inc.format_long(p.date)),
            Cell::new(money(p.income)),
            Cell::new(money(p.expense)),
            Cell::new(money(p.income - p.expense)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(money(total_income)),
        Cell::new(money(total_expense)),
        Cell::new(money(total_income - total_expense)),
    ]);
    table.to_string()
}

use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::savedsearch::{self, SavedSearch};

pub fn add(name: &str, query: &str) -> Result<String> {
    savedsearch::add_or_update_search(name, query);
    Ok(format!("Saved search '{name}'."))
}

pub fn list() -> Result<String> {
    Ok(format_searches(&savedsearch::load_searches()))
}

pub fn delete(name: &str) -> Result<String> {
    if savedsearch::delete_search(name) {
        Ok(format!("Deleted search '{name}'."))
    } else {
        Ok(format!("No saved search named '{name}'."))
    }
}

pub fn format_searches(searches: &[SavedSearch]) -> String {
    if searches.is_empty() {
        return "No saved searches.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Name", "Query", "Saved"]);
    for s in searches {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(&s.query),
            Cell::new(s.timestamp.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table.to_string()
}

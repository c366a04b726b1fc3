use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSearch {
    pub name: String,
    pub query: String,
    pub timestamp: DateTime<Local>,
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tally")
}

fn searches_path() -> PathBuf {
    config_dir().join("saved_searches.json")
}

fn load_from(path: &Path) -> Vec<SavedSearch> {
    if !path.exists() {
        return Vec::new();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    let mut searches: Vec<SavedSearch> = serde_json::from_str(&content).unwrap_or_default();
    // Newest first.
    searches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    searches
}

fn save_to(path: &Path, searches: &[SavedSearch]) {
    // Losing a saved search is annoying, not fatal.
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("could not create {}: {e}", dir.display());
            return;
        }
    }
    match serde_json::to_string_pretty(searches) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, format!("{json}\n")) {
                tracing::warn!("could not write {}: {e}", path.display());
            }
        }
        Err(e) => tracing::warn!("could not serialize saved searches: {e}"),
    }
}

fn upsert_in(path: &Path, name: &str, query: &str) {
    let mut searches = load_from(path);
    let now = Local::now();
    match searches.iter_mut().find(|s| s.name == name) {
        Some(existing) => {
            existing.query = query.to_string();
            existing.timestamp = now;
        }
        None => searches.push(SavedSearch {
            name: name.to_string(),
            query: query.to_string(),
            timestamp: now,
        }),
    }
    save_to(path, &searches);
}

fn delete_in(path: &Path, name: &str) -> bool {
    let mut searches = load_from(path);
    let before = searches.len();
    searches.retain(|s| s.name != name);
    if searches.len() == before {
        return false;
    }
    save_to(path, &searches);
    true
}

pub fn load_searches() -> Vec<SavedSearch> {
    load_from(&searches_path())
}

pub fn add_or_update_search(name: &str, query: &str) {
    upsert_in(&searches_path(), name, query)
}

/// Returns false when no search by that name existed.
pub fn delete_search(name: &str) -> bool {
    delete_in(&searches_path(), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_searches.json");
        assert!(load_from(&path).is_empty());
    }

    #[test]
    fn test_add_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_searches.json");
        upsert_in(&path, "groceries", "c:groceries m:>20");
        let searches = load_from(&path);
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].name, "groceries");
        assert_eq!(searches[0].query, "c:groceries m:>20");
    }

    #[test]
    fn test_upsert_replaces_query_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_searches.json");
        upsert_in(&path, "rent", "c:rent");
        let first = load_from(&path)[0].timestamp;
        upsert_in(&path, "rent", "c:rent d:2024");
        let searches = load_from(&path);
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].query, "c:rent d:2024");
        assert!(searches[0].timestamp >= first);
    }

    #[test]
    fn test_sorted_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_searches.json");
        let old = SavedSearch {
            name: "old".to_string(),
            query: "a:cash".to_string(),
            timestamp: Local::now() - chrono::Duration::days(7),
        };
        let new = SavedSearch {
            name: "new".to_string(),
            query: "a:check".to_string(),
            timestamp: Local::now(),
        };
        save_to(&path, &[old, new]);
        let searches = load_from(&path);
        assert_eq!(searches[0].name, "new");
        assert_eq!(searches[1].name, "old");
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_searches.json");
        upsert_in(&path, "one", "q");
        upsert_in(&path, "two", "q");
        assert!(delete_in(&path, "one"));
        assert!(!delete_in(&path, "one"));
        let searches = load_from(&path);
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].name, "two");
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_searches.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_from(&path).is_empty());
    }
}

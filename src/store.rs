//! Per-user persisted data: saved entries, search history, preferences
//!
//! Each collection is stored whole under a single key per user in the
//! embedded store. Read-modify-write here is not serialized across
//! requests; concurrent writes are last-writer-wins, which is fine for
//! single-user dashboard traffic.

use crate::{cache, CineSkyError};
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A saved location/weather/date entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEntry {
    pub id: u64,
    pub location: String,
    pub weather: String,
    pub date: String,
    pub created_at: i64,
}

/// Fields accepted when creating or updating a saved entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEntryInput {
    pub location: String,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub date: String,
}

/// One recorded search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub location: String,
    pub searched_at: i64,
}

/// Per-user display preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPrefs {
    pub display_name: String,
    pub theme: String,
    #[serde(default)]
    pub saved_cities: Vec<String>,
}

impl Default for UserPrefs {
    fn default() -> Self {
        Self {
            display_name: "User".to_string(),
            theme: "light".to_string(),
            saved_cities: Vec::new(),
        }
    }
}

fn list_key(user: &str) -> String {
    format!("list:{user}")
}

fn history_key(user: &str) -> String {
    format!("history:{user}")
}

fn prefs_key(user: &str) -> String {
    format!("prefs:{user}")
}

/// List all saved entries for a user
pub async fn list_entries(user: &str) -> Result<Vec<SavedEntry>> {
    Ok(cache::get(&list_key(user)).await?.unwrap_or_default())
}

/// Add a saved entry. A location that is already on the list is rejected.
pub async fn create_entry(user: &str, input: SavedEntryInput) -> Result<SavedEntry> {
    let location = input.location.trim().to_string();
    if location.is_empty() {
        return Err(CineSkyError::validation("Location cannot be empty").into());
    }

    let mut entries = list_entries(user).await?;
    if entries.iter().any(|e| e.location == location) {
        return Err(CineSkyError::validation(format!(
            "Location '{location}' is already on the list"
        ))
        .into());
    }

    let entry = SavedEntry {
        id: entries.iter().map(|e| e.id).max().unwrap_or(0) + 1,
        location,
        weather: input.weather,
        date: input.date,
        created_at: Utc::now().timestamp(),
    };

    entries.push(entry.clone());
    cache::put(&list_key(user), entries, cache::PERMANENT_TTL).await?;
    Ok(entry)
}

/// Update a saved entry by id
pub async fn update_entry(user: &str, id: u64, input: SavedEntryInput) -> Result<SavedEntry> {
    let mut entries = list_entries(user).await?;

    let entry = entries
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| CineSkyError::not_found(format!("No saved entry with id {id}")))?;

    if !input.location.trim().is_empty() {
        entry.location = input.location.trim().to_string();
    }
    entry.weather = input.weather;
    entry.date = input.date;
    let updated = entry.clone();

    cache::put(&list_key(user), entries, cache::PERMANENT_TTL).await?;
    Ok(updated)
}

/// Delete a saved entry by id
pub async fn delete_entry(user: &str, id: u64) -> Result<()> {
    let mut entries = list_entries(user).await?;
    let before = entries.len();
    entries.retain(|e| e.id != id);

    if entries.len() == before {
        return Err(CineSkyError::not_found(format!("No saved entry with id {id}")).into());
    }

    cache::put(&list_key(user), entries, cache::PERMANENT_TTL).await?;
    Ok(())
}

/// Record a search in the user's history, keeping the newest entries first
/// and the log bounded
pub async fn record_search(user: &str, query: &str, location: &str, max_entries: u32) -> Result<()> {
    let mut history: Vec<HistoryEntry> = cache::get(&history_key(user)).await?.unwrap_or_default();

    history.insert(
        0,
        HistoryEntry {
            query: query.to_string(),
            location: location.to_string(),
            searched_at: Utc::now().timestamp(),
        },
    );
    history.truncate(max_entries as usize);

    cache::put(&history_key(user), history, cache::PERMANENT_TTL).await?;
    Ok(())
}

/// Most recent searches, newest first
pub async fn recent_searches(user: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
    let mut history: Vec<HistoryEntry> = cache::get(&history_key(user)).await?.unwrap_or_default();
    history.truncate(limit);
    Ok(history)
}

/// Fetch preferences, falling back to defaults for a fresh account
pub async fn get_prefs(user: &str) -> Result<UserPrefs> {
    Ok(cache::get(&prefs_key(user)).await?.unwrap_or_default())
}

/// Persist preferences
pub async fn put_prefs(user: &str, prefs: UserPrefs) -> Result<UserPrefs> {
    if prefs.theme != "light" && prefs.theme != "dark" {
        return Err(CineSkyError::validation(format!(
            "Unknown theme '{}'. Must be 'light' or 'dark'.",
            prefs.theme
        ))
        .into());
    }

    cache::put(&prefs_key(user), prefs.clone(), cache::PERMANENT_TTL).await?;
    Ok(prefs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefs() {
        let prefs = UserPrefs::default();
        assert_eq!(prefs.theme, "light");
        assert!(prefs.saved_cities.is_empty());
    }

    #[test]
    fn test_keys_are_namespaced_per_user() {
        assert_eq!(list_key("a@b.com"), "list:a@b.com");
        assert_ne!(list_key("a@b.com"), history_key("a@b.com"));
        assert_ne!(history_key("a@b.com"), prefs_key("a@b.com"));
    }
}

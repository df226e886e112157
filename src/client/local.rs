use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;
use uuid::Uuid;

pub mod keys {
    pub const TOKEN: &str = "token";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER: &str = "user";
    pub const INGREDIENT_USAGE: &str = "ingredient_usage_stats";
    pub const SELECTED_INGREDIENTS: &str = "selectedIngredients";
    pub const SELECTED_SUGGESTED: &str = "selectedSuggested";
    pub const RECENTLY_VIEWED: &str = "recentlyViewed";
}

pub const RECENTLY_VIEWED_CAP: usize = 20;

/// Key/value state persisted as one JSON file per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create state dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// `Ok(None)` when nothing is stored; an error when the file is unreadable or corrupt.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let path = self.path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        let value = serde_json::from_slice(&raw).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(value))
    }

    /// Like [`get`](Self::get), but failures are logged and read as absent.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.get(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, key, "local state unreadable");
                T::default()
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let path = self.path(key);
        let raw = serde_json::to_vec(value)?;
        fs::write(&path, raw).with_context(|| format!("write {}", path.display()))
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    pub fn checked(&self, key: &str) -> Vec<String> {
        self.get_or_default(key)
    }

    /// Flips membership of `item` in a checked-item list; returns whether it is now checked.
    pub fn toggle_checked(&self, key: &str, item: &str) -> anyhow::Result<bool> {
        let mut items = self.checked(key);
        let checked = match items.iter().position(|i| i == item) {
            Some(pos) => {
                items.remove(pos);
                false
            }
            None => {
                items.push(item.to_string());
                true
            }
        };
        self.set(key, &items)?;
        Ok(checked)
    }

    pub fn recently_viewed(&self) -> Vec<Uuid> {
        self.get_or_default(keys::RECENTLY_VIEWED)
    }

    /// Moves `recipe_id` to the front of the history.
    pub fn record_view(&self, recipe_id: Uuid) -> anyhow::Result<()> {
        let mut ids = self.recently_viewed();
        ids.retain(|id| *id != recipe_id);
        ids.insert(0, recipe_id);
        ids.truncate(RECENTLY_VIEWED_CAP);
        self.set(keys::RECENTLY_VIEWED, &ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("state")).unwrap();
        (dir, store)
    }

    #[test]
    fn values_round_trip_and_missing_is_none() {
        let (_dir, store) = store();
        assert_eq!(store.get::<String>(keys::TOKEN).unwrap(), None);
        store.set(keys::TOKEN, "abc").unwrap();
        assert_eq!(store.get::<String>(keys::TOKEN).unwrap().as_deref(), Some("abc"));
        store.remove(keys::TOKEN).unwrap();
        store.remove(keys::TOKEN).unwrap();
        assert_eq!(store.get::<String>(keys::TOKEN).unwrap(), None);
    }

    #[test]
    fn corrupt_files_are_errors_but_default_when_lenient() {
        let (_dir, store) = store();
        fs::write(store.dir().join("user.json"), b"{not json").unwrap();
        assert!(store.get::<serde_json::Value>(keys::USER).is_err());
        let lenient: Vec<String> = store.get_or_default(keys::USER);
        assert!(lenient.is_empty());
    }

    #[test]
    fn checked_items_toggle() {
        let (_dir, store) = store();
        assert!(store.toggle_checked(keys::SELECTED_INGREDIENTS, "flour").unwrap());
        assert!(store.toggle_checked(keys::SELECTED_INGREDIENTS, "sugar").unwrap());
        assert!(!store.toggle_checked(keys::SELECTED_INGREDIENTS, "flour").unwrap());
        assert_eq!(store.checked(keys::SELECTED_INGREDIENTS), vec!["sugar".to_string()]);
        assert!(store.checked(keys::SELECTED_SUGGESTED).is_empty());
    }

    #[test]
    fn recently_viewed_is_deduplicated_and_capped() {
        let (_dir, store) = store();
        let ids: Vec<Uuid> = (0..25).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.record_view(*id).unwrap();
        }
        store.record_view(ids[10]).unwrap();

        let seen = store.recently_viewed();
        assert_eq!(seen.len(), RECENTLY_VIEWED_CAP);
        assert_eq!(seen[0], ids[10]);
        assert_eq!(seen[1], ids[24]);
        assert_eq!(seen.iter().filter(|id| **id == ids[10]).count(), 1);
    }
}

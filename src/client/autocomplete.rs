use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::local::{keys, LocalStore};

pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientSuggestion {
    pub text: String,
    pub count: u64,
    pub display: String,
}

impl IngredientSuggestion {
    fn new(text: &str, count: u64) -> Self {
        Self {
            text: text.to_string(),
            count,
            display: capitalize(text),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// How often each ingredient was typed, persisted between runs.
#[derive(Debug, Clone)]
pub struct IngredientUsage {
    store: LocalStore,
}

impl IngredientUsage {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn stats(&self) -> BTreeMap<String, u64> {
        self.store.get_or_default(keys::INGREDIENT_USAGE)
    }

    fn save(&self, stats: &BTreeMap<String, u64>) -> anyhow::Result<()> {
        self.store.set(keys::INGREDIENT_USAGE, stats)
    }

    /// Counts one use; blank input is ignored.
    pub fn record(&self, ingredient: &str) -> anyhow::Result<()> {
        let key = ingredient.trim().to_lowercase();
        if key.is_empty() {
            return Ok(());
        }
        let mut stats = self.stats();
        *stats.entry(key).or_insert(0) += 1;
        self.save(&stats)
    }

    /// Blank input lists every entry; otherwise the most used matches, capped.
    pub fn suggestions(&self, input: &str) -> Vec<IngredientSuggestion> {
        let stats = self.stats();
        if input.trim().is_empty() {
            return stats
                .iter()
                .map(|(text, count)| IngredientSuggestion::new(text, *count))
                .collect();
        }

        let needle = input.to_lowercase();
        let mut hits: Vec<(&String, &u64)> = stats
            .iter()
            .filter(|(text, count)| **count > 0 && text.contains(&needle))
            .collect();
        hits.sort_by(|a, b| b.1.cmp(a.1));
        hits.into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(text, count)| IngredientSuggestion::new(text, *count))
            .collect()
    }

    pub fn remove(&self, ingredient: &str) -> anyhow::Result<()> {
        let key = ingredient.trim().to_lowercase();
        if key.is_empty() {
            return Ok(());
        }
        let mut stats = self.stats();
        if stats.remove(&key).is_some() {
            self.save(&stats)?;
        }
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        self.store.remove(keys::INGREDIENT_USAGE)
    }
}

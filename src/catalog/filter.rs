use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::recipes::{Category, Difficulty, Recipe};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Title,
    Rating,
    CookTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Search, equality filters and ordering for a recipe list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilter {
    #[serde(default)]
    pub search: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<Difficulty>,
    #[serde(default, alias = "_sort")]
    pub sort_by: SortKey,
    #[serde(default, alias = "_order")]
    pub sort_order: SortOrder,
}

/// Query strings send `category=` for "any"; treat blank like absent.
pub(crate) fn blank_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let hit = recipe.title.to_lowercase().contains(&search)
                || recipe.description.to_lowercase().contains(&search)
                || recipe
                    .ingredients
                    .iter()
                    .any(|i| i.to_lowercase().contains(&search));
            if !hit {
                return false;
            }
        }
        if self.category.is_some_and(|c| c != recipe.category) {
            return false;
        }
        if self.difficulty.is_some_and(|d| d != recipe.difficulty) {
            return false;
        }
        true
    }

    /// Total order on the sort key; equal keys compare `Equal`.
    pub fn compare(&self, a: &Recipe, b: &Recipe) -> Ordering {
        let ord = match self.sort_by {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Rating => a.rating.total_cmp(&b.rating),
            SortKey::CookTime => a.cook_time.cmp(&b.cook_time),
        };
        match self.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }

    /// Filter then stable-sort, so ties keep their input order.
    pub fn apply<R: Borrow<Recipe>>(&self, recipes: Vec<R>) -> Vec<R> {
        let mut out: Vec<R> = recipes
            .into_iter()
            .filter(|r| self.matches(r.borrow()))
            .collect();
        out.sort_by(|a, b| self.compare(a.borrow(), b.borrow()));
        out
    }
}

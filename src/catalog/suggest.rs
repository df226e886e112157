use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::Month;
use uuid::Uuid;

use crate::recipes::{Category, Recipe};

pub const DEFAULT_SUGGESTED_LIMIT: usize = 4;
pub const SET_SIZE: usize = 8;
pub const TOP_RATED_MIN: f64 = 4.0;
pub const TRENDING_MIN_RATINGS: u32 = 5;
pub const QUICK_MEAL_MAX_MINUTES: u32 = 30;

fn by_rating_desc(a: &&Recipe, b: &&Recipe) -> Ordering {
    b.rating.total_cmp(&a.rating)
}

/// Recipes to show next to `source_id`: same category first, then the rest,
/// each group best rated first.
pub fn suggested(recipes: &[Recipe], source_id: Uuid, limit: usize) -> Vec<&Recipe> {
    let Some(source) = recipes.iter().find(|r| r.id == source_id) else {
        return Vec::new();
    };

    let (mut same, mut other): (Vec<&Recipe>, Vec<&Recipe>) = recipes
        .iter()
        .filter(|r| r.id != source_id)
        .partition(|r| r.category == source.category);
    same.sort_by(by_rating_desc);
    other.sort_by(by_rating_desc);

    same.into_iter().chain(other).take(limit).collect()
}

pub fn top_rated(recipes: &[Recipe]) -> Vec<&Recipe> {
    let mut out: Vec<&Recipe> = recipes.iter().filter(|r| r.rating >= TOP_RATED_MIN).collect();
    out.sort_by(by_rating_desc);
    out.truncate(SET_SIZE);
    out
}

pub fn trending(recipes: &[Recipe]) -> Vec<&Recipe> {
    let score = |r: &Recipe| f64::from(r.total_ratings) * r.rating;
    let mut out: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| r.total_ratings >= TRENDING_MIN_RATINGS)
        .collect();
    out.sort_by(|a, b| score(b).total_cmp(&score(a)));
    out.truncate(SET_SIZE);
    out
}

pub fn quick_meals(recipes: &[Recipe]) -> Vec<&Recipe> {
    let mut out: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| r.cook_time <= QUICK_MEAL_MAX_MINUTES)
        .collect();
    out.sort_by(by_rating_desc);
    out.truncate(SET_SIZE);
    out
}

/// Scores non-favorites by shared category, shared ingredients and rating.
/// Without favorites every recipe qualifies, best rated first.
pub fn based_on_favorites<'a>(recipes: &'a [Recipe], favorites: &HashSet<Uuid>) -> Vec<&'a Recipe> {
    if favorites.is_empty() {
        let mut out: Vec<&Recipe> = recipes.iter().collect();
        out.sort_by(by_rating_desc);
        out.truncate(SET_SIZE);
        return out;
    }

    let liked: Vec<&Recipe> = recipes.iter().filter(|r| favorites.contains(&r.id)).collect();
    let liked_categories: HashSet<Category> = liked.iter().map(|r| r.category).collect();
    let liked_ingredients: HashSet<String> = liked
        .iter()
        .flat_map(|r| r.ingredients.iter().map(|i| i.to_lowercase()))
        .collect();

    let mut scored: Vec<(f64, &Recipe)> = recipes
        .iter()
        .filter(|r| !favorites.contains(&r.id))
        .map(|r| {
            let mut score = 0.0;
            if liked_categories.contains(&r.category) {
                score += 3.0;
            }
            let overlap = r
                .ingredients
                .iter()
                .map(|i| i.to_lowercase())
                .filter(|i| {
                    liked_ingredients
                        .iter()
                        .any(|fav| fav.contains(i.as_str()) || i.contains(fav.as_str()))
                })
                .count();
            score += overlap as f64;
            score += r.rating * 0.5;
            (score, r)
        })
        .filter(|(score, _)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(SET_SIZE).map(|(_, r)| r).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn of(month: Month) -> Self {
        use Month::*;
        match month {
            March | April | May => Season::Spring,
            June | July | August => Season::Summer,
            September | October | November => Season::Fall,
            December | January | February => Season::Winter,
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Season::Spring => &["salad", "fresh", "green", "asparagus", "pea", "strawberry"],
            Season::Summer => &[
                "cold",
                "ice",
                "fruit",
                "tomato",
                "cucumber",
                "watermelon",
                "grill",
            ],
            Season::Fall => &["pumpkin", "apple", "cinnamon", "warm", "soup", "stew"],
            Season::Winter => &["hot", "warm", "comfort", "potato", "beef", "chicken", "soup"],
        }
    }
}

pub fn seasonal(recipes: &[Recipe], month: Month) -> Vec<&Recipe> {
    let keywords = Season::of(month).keywords();
    let mut out: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| {
            let text = format!(
                "{} {} {}",
                r.title,
                r.description,
                r.ingredients.join(" ")
            )
            .to_lowercase();
            keywords.iter().any(|k| text.contains(k))
        })
        .collect();
    out.sort_by(by_rating_desc);
    out.truncate(SET_SIZE);
    out
}

/// Resolves ids in order; ids with no recipe are skipped.
pub fn recently_viewed<'a>(recipes: &'a [Recipe], ids: &[Uuid]) -> Vec<&'a Recipe> {
    ids.iter()
        .filter_map(|id| recipes.iter().find(|r| r.id == *id))
        .take(SET_SIZE)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSet {
    pub top_rated: Vec<Recipe>,
    pub trending: Vec<Recipe>,
    pub quick_meals: Vec<Recipe>,
    pub based_on_favorites: Vec<Recipe>,
    pub seasonal: Vec<Recipe>,
}

pub fn suggestion_set(recipes: &[Recipe], favorites: &HashSet<Uuid>, month: Month) -> SuggestionSet {
    let owned = |v: Vec<&Recipe>| v.into_iter().cloned().collect::<Vec<_>>();
    SuggestionSet {
        top_rated: owned(top_rated(recipes)),
        trending: owned(trending(recipes)),
        quick_meals: owned(quick_meals(recipes)),
        based_on_favorites: owned(based_on_favorites(recipes, favorites)),
        seasonal: owned(seasonal(recipes, month)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::fixtures::recipe;

    fn titles(v: &[&Recipe]) -> Vec<String> {
        v.iter().map(|r| r.title.clone()).collect()
    }

    fn pool() -> Vec<Recipe> {
        vec![
            recipe("Source Soup", Category::Dinner, 3.0),
            recipe("Dinner A", Category::Dinner, 4.0),
            recipe("Dinner B", Category::Dinner, 4.8),
            recipe("Lunch A", Category::Lunch, 5.0),
            recipe("Snack A", Category::Snack, 2.0),
        ]
    }

    #[test]
    fn suggested_prefers_same_category_then_pads() {
        let all = pool();
        let got = suggested(&all, all[0].id, 4);
        assert_eq!(titles(&got), vec!["Dinner B", "Dinner A", "Lunch A", "Snack A"]);

        let got = suggested(&all, all[0].id, 3);
        assert_eq!(titles(&got), vec!["Dinner B", "Dinner A", "Lunch A"]);
    }

    #[test]
    fn suggested_never_contains_source_and_respects_limit() {
        let all = pool();
        for r in &all {
            for limit in 0..6 {
                let got = suggested(&all, r.id, limit);
                assert!(got.len() <= limit);
                assert!(got.iter().all(|s| s.id != r.id));
            }
        }
    }

    #[test]
    fn suggested_for_unknown_source_is_empty() {
        assert!(suggested(&pool(), Uuid::new_v4(), DEFAULT_SUGGESTED_LIMIT).is_empty());
    }

    #[test]
    fn top_rated_and_trending_thresholds() {
        let mut all = pool();
        all[1].total_ratings = 10; // 4.0 * 10 = 40
        all[2].total_ratings = 5; // 4.8 * 5 = 24
        all[3].total_ratings = 4;

        assert_eq!(
            titles(&top_rated(&all)),
            vec!["Lunch A", "Dinner B", "Dinner A"]
        );
        assert_eq!(titles(&trending(&all)), vec!["Dinner A", "Dinner B"]);
    }

    #[test]
    fn quick_meals_cap_at_thirty_minutes() {
        let mut all = pool();
        all[1].cook_time = 31;
        all[2].cook_time = 30;
        let got = quick_meals(&all);
        assert!(got.iter().all(|r| r.cook_time <= 30));
        assert!(!titles(&got).contains(&"Dinner A".to_string()));
    }

    #[test]
    fn favorites_drive_category_and_ingredient_matches() {
        let mut all = pool();
        all[0].ingredients = vec!["Chicken thighs".into(), "Garlic".into()];
        all[3].ingredients = vec!["chicken".into()];
        all[4].ingredients = vec!["Garlic".into()];
        all[4].rating = 0.0;
        let favorites: HashSet<Uuid> = [all[0].id].into();

        let got = based_on_favorites(&all, &favorites);
        assert!(got.iter().all(|r| r.id != all[0].id));
        // Dinner B: 3 + 0 + 2.4 = 5.4, Dinner A: 3 + 0 + 2.0 = 5.0,
        // Lunch A: 0 + 1 + 2.5 = 3.5, Snack A: 0 + 1 + 0 = 1.0
        assert_eq!(
            titles(&got),
            vec!["Dinner B", "Dinner A", "Lunch A", "Snack A"]
        );
    }

    #[test]
    fn zero_score_recipes_are_dropped() {
        let mut all = pool();
        all[4].rating = 0.0;
        all[4].ingredients = vec!["popcorn".into()];
        let favorites: HashSet<Uuid> = [all[3].id].into();
        let got = based_on_favorites(&all, &favorites);
        assert!(!titles(&got).contains(&"Snack A".to_string()));
    }

    #[test]
    fn no_favorites_falls_back_to_rating() {
        let all = pool();
        let got = based_on_favorites(&all, &HashSet::new());
        assert_eq!(got.len(), 5);
        assert_eq!(got[0].title, "Lunch A");
    }

    #[test]
    fn seasonal_matches_keywords_of_the_month() {
        let all = pool();
        let soup: Vec<String> = titles(&seasonal(&all, Month::October));
        assert_eq!(soup, vec!["Source Soup"]);
        assert!(seasonal(&all, Month::July).is_empty());
        assert_eq!(Season::of(Month::February), Season::Winter);
        assert_eq!(Season::of(Month::March), Season::Spring);
    }

    #[test]
    fn recently_viewed_skips_missing_ids() {
        let all = pool();
        let ids = vec![all[3].id, Uuid::new_v4(), all[1].id];
        assert_eq!(
            titles(&recently_viewed(&all, &ids)),
            vec!["Lunch A", "Dinner A"]
        );
    }
}

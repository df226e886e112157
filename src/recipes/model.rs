use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::comments::Comment;

pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_DESCRIPTION_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Dessert,
    Drink,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Snack,
        Category::Dessert,
        Category::Drink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Lunch => "lunch",
            Category::Dinner => "dinner",
            Category::Snack => "snack",
            Category::Dessert => "dessert",
            Category::Drink => "drink",
        }
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category `{s}`"))
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown difficulty `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

impl Nutrition {
    fn validate(&self) -> Result<(), String> {
        let values = [self.calories, self.protein, self.carbs, self.fat];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("Nutrition values must be non-negative".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cook_time: u32,
    pub servings: u32,
    pub category: Category,
    pub difficulty: Difficulty,
    pub nutrition: Nutrition,
    pub author_id: Uuid,
    pub rating: f64,
    pub total_ratings: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Recipe {
    /// The editable part of the recipe.
    pub fn input(&self) -> RecipeInput {
        RecipeInput {
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
            cook_time: self.cook_time,
            servings: self.servings,
            category: self.category,
            difficulty: self.difficulty,
            nutrition: self.nutrition,
        }
    }
}

/// Body of create and full update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cook_time: u32,
    pub servings: u32,
    pub category: Category,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub nutrition: Nutrition,
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

impl RecipeInput {
    /// Trims text, drops blank ingredients and steps, then checks every rule.
    pub fn normalized(self) -> Result<Self, String> {
        let input = Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            ingredients: clean_lines(self.ingredients),
            instructions: clean_lines(self.instructions),
            ..self
        };

        if input.title.chars().count() < MIN_TITLE_LEN {
            return Err(format!("Title must be at least {MIN_TITLE_LEN} characters"));
        }
        if input.description.chars().count() < MIN_DESCRIPTION_LEN {
            return Err(format!(
                "Description must be at least {MIN_DESCRIPTION_LEN} characters"
            ));
        }
        if input.image.is_empty() {
            return Err("Image is required".into());
        }
        if input.ingredients.is_empty() {
            return Err("At least 1 ingredient is required".into());
        }
        if input.instructions.is_empty() {
            return Err("Instructions are required".into());
        }
        if input.cook_time == 0 {
            return Err("Cook time must be a positive number".into());
        }
        if input.servings == 0 {
            return Err("Servings must be a positive number".into());
        }
        input.nutrition.validate()?;
        Ok(input)
    }
}

/// Body of a partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

impl RecipePatch {
    pub fn apply(self, current: RecipeInput) -> RecipeInput {
        RecipeInput {
            title: self.title.unwrap_or(current.title),
            description: self.description.unwrap_or(current.description),
            image: self.image.unwrap_or(current.image),
            ingredients: self.ingredients.unwrap_or(current.ingredients),
            instructions: self.instructions.unwrap_or(current.instructions),
            cook_time: self.cook_time.unwrap_or(current.cook_time),
            servings: self.servings.unwrap_or(current.servings),
            category: self.category.unwrap_or(current.category),
            difficulty: self.difficulty.unwrap_or(current.difficulty),
            nutrition: self.nutrition.unwrap_or(current.nutrition),
        }
    }
}

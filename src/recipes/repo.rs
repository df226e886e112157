use sqlx::{types::Json, FromRow, Sqlite, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{Category, Difficulty, Nutrition, Recipe, RecipeInput};
use crate::comments;

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub ingredients: Json<Vec<String>>,
    pub instructions: Json<Vec<String>>,
    pub cook_time: i64,
    pub servings: i64,
    pub category: Category,
    pub difficulty: Difficulty,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub rating: f64,
    pub total_ratings: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            image: r.image,
            ingredients: r.ingredients.0,
            instructions: r.instructions.0,
            cook_time: u32::try_from(r.cook_time).unwrap_or_default(),
            servings: u32::try_from(r.servings).unwrap_or_default(),
            category: r.category,
            difficulty: r.difficulty,
            nutrition: Nutrition {
                calories: r.calories,
                protein: r.protein,
                carbs: r.carbs,
                fat: r.fat,
            },
            author_id: r.author_id,
            rating: r.rating,
            total_ratings: u32::try_from(r.total_ratings).unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            comments: Vec::new(),
        }
    }
}

/// All recipes (optionally one author's), comments attached, newest first.
pub async fn list(db: &SqlitePool, author_id: Option<Uuid>) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, author_id, title, description, image, ingredients, instructions,
               cook_time, servings, category, difficulty, calories, protein, carbs, fat,
               rating, total_ratings, created_at, updated_at
          FROM recipes
         WHERE (?1 IS NULL OR author_id = ?1)
         ORDER BY created_at DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(db)
    .await?;

    let mut comments = comments::repo::grouped_by_recipe(db).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut recipe = Recipe::from(row);
            recipe.comments = comments.remove(&recipe.id).unwrap_or_default();
            recipe
        })
        .collect())
}

/// One recipe with its comments.
pub async fn find(db: &SqlitePool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let Some(row) = find_row(db, id).await? else {
        return Ok(None);
    };
    let mut recipe = Recipe::from(row);
    recipe.comments = comments::repo::list_by_recipe(db, id).await?;
    Ok(Some(recipe))
}

/// Bare row lookup, usable inside a transaction.
pub async fn find_row<'e, E>(executor: E, id: Uuid) -> anyhow::Result<Option<RecipeRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, author_id, title, description, image, ingredients, instructions,
               cook_time, servings, category, difficulty, calories, protein, carbs, fat,
               rating, total_ratings, created_at, updated_at
          FROM recipes
         WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn insert(
    db: &SqlitePool,
    id: Uuid,
    author_id: Uuid,
    input: &RecipeInput,
) -> anyhow::Result<Recipe> {
    let now = OffsetDateTime::now_utc();
    sqlx::query(
        r#"
        INSERT INTO recipes (id, author_id, title, description, image, ingredients, instructions,
                             cook_time, servings, category, difficulty,
                             calories, protein, carbs, fat,
                             rating, total_ratings, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image)
    .bind(Json(&input.ingredients))
    .bind(Json(&input.instructions))
    .bind(i64::from(input.cook_time))
    .bind(i64::from(input.servings))
    .bind(input.category)
    .bind(input.difficulty)
    .bind(input.nutrition.calories)
    .bind(input.nutrition.protein)
    .bind(input.nutrition.carbs)
    .bind(input.nutrition.fat)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    find(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("recipe {id} vanished after insert"))
}

/// Overwrite the editable fields; rating aggregates are left alone.
pub async fn update(db: &SqlitePool, id: Uuid, input: &RecipeInput) -> anyhow::Result<Option<Recipe>> {
    let res = sqlx::query(
        r#"
        UPDATE recipes
           SET title = ?, description = ?, image = ?, ingredients = ?, instructions = ?,
               cook_time = ?, servings = ?, category = ?, difficulty = ?,
               calories = ?, protein = ?, carbs = ?, fat = ?, updated_at = ?
         WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image)
    .bind(Json(&input.ingredients))
    .bind(Json(&input.instructions))
    .bind(i64::from(input.cook_time))
    .bind(i64::from(input.servings))
    .bind(input.category)
    .bind(input.difficulty)
    .bind(input.nutrition.calories)
    .bind(input.nutrition.protein)
    .bind(input.nutrition.carbs)
    .bind(input.nutrition.fat)
    .bind(OffsetDateTime::now_utc())
    .bind(id)
    .execute(db)
    .await?;

    if res.rows_affected() == 0 {
        return Ok(None);
    }
    find(db, id).await
}

pub async fn set_rating<'e, E>(executor: E, id: Uuid, average: f64, total: u32) -> anyhow::Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE recipes SET rating = ?, total_ratings = ? WHERE id = ?")
        .bind(average)
        .bind(i64::from(total))
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Ratings, favorites and comments cascade with the recipe.
pub async fn delete(db: &SqlitePool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

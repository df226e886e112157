use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{aggregate, Rating};
use crate::recipes::repo as recipes;

/// Records the caller's vote and rewrites the recipe aggregate from every
/// stored vote, all in one transaction. `None` when the recipe is unknown.
pub async fn upsert_and_recompute(
    db: &SqlitePool,
    user_id: Uuid,
    recipe_id: Uuid,
    score: i64,
) -> anyhow::Result<Option<(f64, u32)>> {
    let mut tx = db.begin().await?;

    if recipes::find_row(&mut *tx, recipe_id).await?.is_none() {
        return Ok(None);
    }

    let now = OffsetDateTime::now_utc();
    sqlx::query(
        r#"
        INSERT INTO ratings (id, user_id, recipe_id, rating, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, recipe_id)
        DO UPDATE SET rating = excluded.rating, updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(recipe_id)
    .bind(score)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let scores: Vec<i64> = sqlx::query_scalar("SELECT rating FROM ratings WHERE recipe_id = ?")
        .bind(recipe_id)
        .fetch_all(&mut *tx)
        .await?;
    let (average, total) = aggregate(&scores);
    recipes::set_rating(&mut *tx, recipe_id, average, total).await?;

    tx.commit().await?;
    Ok(Some((average, total)))
}

pub async fn list(
    db: &SqlitePool,
    user_id: Option<Uuid>,
    recipe_id: Option<Uuid>,
) -> anyhow::Result<Vec<Rating>> {
    let rows = sqlx::query_as::<_, Rating>(
        r#"
        SELECT id, user_id, recipe_id, rating, created_at, updated_at
          FROM ratings
         WHERE (?1 IS NULL OR user_id = ?1)
           AND (?2 IS NULL OR recipe_id = ?2)
         ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

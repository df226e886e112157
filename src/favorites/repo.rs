use std::collections::HashSet;

use sqlx::{Sqlite, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::Favorite;

pub async fn list(db: &SqlitePool, user_id: Uuid) -> anyhow::Result<Vec<Favorite>> {
    let rows = sqlx::query_as::<_, Favorite>(
        r#"
        SELECT id, user_id, recipe_id, created_at
          FROM favorites
         WHERE user_id = ?
         ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn recipe_ids(db: &SqlitePool, user_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
    let ids: Vec<Uuid> = sqlx::query_scalar("SELECT recipe_id FROM favorites WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// `true` when a new row was written.
pub async fn add<'e, E>(executor: E, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
        INSERT INTO favorites (id, user_id, recipe_id, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, recipe_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(recipe_id)
    .bind(OffsetDateTime::now_utc())
    .execute(executor)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// `true` when a row was removed.
pub async fn remove<'e, E>(executor: E, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Flips membership and reports the new state.
pub async fn toggle(db: &SqlitePool, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;
    let favorited = if remove(&mut *tx, user_id, recipe_id).await? {
        false
    } else {
        add(&mut *tx, user_id, recipe_id).await?;
        true
    };
    tx.commit().await?;
    Ok(favorited)
}

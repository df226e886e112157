use std::collections::HashMap;

use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::Comment;

/// Comments of one recipe, newest first.
pub async fn list_by_recipe(db: &SqlitePool, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, recipe_id, user_id, user_name, user_avatar, content, created_at
          FROM comments
         WHERE recipe_id = ?
         ORDER BY created_at DESC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(newest_first(rows))
}

/// Every comment grouped by recipe, each group newest first.
pub async fn grouped_by_recipe(db: &SqlitePool) -> anyhow::Result<HashMap<Uuid, Vec<Comment>>> {
    let rows = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, recipe_id, user_id, user_name, user_avatar, content, created_at
          FROM comments
         ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for c in newest_first(rows) {
        grouped.entry(c.recipe_id).or_default().push(c);
    }
    Ok(grouped)
}

// Stored timestamps are text with a variable-width fraction, so SQL ordering is only approximate.
fn newest_first(mut rows: Vec<Comment>) -> Vec<Comment> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

pub async fn find(db: &SqlitePool, id: Uuid) -> anyhow::Result<Option<Comment>> {
    let row = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, recipe_id, user_id, user_name, user_avatar, content, created_at
          FROM comments
         WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(
    db: &SqlitePool,
    recipe_id: Uuid,
    user_id: Uuid,
    user_name: &str,
    user_avatar: &str,
    content: &str,
) -> anyhow::Result<Comment> {
    let comment = Comment {
        id: Uuid::new_v4(),
        recipe_id,
        user_id,
        user_name: user_name.to_string(),
        user_avatar: user_avatar.to_string(),
        content: content.to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    sqlx::query(
        r#"
        INSERT INTO comments (id, recipe_id, user_id, user_name, user_avatar, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(comment.id)
    .bind(comment.recipe_id)
    .bind(comment.user_id)
    .bind(&comment.user_name)
    .bind(&comment.user_avatar)
    .bind(&comment.content)
    .bind(comment.created_at)
    .execute(db)
    .await?;
    Ok(comment)
}

pub async fn delete(db: &SqlitePool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

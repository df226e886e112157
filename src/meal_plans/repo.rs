use sqlx::{types::Json, FromRow, SqlitePool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::model::{MealPlan, WeekPlan};

#[derive(Debug, FromRow)]
struct MealPlanRow {
    id: Uuid,
    user_id: Uuid,
    week_start: Date,
    week: Json<WeekPlan>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            week_start: r.week_start,
            week: r.week.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A user's plans, latest week first.
pub async fn list(
    db: &SqlitePool,
    user_id: Uuid,
    week_start: Option<Date>,
) -> anyhow::Result<Vec<MealPlan>> {
    let rows = sqlx::query_as::<_, MealPlanRow>(
        r#"
        SELECT id, user_id, week_start, week, created_at, updated_at
          FROM meal_plans
         WHERE user_id = ?1
           AND (?2 IS NULL OR week_start = ?2)
         ORDER BY week_start DESC
        "#,
    )
    .bind(user_id)
    .bind(week_start)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(MealPlan::from).collect())
}

pub async fn find(db: &SqlitePool, id: Uuid) -> anyhow::Result<Option<MealPlan>> {
    let row = sqlx::query_as::<_, MealPlanRow>(
        r#"
        SELECT id, user_id, week_start, week, created_at, updated_at
          FROM meal_plans
         WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(MealPlan::from))
}

/// One plan per (user, week): a second save for the same week overwrites it.
pub async fn upsert(
    db: &SqlitePool,
    user_id: Uuid,
    week_start: Date,
    week: &WeekPlan,
) -> anyhow::Result<MealPlan> {
    let now = OffsetDateTime::now_utc();
    let row = sqlx::query_as::<_, MealPlanRow>(
        r#"
        INSERT INTO meal_plans (id, user_id, week_start, week, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, week_start)
        DO UPDATE SET week = excluded.week, updated_at = excluded.updated_at
        RETURNING id, user_id, week_start, week, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(week_start)
    .bind(Json(week))
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;
    Ok(row.into())
}

pub async fn save_week(db: &SqlitePool, id: Uuid, week: &WeekPlan) -> anyhow::Result<Option<MealPlan>> {
    let res = sqlx::query("UPDATE meal_plans SET week = ?, updated_at = ? WHERE id = ?")
        .bind(Json(week))
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Ok(None);
    }
    find(db, id).await
}

pub async fn delete(db: &SqlitePool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meal_plans WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

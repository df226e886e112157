use sqlx::{types::Json, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{ProfilePatch, User};

#[derive(Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub avatar: &'a str,
    pub bio: &'a str,
    pub dietary_preferences: &'a [String],
}

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar, bio, dietary_preferences,
                   created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar, bio, dietary_preferences,
                   created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &SqlitePool, new: NewUser<'_>) -> anyhow::Result<User> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, avatar, bio,
                               dietary_preferences, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.name)
        .bind(new.avatar)
        .bind(new.bio)
        .bind(Json(new.dietary_preferences))
        .bind(now)
        .bind(now)
        .execute(db)
        .await?;

        Self::find_by_id(db, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {id} vanished after insert"))
    }

    /// Apply a normalized profile patch; `None` fields keep their stored value.
    pub async fn update_profile(
        db: &SqlitePool,
        id: Uuid,
        patch: &ProfilePatch,
    ) -> anyhow::Result<Option<User>> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET name = COALESCE(?, name),
                   avatar = COALESCE(?, avatar),
                   bio = COALESCE(?, bio),
                   dietary_preferences = COALESCE(?, dietary_preferences),
                   updated_at = ?
             WHERE id = ?
            "#,
        )
        .bind(patch.name.as_deref())
        .bind(patch.avatar.as_deref())
        .bind(patch.bio.as_deref())
        .bind(patch.dietary_preferences.as_ref().map(Json))
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(db, id).await
    }
}

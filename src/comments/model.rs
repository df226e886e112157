use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_COMMENT_LEN: usize = 500;

/// A comment with the author's name and avatar copied in at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub recipe_id: Uuid,
    pub content: String,
}

/// Trimmed content, or why it is unacceptable.
pub fn validate_content(raw: &str) -> Result<String, String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err("Comment cannot be empty".into());
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(format!("Comment cannot exceed {MAX_COMMENT_LEN} characters"));
    }
    Ok(content.to_string())
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// One user's vote on one recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub rating: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub recipe_id: Uuid,
    pub rating: i64,
}

pub fn validate_score(score: i64) -> Result<i64, String> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(format!("Rating must be between {MIN_SCORE} and {MAX_SCORE}"))
    }
}

/// Mean rounded to one decimal, and the vote count.
pub fn aggregate(scores: &[i64]) -> (f64, u32) {
    if scores.is_empty() {
        return (0.0, 0);
    }
    let total: i64 = scores.iter().sum();
    let mean = total as f64 / scores.len() as f64;
    let count = u32::try_from(scores.len()).unwrap_or(u32::MAX);
    ((mean * 10.0).round() / 10.0, count)
}

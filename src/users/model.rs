use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_AVATAR: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=150&h=150&fit=crop&crop=face";

pub const MIN_NAME_LEN: usize = 2;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // Argon2, never leaves the server
    pub name: String,
    pub avatar: String,
    pub bio: String,
    pub dietary_preferences: Json<Vec<String>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// User as the API exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub bio: String,
    pub dietary_preferences: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            avatar: u.avatar,
            bio: u.bio,
            dietary_preferences: u.dietary_preferences.0,
            created_at: u.created_at,
        }
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_preferences: Option<Vec<String>>,
}

pub fn validate_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(format!("Name must be at least {MIN_NAME_LEN} characters"));
    }
    Ok(name.to_string())
}

impl ProfilePatch {
    /// Trims and validates the carried fields, dropping blank preference tags.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.as_deref().map(validate_name).transpose()?;
        let dietary_preferences = self.dietary_preferences.map(|prefs| {
            prefs
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        });
        Ok(Self {
            name,
            avatar: self.avatar.map(|a| a.trim().to_string()),
            bio: self.bio.map(|b| b.trim().to_string()),
            dietary_preferences,
        })
    }
}

//! Typed calls for each server resource.

use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use time::Date;
use uuid::Uuid;

use super::http::{ApiClient, ApiResult};
use crate::{
    auth::{AuthResponse, LoginRequest, RegisterRequest},
    catalog::RecipeFilter,
    comments::{Comment, NewComment},
    favorites::{Favorite, FavoriteRequest, ToggleResponse},
    meal_plans::{CalorieSummary, MealPlan, SavePlanRequest, WeekPlan},
    ratings::{RateRequest, Rating},
    recipes::{Recipe, RecipeInput, RecipePatch},
    users::{ProfilePatch, PublicUser},
};

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi(self)
    }

    pub fn recipes(&self) -> RecipesApi<'_> {
        RecipesApi(self)
    }

    pub fn comments(&self) -> CommentsApi<'_> {
        CommentsApi(self)
    }

    pub fn ratings(&self) -> RatingsApi<'_> {
        RatingsApi(self)
    }

    pub fn favorites(&self) -> FavoritesApi<'_> {
        FavoritesApi(self)
    }

    pub fn meal_plans(&self) -> MealPlansApi<'_> {
        MealPlansApi(self)
    }
}

pub struct AuthApi<'a>(&'a ApiClient);

impl AuthApi<'_> {
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.0.post("/login", &body).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.0.post("/register", req).await
    }

    pub async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> ApiResult<PublicUser> {
        self.0
            .send_json(Method::PATCH, &format!("/users/{user_id}"), patch)
            .await
    }
}

pub struct RecipesApi<'a>(&'a ApiClient);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams<'a> {
    #[serde(flatten)]
    filter: &'a RecipeFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_id: Option<Uuid>,
}

#[derive(Serialize)]
struct ReorderBody<'a> {
    list: &'a str,
    from: usize,
    to: usize,
}

impl RecipesApi<'_> {
    pub async fn list(&self, filter: &RecipeFilter) -> ApiResult<Vec<Recipe>> {
        let params = ListParams {
            filter,
            author_id: None,
        };
        self.0.get_with("/recipes", &params).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Recipe> {
        self.0.get(&format!("/recipes/{id}")).await
    }

    pub async fn by_author(&self, author_id: Uuid) -> ApiResult<Vec<Recipe>> {
        let params = ListParams {
            filter: &RecipeFilter::default(),
            author_id: Some(author_id),
        };
        self.0.get_with("/recipes", &params).await
    }

    pub async fn create(&self, input: &RecipeInput) -> ApiResult<Recipe> {
        self.0.post("/recipes", input).await
    }

    pub async fn update(&self, id: Uuid, patch: &RecipePatch) -> ApiResult<Recipe> {
        self.0
            .send_json(Method::PATCH, &format!("/recipes/{id}"), patch)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.0.delete(&format!("/recipes/{id}")).await
    }

    pub async fn suggested(&self, id: Uuid, limit: usize) -> ApiResult<Vec<Recipe>> {
        self.0
            .get_with(&format!("/recipes/{id}/suggested"), &[("limit", limit)])
            .await
    }

    /// `list` is `ingredients` or `instructions`.
    pub async fn reorder(&self, id: Uuid, list: &str, from: usize, to: usize) -> ApiResult<Recipe> {
        self.0
            .post(&format!("/recipes/{id}/reorder"), &ReorderBody { list, from, to })
            .await
    }
}

pub struct CommentsApi<'a>(&'a ApiClient);

impl CommentsApi<'_> {
    pub async fn by_recipe(&self, recipe_id: Uuid) -> ApiResult<Vec<Comment>> {
        self.0.get_with("/comments", &[("recipeId", recipe_id)]).await
    }

    pub async fn create(&self, recipe_id: Uuid, content: &str) -> ApiResult<Comment> {
        let body = NewComment {
            recipe_id,
            content: content.to_string(),
        };
        self.0.post("/comments", &body).await
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.0.delete(&format!("/comments/{id}")).await
    }
}

pub struct RatingsApi<'a>(&'a ApiClient);

impl RatingsApi<'_> {
    /// Returns the recipe with its refreshed aggregate.
    pub async fn rate(&self, recipe_id: Uuid, rating: i64) -> ApiResult<Recipe> {
        self.0
            .post("/ratings", &RateRequest { recipe_id, rating })
            .await
    }

    pub async fn by_user(&self, user_id: Uuid) -> ApiResult<Vec<Rating>> {
        self.0.get_with("/ratings", &[("userId", user_id)]).await
    }
}

pub struct FavoritesApi<'a>(&'a ApiClient);

impl FavoritesApi<'_> {
    pub async fn by_user(&self, user_id: Uuid) -> ApiResult<Vec<Favorite>> {
        self.0.get_with("/favorites", &[("userId", user_id)]).await
    }

    pub async fn add(&self, recipe_id: Uuid) -> ApiResult<ToggleResponse> {
        self.0.post("/favorites", &FavoriteRequest { recipe_id }).await
    }

    pub async fn remove(&self, recipe_id: Uuid) -> ApiResult<()> {
        self.0.delete(&format!("/favorites/{recipe_id}")).await
    }

    pub async fn toggle(&self, recipe_id: Uuid) -> ApiResult<ToggleResponse> {
        self.0
            .post("/favorites/toggle", &FavoriteRequest { recipe_id })
            .await
    }
}

pub struct MealPlansApi<'a>(&'a ApiClient);

impl MealPlansApi<'_> {
    pub async fn list(&self) -> ApiResult<Vec<MealPlan>> {
        self.0.get("/mealPlans").await
    }

    pub async fn save(&self, week_start: Date, week: &WeekPlan) -> ApiResult<MealPlan> {
        let body = SavePlanRequest {
            week_start,
            week: week.clone(),
        };
        self.0.send_json(Method::PUT, "/mealPlans", &body).await
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.0.delete(&format!("/mealPlans/{id}")).await
    }

    pub async fn calories(&self, id: Uuid) -> ApiResult<CalorieSummary> {
        self.0.get(&format!("/mealPlans/{id}/calories")).await
    }

    pub async fn clear(&self, id: Uuid) -> ApiResult<MealPlan> {
        self.0.post(&format!("/mealPlans/{id}/clear"), &json!({})).await
    }
}

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::{Month, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    model::{Category, Difficulty, Recipe, RecipeInput, RecipePatch},
    repo,
};
use crate::{
    auth::AuthUser,
    catalog::{
        self, filter::blank_as_none, RecipeFilter, SortKey, SortOrder, SuggestionSet,
        DEFAULT_SUGGESTED_LIMIT,
    },
    error::{AppError, AppResult},
    favorites,
    images::service as images,
    state::AppState,
};

/// Inline `data:` images travel in the JSON body.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe)
                .put(replace_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route("/recipes/:id/suggested", get(suggested_recipes))
        .route("/recipes/:id/reorder", post(reorder_recipe))
        .route("/suggestions", get(suggestions))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, alias = "_sort")]
    pub sort_by: Option<SortKey>,
    #[serde(default, alias = "_order")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub author_id: Option<Uuid>,
}

impl ListQuery {
    fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            search: self.search.clone().unwrap_or_default(),
            category: self.category,
            difficulty: self.difficulty,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    let recipes = repo::list(&state.db, q.author_id).await?;
    Ok(Json(q.filter().apply(recipes)))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    let recipe = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    Ok(Json(recipe))
}

/// Swaps an inline image for an uploaded one when storage is available.
async fn resolve_image(state: &AppState, recipe_id: Uuid, image: &str) -> AppResult<String> {
    images::check_owned(recipe_id, image).map_err(|e| {
        warn!(error = %e, %recipe_id, "foreign stored image rejected");
        AppError::bad_request("Image must be uploaded for this recipe")
    })?;
    let Some(storage) = state.storage.as_deref() else {
        return Ok(image.to_string());
    };
    images::store_embedded(storage, recipe_id, image)
        .await
        .map_err(|e| {
            warn!(error = %e, %recipe_id, "embedded image rejected");
            AppError::bad_request(format!("Invalid image: {e}"))
        })
}

#[instrument(skip(state, input))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Json(input): Json<RecipeInput>,
) -> AppResult<(StatusCode, HeaderMap, Json<Recipe>)> {
    let mut input = input.normalized().map_err(AppError::BadRequest)?;
    let id = Uuid::new_v4();
    input.image = resolve_image(&state, id, &input.image).await?;

    let recipe = repo::insert(&state.db, id, author_id, &input).await?;
    info!(recipe_id = %id, %author_id, "recipe created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/recipes/{id}")) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(recipe)))
}

/// The stored recipe, provided the caller wrote it.
async fn owned_recipe(state: &AppState, caller: Uuid, id: Uuid) -> AppResult<Recipe> {
    let recipe = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    if recipe.author_id != caller {
        warn!(%caller, recipe_id = %id, "write to someone else's recipe");
        return Err(AppError::forbidden("Only the author can change this recipe"));
    }
    Ok(recipe)
}

async fn save(state: &AppState, current: Recipe, input: RecipeInput) -> AppResult<Recipe> {
    let mut input = input.normalized().map_err(AppError::BadRequest)?;
    input.image = resolve_image(state, current.id, &input.image).await?;

    let updated = repo::update(&state.db, current.id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;

    if current.image != updated.image {
        if let Some(storage) = state.storage.as_deref() {
            images::discard(storage, current.id, &current.image).await;
        }
    }
    info!(recipe_id = %updated.id, "recipe updated");
    Ok(updated)
}

#[instrument(skip(state, input))]
pub async fn replace_recipe(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<RecipeInput>,
) -> AppResult<Json<Recipe>> {
    let current = owned_recipe(&state, caller, id).await?;
    Ok(Json(save(&state, current, input).await?))
}

#[instrument(skip(state, patch))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<RecipePatch>,
) -> AppResult<Json<Recipe>> {
    let current = owned_recipe(&state, caller, id).await?;
    let input = patch.apply(current.input());
    Ok(Json(save(&state, current, input).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let recipe = owned_recipe(&state, caller, id).await?;
    repo::delete(&state.db, id).await?;
    if let Some(storage) = state.storage.as_deref() {
        images::discard(storage, id, &recipe.image).await;
    }
    info!(recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[instrument(skip(state))]
pub async fn suggested_recipes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<LimitQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    let all = repo::list(&state.db, None).await?;
    if !all.iter().any(|r| r.id == id) {
        return Err(AppError::not_found("Recipe not found"));
    }
    let limit = q.limit.unwrap_or(DEFAULT_SUGGESTED_LIMIT);
    let picks = catalog::suggested(&all, id, limit)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(picks))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderList {
    Ingredients,
    Instructions,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub list: ReorderList,
    pub from: usize,
    pub to: usize,
}

#[instrument(skip(state))]
pub async fn reorder_recipe(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> AppResult<Json<Recipe>> {
    let current = owned_recipe(&state, caller, id).await?;
    let mut input = current.input();
    let items = match req.list {
        ReorderList::Ingredients => &mut input.ingredients,
        ReorderList::Instructions => &mut input.instructions,
    };
    catalog::move_item(items, req.from, req.to).map_err(|e| AppError::bad_request(e.to_string()))?;

    let updated = repo::update(&state.db, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    /// 1..=12; defaults to the current month.
    pub month: Option<u8>,
}

#[instrument(skip(state))]
pub async fn suggestions(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Query(q): Query<SuggestionsQuery>,
) -> AppResult<Json<SuggestionSet>> {
    let month = match q.month {
        Some(m) => Month::try_from(m).map_err(|_| AppError::bad_request("month must be 1-12"))?,
        None => OffsetDateTime::now_utc().month(),
    };
    let favorites = match caller {
        Some(AuthUser(user_id)) => favorites::repo::recipe_ids(&state.db, user_id).await?,
        None => Default::default(),
    };
    let all = repo::list(&state.db, None).await?;
    Ok(Json(catalog::suggestion_set(&all, &favorites, month)))
}

#[cfg(test)]
mod tests {
    use crate::recipes::{fixtures::input, Category, Recipe};
    use crate::test_support::TestApp;
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_fetch() {
        let app = TestApp::spawn().await;
        let me = app.register("ana@example.com", "Ana").await;

        let res = app
            .http
            .post(app.url("/recipes"))
            .bearer_auth(&me.access_token)
            .json(&input("Shakshuka", Category::Breakfast))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let location = res.headers()["location"].to_str().unwrap().to_string();
        let created: Recipe = res.json().await.unwrap();
        assert_eq!(location, format!("/recipes/{}", created.id));
        assert_eq!(created.author_id, me.user.id);
        assert_eq!(created.rating, 0.0);
        assert_eq!(created.total_ratings, 0);
        assert!(created.comments.is_empty());

        let fetched: Recipe = app
            .http
            .get(app.url(&location))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_requires_auth_and_valid_input() {
        let app = TestApp::spawn().await;
        let res = app
            .http
            .post(app.url("/recipes"))
            .json(&input("Toast", Category::Breakfast))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let me = app.register("bo@example.com", "Bo").await;
        let mut bad = input("Toast", Category::Breakfast);
        bad.servings = 0;
        let res = app
            .http
            .post(app.url("/recipes"))
            .bearer_auth(&me.access_token)
            .json(&bad)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = res.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("Servings"));
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let app = TestApp::spawn().await;
        let me = app.register("cy@example.com", "Cy").await;
        app.create_recipe(&me, input("Banana Bread", Category::Dessert)).await;
        app.create_recipe(&me, input("Apple Pie", Category::Dessert)).await;
        app.create_recipe(&me, input("Caesar Salad", Category::Lunch)).await;

        let desserts: Vec<Recipe> = app
            .http
            .get(app.url("/recipes?category=dessert&sortBy=title&sortOrder=asc&difficulty="))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let titles: Vec<_> = desserts.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple Pie", "Banana Bread"]);

        let hits: Vec<Recipe> = app
            .http
            .get(app.url("/recipes?search=SALAD"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let newest: Vec<Recipe> = app
            .http
            .get(app.url(&format!("/recipes?authorId={}", me.user.id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(newest.len(), 3);
        assert_eq!(newest[0].title, "Caesar Salad");
    }

    #[tokio::test]
    async fn only_author_may_edit_or_delete() {
        let app = TestApp::spawn().await;
        let owner = app.register("own@example.com", "Owner").await;
        let other = app.register("oth@example.com", "Other").await;
        let recipe = app.create_recipe(&owner, input("Risotto", Category::Dinner)).await;
        let url = app.url(&format!("/recipes/{}", recipe.id));

        let res = app
            .http
            .patch(&url)
            .bearer_auth(&other.access_token)
            .json(&json!({ "title": "Stolen" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = app
            .http
            .delete(&url)
            .bearer_auth(&other.access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let patched: Recipe = app
            .http
            .patch(&url)
            .bearer_auth(&owner.access_token)
            .json(&json!({ "title": "Mushroom Risotto", "servings": 4 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(patched.title, "Mushroom Risotto");
        assert_eq!(patched.servings, 4);
        assert_eq!(patched.ingredients, recipe.ingredients);
        assert!(patched.updated_at >= recipe.updated_at);

        let mut full = input("Plain Risotto", Category::Dinner);
        full.cook_time = 40;
        let replaced: Recipe = app
            .http
            .put(&url)
            .bearer_auth(&owner.access_token)
            .json(&full)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(replaced.cook_time, 40);
        assert_eq!(replaced.created_at, recipe.created_at);

        let res = app
            .http
            .delete(&url)
            .bearer_auth(&owner.access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let res = app.http.get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn suggested_excludes_source() {
        let app = TestApp::spawn().await;
        let me = app.register("su@example.com", "Sue").await;
        let source = app.create_recipe(&me, input("Tacos", Category::Dinner)).await;
        app.create_recipe(&me, input("Fajitas", Category::Dinner)).await;
        app.create_recipe(&me, input("Smoothie", Category::Drink)).await;

        let picks: Vec<Recipe> = app
            .http
            .get(app.url(&format!("/recipes/{}/suggested?limit=1", source.id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].title, "Fajitas");

        let res = app
            .http
            .get(app.url(&format!("/recipes/{}/suggested", uuid::Uuid::new_v4())))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reorder_moves_one_step() {
        let app = TestApp::spawn().await;
        let me = app.register("re@example.com", "Rey").await;
        let mut raw = input("Layer Cake", Category::Dessert);
        raw.instructions = vec!["mix".into(), "bake".into(), "frost".into()];
        let recipe = app.create_recipe(&me, raw).await;
        let url = app.url(&format!("/recipes/{}/reorder", recipe.id));

        let moved: Recipe = app
            .http
            .post(&url)
            .bearer_auth(&me.access_token)
            .json(&json!({ "list": "instructions", "from": 2, "to": 0 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(moved.instructions, vec!["frost", "mix", "bake"]);

        let res = app
            .http
            .post(&url)
            .bearer_auth(&me.access_token)
            .json(&json!({ "list": "ingredients", "from": 0, "to": 9 }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn embedded_images_are_moved_to_storage() {
        let app = TestApp::spawn_with_storage().await;
        let me = app.register("img@example.com", "Imogen").await;
        let mut raw = input("Photo Pasta", Category::Dinner);
        raw.image = "data:image/jpeg;base64,/9j/4AAQ".into();
        let recipe = app.create_recipe(&me, raw).await;

        assert!(recipe.image.starts_with(&format!("/images/recipes/{}/", recipe.id)));
        assert!(recipe.image.ends_with(".jpg"));
        let storage = app.storage.as_ref().unwrap();
        assert_eq!(storage.len(), 1);

        let res = app
            .http
            .delete(app.url(&format!("/recipes/{}", recipe.id)))
            .bearer_auth(&me.access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn stored_images_of_other_recipes_cannot_be_claimed() {
        let app = TestApp::spawn_with_storage().await;
        let alice = app.register("alice@example.com", "Alice").await;
        let mallory = app.register("mallory@example.com", "Mallory").await;
        let storage = app.storage.as_ref().unwrap();

        let mut raw = input("Saffron Rice", Category::Dinner);
        raw.image = "data:image/jpeg;base64,/9j/4AAQ".into();
        let victim = app.create_recipe(&alice, raw).await;
        assert_eq!(storage.len(), 1);

        let mut copy = input("Copycat Rice", Category::Dinner);
        copy.image = victim.image.clone();
        let res = app
            .http
            .post(app.url("/recipes"))
            .bearer_auth(&mallory.access_token)
            .json(&copy)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let own = app.create_recipe(&mallory, input("Plain Rice", Category::Dinner)).await;
        let res = app
            .http
            .patch(app.url(&format!("/recipes/{}", own.id)))
            .bearer_auth(&mallory.access_token)
            .json(&json!({ "image": victim.image }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .http
            .delete(app.url(&format!("/recipes/{}", own.id)))
            .bearer_auth(&mallory.access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(storage.len(), 1);
        assert!(storage.get(&victim.image["/images/".len()..]).is_some());
    }

    #[tokio::test]
    async fn suggestions_group_the_catalog() {
        let app = TestApp::spawn().await;
        let me = app.register("sg@example.com", "Sig").await;
        let mut soup = input("Pumpkin Soup", Category::Dinner);
        soup.cook_time = 25;
        app.create_recipe(&me, soup).await;

        let sets: serde_json::Value = app
            .http
            .get(app.url("/suggestions?month=10"))
            .bearer_auth(&me.access_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(sets["seasonal"].as_array().unwrap().len(), 1);
        assert_eq!(sets["quickMeals"].as_array().unwrap().len(), 1);
        assert!(sets["topRated"].as_array().unwrap().is_empty());
        assert_eq!(sets["basedOnFavorites"].as_array().unwrap().len(), 1);
    }
}

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    model::{
        calorie_summary, iso_date, AddEntryRequest, CalorieSummary, Day, Meal, MealPlan,
        SavePlanRequest,
    },
    repo,
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    recipes::repo as recipes,
    state::AppState,
};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/mealPlans", get(list_plans).put(save_plan))
        .route("/mealPlans/:id", get(get_plan).delete(delete_plan))
        .route("/mealPlans/:id/entries", post(add_entry))
        .route("/mealPlans/:id/entries/:day/:meal/:index", delete(remove_entry))
        .route("/mealPlans/:id/clear", post(clear_plan))
        .route("/mealPlans/:id/calories", get(plan_calories))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansQuery {
    pub week_start: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PlansQuery>,
) -> AppResult<Json<Vec<MealPlan>>> {
    let week_start = match q.week_start.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(iso_date::parse(raw).map_err(AppError::BadRequest)?),
    };
    Ok(Json(repo::list(&state.db, user_id, week_start).await?))
}

/// The plan, provided the caller owns it.
async fn owned_plan(state: &AppState, caller: Uuid, id: Uuid) -> AppResult<MealPlan> {
    let plan = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Meal plan not found"))?;
    if plan.user_id != caller {
        warn!(%caller, plan_id = %id, "meal plan of another user");
        return Err(AppError::forbidden("This meal plan belongs to someone else"));
    }
    Ok(plan)
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MealPlan>> {
    Ok(Json(owned_plan(&state, caller, id).await?))
}

#[instrument(skip(state, req))]
pub async fn save_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<SavePlanRequest>,
) -> AppResult<Json<MealPlan>> {
    let plan = repo::upsert(&state.db, user_id, req.week_start, &req.week).await?;
    info!(plan_id = %plan.id, week_start = %plan.week_start, "meal plan saved");
    Ok(Json(plan))
}

async fn store(state: &AppState, plan: MealPlan) -> AppResult<MealPlan> {
    repo::save_week(&state.db, plan.id, &plan.week)
        .await?
        .ok_or_else(|| AppError::not_found("Meal plan not found"))
}

#[instrument(skip(state))]
pub async fn add_entry(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddEntryRequest>,
) -> AppResult<Json<MealPlan>> {
    let mut plan = owned_plan(&state, caller, id).await?;
    if recipes::find_row(&state.db, req.recipe_id).await?.is_none() {
        return Err(AppError::not_found("Recipe not found"));
    }
    plan.week.add(req.day, req.meal, req.recipe_id);
    Ok(Json(store(&state, plan).await?))
}

#[instrument(skip(state))]
pub async fn remove_entry(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((id, day, meal, index)): Path<(Uuid, Day, Meal, usize)>,
) -> AppResult<Json<MealPlan>> {
    let mut plan = owned_plan(&state, caller, id).await?;
    if plan.week.remove(day, meal, index).is_none() {
        return Err(AppError::not_found(format!("No {meal} entry at index {index}")));
    }
    Ok(Json(store(&state, plan).await?))
}

#[instrument(skip(state))]
pub async fn clear_plan(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MealPlan>> {
    let mut plan = owned_plan(&state, caller, id).await?;
    plan.week.clear();
    Ok(Json(store(&state, plan).await?))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    owned_plan(&state, caller, id).await?;
    repo::delete(&state.db, id).await?;
    info!(plan_id = %id, "meal plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn plan_calories(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CalorieSummary>> {
    let plan = owned_plan(&state, caller, id).await?;
    let mut calories = HashMap::new();
    for recipe_id in plan.week.recipe_ids() {
        if let Some(row) = recipes::find_row(&state.db, recipe_id).await? {
            calories.insert(recipe_id, row.calories);
        }
    }
    Ok(Json(calorie_summary(&plan.week, &calories)))
}

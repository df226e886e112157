use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;

pub use model::{
    calorie_summary, AddEntryRequest, CalorieLevel, CalorieSummary, Day, DayCalories, DayPlan,
    Meal, MealPlan, SavePlanRequest, WeekPlan,
};

pub fn router() -> Router<AppState> {
    handlers::meal_plan_routes()
}

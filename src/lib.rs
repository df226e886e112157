pub mod app;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod comments;
pub mod config;
pub mod error;
pub mod favorites;
pub mod images;
pub mod meal_plans;
pub mod ratings;
pub mod recipes;
pub mod state;
pub mod storage;
pub mod users;

#[cfg(test)]
mod test_support;

pub mod client;
mod dto;
pub mod handlers;
pub mod services;

pub use client::{HttpRecommender, Recommender};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::recommend_routes()
}

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{DashboardEnrollRequest, DashboardQuery, RecommendationsResponse},
    services::{self, Dashboard},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn recommend_routes() -> Router<AppState> {
    Router::new()
        .route("/recommend/:type/:user_id", get(recommend))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/enroll", post(dashboard_enroll))
}

/// GET /recommend/:type/:userId → `{recommendations: [[id, name, category, difficulty, video, description], …]}`
#[instrument(skip(state))]
pub async fn recommend(
    State(state): State<AppState>,
    Path((strategy, user_id)): Path<(String, String)>,
) -> AppResult<Json<RecommendationsResponse>> {
    let user_id = user_id
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::invalid("userId must be a positive integer"))?;
    let items =
        services::get_recommendations(state.recommender.as_ref(), &strategy, Some(user_id)).await?;
    Ok(Json(RecommendationsResponse {
        recommendations: items.into_iter().map(|i| i.into_row()).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> AppResult<Json<Dashboard>> {
    let Query(q) = query?;
    let dashboard = services::build_dashboard(
        state.store.as_ref(),
        state.recommender.as_ref(),
        q.user_id,
        q.strategy.as_deref(),
    )
    .await?;
    Ok(Json(dashboard))
}

#[instrument(skip(state, payload))]
pub async fn dashboard_enroll(
    State(state): State<AppState>,
    payload: Result<Json<DashboardEnrollRequest>, JsonRejection>,
) -> AppResult<Json<Dashboard>> {
    let Json(body) = payload?;
    let dashboard = services::enroll_from_dashboard(
        state.store.as_ref(),
        state.recommender.as_ref(),
        body.user_id,
        body.course_id,
        body.strategy.as_deref(),
    )
    .await?;
    Ok(Json(dashboard))
}

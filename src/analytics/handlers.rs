use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AnalyticsSnapshot, UserProfile},
    services,
};
use crate::{courses::UserQuery, error::AppResult, extract::require_id, state::AppState};

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/user_details", get(user_details))
        .route(
            "/user_details_with_comprehensive_analysis",
            get(comprehensive_analysis),
        )
}

#[instrument(skip(state))]
pub async fn user_details(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> AppResult<Json<UserProfile>> {
    let Query(q) = query?;
    let user_id = require_id(q.user_id, "userId")?;
    Ok(Json(services::user_details(state.store.as_ref(), user_id).await?))
}

/// GET /user_details_with_comprehensive_analysis?userId=
#[instrument(skip(state))]
pub async fn comprehensive_analysis(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> AppResult<Json<AnalyticsSnapshot>> {
    let Query(q) = query?;
    let user_id = require_id(q.user_id, "userId")?;
    let snapshot = services::comprehensive_analysis(state.store.as_ref(), user_id).await?;
    Ok(Json(snapshot))
}

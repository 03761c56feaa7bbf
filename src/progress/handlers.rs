use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{UpdateProgressRequest, UpdateProgressResponse},
    services::{record_progress, ProgressInput},
};
use crate::{
    error::{AppError, AppResult},
    extract::{non_blank, require_id},
    state::AppState,
};

pub fn progress_routes() -> Router<AppState> {
    Router::new().route("/updateProgress", post(update_progress))
}

/// POST /updateProgress
#[instrument(skip(state, payload))]
pub async fn update_progress(
    State(state): State<AppState>,
    payload: Result<Json<UpdateProgressRequest>, JsonRejection>,
) -> AppResult<Json<UpdateProgressResponse>> {
    let Json(body) = payload?;
    let (Some(user_id), Some(course_id), Some(progress)) =
        (body.user_id, body.course_id, body.progress)
    else {
        return Err(AppError::invalid("Missing required fields"));
    };
    let input = ProgressInput {
        user_id: require_id(Some(user_id), "userId")?,
        course_id: require_id(Some(course_id), "courseId")?,
        progress,
        rating: body.rating,
        difficulty: non_blank(body.difficulty),
        learning_style: non_blank(body.learning_style),
        time_spent: body.time_spent,
        engagement_score: body.engagement_score,
    };

    let next = record_progress(state.store.as_ref(), input).await?;
    Ok(Json(UpdateProgressResponse {
        success: true,
        state: next,
    }))
}

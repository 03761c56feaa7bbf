use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CourseDetails, EnrollRequest, MessageResponse, UserQuery};
use crate::{
    error::{AppError, AppResult},
    extract::require_id,
    progress,
    state::AppState,
    store::{Course, EnrolledCourse},
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/:course_id", get(course_details))
}

pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll))
        .route("/enrolled_courses", get(enrolled_courses))
}

#[instrument(skip(state))]
pub async fn list_courses(State(state): State<AppState>) -> AppResult<Json<Vec<Course>>> {
    Ok(Json(state.store.list_courses().await?))
}

#[instrument(skip(state))]
pub async fn course_details(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<CourseDetails>> {
    let course = state
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;
    Ok(Json(course.into()))
}

/// POST /enroll { userId, courseId }
#[instrument(skip(state, payload))]
pub async fn enroll(
    State(state): State<AppState>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(body) = payload?;
    if body.user_id.is_none() || body.course_id.is_none() {
        return Err(AppError::invalid("User ID and Course ID are required"));
    }
    let user_id = require_id(body.user_id, "userId")?;
    let course_id = require_id(body.course_id, "courseId")?;

    progress::services::enroll(state.store.as_ref(), user_id, course_id).await?;
    Ok(Json(MessageResponse {
        message: "Course enrolled successfully".into(),
    }))
}

/// GET /enrolled_courses?userId=
#[instrument(skip(state))]
pub async fn enrolled_courses(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> AppResult<Json<Vec<EnrolledCourse>>> {
    let Query(q) = query?;
    let user_id = require_id(q.user_id, "userId")?;
    Ok(Json(state.store.enrolled_courses(user_id).await?))
}

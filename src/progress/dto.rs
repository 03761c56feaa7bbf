use serde::{Deserialize, Serialize};

use super::services::EnrollmentState;
use crate::extract::{opt_id, opt_number};

/// Body of `POST /updateProgress`. Numbers may arrive as text. Presence is
/// checked by the handler so that a missing field is a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    #[serde(default, deserialize_with = "opt_id")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_id")]
    pub course_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub progress: Option<i32>,
    #[serde(default, deserialize_with = "opt_number")]
    pub rating: Option<i32>,
    pub difficulty: Option<String>,
    pub learning_style: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    pub time_spent: Option<i64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub engagement_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProgressResponse {
    pub success: bool,
    pub state: EnrollmentState,
}

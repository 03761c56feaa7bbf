use serde::{Deserialize, Serialize};

use crate::{extract::opt_id, store::Course};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[serde(default, deserialize_with = "opt_id")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_id")]
    pub course_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<i64>,
}

/// What the course page needs to play a course.
#[derive(Debug, Serialize)]
pub struct CourseDetails {
    pub course_id: i64,
    pub course_name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub video_url: Option<String>,
    pub course_content: Option<String>,
}

impl From<Course> for CourseDetails {
    fn from(c: Course) -> Self {
        Self {
            course_id: c.course_id,
            course_name: c.course_name,
            category: c.category,
            difficulty: c.difficulty,
            video_url: c.youtube_link,
            course_content: c.course_description,
        }
    }
}

use serde::Serialize;
use time::OffsetDateTime;

use super::services::CategoryCount;
use crate::store::User;

/// Public part of the user, never the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub preference: Option<String>,
    pub area_of_interest: Option<String>,
    pub learning_goal: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            age: u.age,
            gender: u.gender,
            preference: u.preference,
            area_of_interest: u.area_of_interest,
            learning_goal: u.learning_goal,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub course_count: i64,
    pub avg_progress: Option<f64>,
    pub avg_rating: Option<f64>,
    pub difficulty: Option<String>,
    pub learning_style: Option<String>,
    pub time_spent: Option<i64>,
    pub engagement_score: Option<f64>,
    pub course_categories: Vec<CategoryCount>,
}

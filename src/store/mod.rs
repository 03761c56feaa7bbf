//! Interaction store: users, the course catalog, per-(user, course) interactions and
//! the per-user learning profile (`user_data`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_LEARNING_STYLE: &str = "Visual";
pub const INITIAL_RATING: i32 = 1;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub preference: Option<String>,
    pub area_of_interest: Option<String>,
    pub learning_goal: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub preference: Option<String>,
    pub area_of_interest: Option<String>,
    pub learning_goal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub course_id: i64,
    pub course_name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub popularity: f64,
    pub course_description: Option<String>,
    pub youtube_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Interaction {
    pub user_id: i64,
    pub course_id: i64,
    pub progress: i32,
    pub rating: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completion_date: Option<OffsetDateTime>,
}

/// One row of the enrolled-courses listing.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct EnrolledCourse {
    pub course_id: i64,
    pub course_name: String,
    pub youtube_link: Option<String>,
    pub progress: i32,
}

/// The `user_data` row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LearningProfile {
    pub user_id: i64,
    pub difficulty: Option<String>,
    pub learning_style: Option<String>,
    pub time_spent: i64,
    pub engagement_score: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// An interaction joined with its course category.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct InteractionFact {
    pub course_id: i64,
    pub progress: i32,
    pub rating: i32,
    pub category: Option<String>,
}

/// A validated progress event for one (user, course) pair. `None` fields keep the
/// stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub user_id: i64,
    pub course_id: i64,
    pub progress: i32,
    pub rating: Option<i32>,
    pub difficulty: Option<String>,
    pub learning_style: Option<String>,
    pub time_spent: Option<i64>,
    pub engagement_score: Option<f64>,
}

#[async_trait]
pub trait LearningStore: Send + Sync {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Inserts the user together with a default learning profile.
    async fn create_user(&self, new_user: NewUser) -> AppResult<User>;

    async fn list_courses(&self) -> AppResult<Vec<Course>>;
    async fn find_course(&self, course_id: i64) -> AppResult<Option<Course>>;

    /// Creates the interaction (`progress = 0`, `rating = 1`) and makes sure the
    /// learning profile exists. `Conflict` if the pair is already enrolled.
    async fn enroll(&self, user_id: i64, course_id: i64) -> AppResult<Interaction>;
    async fn enrolled_courses(&self, user_id: i64) -> AppResult<Vec<EnrolledCourse>>;
    async fn interaction(&self, user_id: i64, course_id: i64) -> AppResult<Option<Interaction>>;

    /// Writes the interaction and the learning profile atomically. `NotFound` if
    /// either row is missing, in which case nothing is written.
    async fn apply_progress(&self, update: &ProgressUpdate) -> AppResult<Interaction>;

    async fn learning_profile(&self, user_id: i64) -> AppResult<Option<LearningProfile>>;
    async fn interaction_facts(&self, user_id: i64) -> AppResult<Vec<InteractionFact>>;
}

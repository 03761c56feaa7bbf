use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    Course, EnrolledCourse, Interaction, InteractionFact, LearningProfile, LearningStore,
    NewUser, ProgressUpdate, User, DEFAULT_LEARNING_STYLE, INITIAL_RATING,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
    // insertion order doubles as enrollment order
    interactions: Vec<Interaction>,
    profiles: HashMap<i64, LearningProfile>,
}

fn default_profile(user_id: i64) -> LearningProfile {
    LearningProfile {
        user_id,
        difficulty: None,
        learning_style: Some(DEFAULT_LEARNING_STYLE.to_string()),
        time_spent: 0,
        engagement_score: 0.0,
        last_updated: OffsetDateTime::now_utc(),
    }
}

/// In-process store with the same contract as [`super::PgStore`]. Every mutation
/// runs under one write lock, which gives it the all-or-nothing behaviour of a
/// database transaction.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(self, courses: impl IntoIterator<Item = Course>) -> Self {
        courses.into_iter().fold(self, Self::with_course)
    }

    /// Seeds a catalog entry, keeping its id.
    pub fn with_course(mut self, course: Course) -> Self {
        self.tables.get_mut().courses.push(course);
        self
    }

    /// Seeds a user and a default learning profile, keeping the user's id.
    #[cfg(test)]
    pub fn with_user(mut self, user: User) -> Self {
        let tables = self.tables.get_mut();
        tables.profiles.insert(user.id, default_profile(user.id));
        tables.users.push(user);
        self
    }

    #[cfg(test)]
    pub(crate) async fn remove_profile(&self, user_id: i64) {
        self.tables.write().await.profiles.remove(&user_id);
    }
}

#[async_trait]
impl LearningStore for MemoryStore {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let id = tables.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            age: new_user.age,
            gender: new_user.gender,
            preference: new_user.preference,
            area_of_interest: new_user.area_of_interest,
            learning_goal: new_user.learning_goal,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.profiles.insert(id, default_profile(id));
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        let mut courses = self.tables.read().await.courses.clone();
        courses.sort_by(|a, b| {
            b.popularity
                .total_cmp(&a.popularity)
                .then(a.course_id.cmp(&b.course_id))
        });
        Ok(courses)
    }

    async fn find_course(&self, course_id: i64) -> AppResult<Option<Course>> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .find(|c| c.course_id == course_id)
            .cloned())
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> AppResult<Interaction> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::not_found("User not found"));
        }
        if !tables.courses.iter().any(|c| c.course_id == course_id) {
            return Err(AppError::not_found("Course not found"));
        }
        if tables
            .interactions
            .iter()
            .any(|i| i.user_id == user_id && i.course_id == course_id)
        {
            return Err(AppError::Conflict("Already enrolled in this course".into()));
        }

        let interaction = Interaction {
            user_id,
            course_id,
            progress: 0,
            rating: INITIAL_RATING,
            enrolled_at: OffsetDateTime::now_utc(),
            completion_date: None,
        };
        tables.interactions.push(interaction.clone());
        tables
            .profiles
            .entry(user_id)
            .or_insert_with(|| default_profile(user_id));
        Ok(interaction)
    }

    async fn enrolled_courses(&self, user_id: i64) -> AppResult<Vec<EnrolledCourse>> {
        let tables = self.tables.read().await;
        let rows = tables
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .filter_map(|i| {
                let course = tables.courses.iter().find(|c| c.course_id == i.course_id)?;
                Some(EnrolledCourse {
                    course_id: course.course_id,
                    course_name: course.course_name.clone(),
                    youtube_link: course.youtube_link.clone(),
                    progress: i.progress,
                })
            })
            .collect();
        Ok(rows)
    }

    async fn interaction(&self, user_id: i64, course_id: i64) -> AppResult<Option<Interaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .interactions
            .iter()
            .find(|i| i.user_id == user_id && i.course_id == course_id)
            .cloned())
    }

    async fn apply_progress(&self, update: &ProgressUpdate) -> AppResult<Interaction> {
        let mut tables = self.tables.write().await;

        // both rows are checked before either is touched
        let idx = tables
            .interactions
            .iter()
            .position(|i| i.user_id == update.user_id && i.course_id == update.course_id)
            .ok_or_else(|| AppError::not_found("Interaction not found"))?;
        if !tables.profiles.contains_key(&update.user_id) {
            return Err(AppError::not_found("User data not found"));
        }

        let now = OffsetDateTime::now_utc();
        let interaction = &mut tables.interactions[idx];
        interaction.progress = update.progress;
        if let Some(rating) = update.rating {
            interaction.rating = rating;
        }
        interaction.completion_date = Some(now);
        let updated = interaction.clone();

        if let Some(profile) = tables.profiles.get_mut(&update.user_id) {
            if let Some(d) = &update.difficulty {
                profile.difficulty = Some(d.clone());
            }
            if let Some(s) = &update.learning_style {
                profile.learning_style = Some(s.clone());
            }
            if let Some(t) = update.time_spent {
                profile.time_spent = t;
            }
            if let Some(e) = update.engagement_score {
                profile.engagement_score = e;
            }
            profile.last_updated = now;
        }
        Ok(updated)
    }

    async fn learning_profile(&self, user_id: i64) -> AppResult<Option<LearningProfile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn interaction_facts(&self, user_id: i64) -> AppResult<Vec<InteractionFact>> {
        let tables = self.tables.read().await;
        let facts = tables
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .filter_map(|i| {
                let course = tables.courses.iter().find(|c| c.course_id == i.course_id)?;
                Some(InteractionFact {
                    course_id: i.course_id,
                    progress: i.progress,
                    rating: i.rating,
                    category: course.category.clone(),
                })
            })
            .collect();
        Ok(facts)
    }
}

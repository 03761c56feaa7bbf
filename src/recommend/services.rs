use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{client::Recommender, dto::RecommendationItem};
use crate::{
    error::{AppError, AppResult},
    extract::require_id,
    progress,
    store::{EnrolledCourse, LearningStore},
};

pub const DEFAULT_STRATEGY: &str = "hybrid";

/// Fetches the recommender's list for a user. The strategy tag is passed through
/// untouched.
pub async fn get_recommendations(
    recommender: &dyn Recommender,
    strategy: &str,
    user_id: Option<i64>,
) -> AppResult<Vec<RecommendationItem>> {
    if strategy.trim().is_empty() {
        return Err(AppError::invalid("Type and User ID are required"));
    }
    let user_id = require_id(user_id, "userId")?;

    let items = recommender.recommend(strategy, user_id).await?;
    info!(user_id, strategy, count = items.len(), "recommendations fetched");
    Ok(items)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Affordance {
    /// Already enrolled: go to the course.
    Continue,
    Enroll,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecommendation {
    #[serde(flatten)]
    pub item: RecommendationItem,
    pub action: Affordance,
}

/// Recommendations reconciled against what the user is enrolled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecommendationFeed {
    items: Vec<MergedRecommendation>,
}

/// Tags each item `continue` or `enroll`. Repeated course ids keep their first
/// position.
pub fn reconcile(items: Vec<RecommendationItem>, enrolled: &HashSet<i64>) -> RecommendationFeed {
    let mut seen = HashSet::with_capacity(items.len());
    let items = items
        .into_iter()
        .filter(|item| seen.insert(item.course_id))
        .map(|item| {
            let action = if enrolled.contains(&item.course_id) {
                Affordance::Continue
            } else {
                Affordance::Enroll
            };
            MergedRecommendation { item, action }
        })
        .collect();
    RecommendationFeed { items }
}

impl RecommendationFeed {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops a course the user just enrolled in from the feed.
    pub fn record_enrollment(&mut self, course_id: i64) -> Option<RecommendationItem> {
        let idx = self.items.iter().position(|m| m.item.course_id == course_id)?;
        Some(self.items.remove(idx).item)
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub enrolled_courses: Vec<EnrolledCourse>,
    pub average_progress: f64,
    pub recommendations: RecommendationFeed,
}

fn average_progress(courses: &[EnrolledCourse]) -> f64 {
    if courses.is_empty() {
        return 0.0;
    }
    let total: i64 = courses.iter().map(|c| i64::from(c.progress)).sum();
    total as f64 / courses.len() as f64
}

pub async fn build_dashboard(
    store: &dyn LearningStore,
    recommender: &dyn Recommender,
    user_id: Option<i64>,
    strategy: Option<&str>,
) -> AppResult<Dashboard> {
    let user_id = require_id(user_id, "userId")?;
    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let enrolled_courses = store.enrolled_courses(user_id).await?;
    let enrolled: HashSet<i64> = enrolled_courses.iter().map(|c| c.course_id).collect();
    // The recommender answers 404 for learners it has nothing for yet; the
    // enrolled half of the page is still worth serving.
    let items = match get_recommendations(
        recommender,
        strategy.unwrap_or(DEFAULT_STRATEGY),
        Some(user_id),
    )
    .await
    {
        Ok(items) => items,
        Err(e @ (AppError::UpstreamUnavailable(_) | AppError::MalformedUpstreamResponse(_))) => {
            warn!(user_id, error = %e, "recommendations unavailable; dashboard served without them");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let recommendations = reconcile(items, &enrolled);
    if recommendations.is_empty() {
        debug!(user_id, "dashboard has no recommendations");
    }
    debug!(
        user_id,
        enrolled = enrolled_courses.len(),
        recommended = recommendations.len(),
        "dashboard built"
    );

    Ok(Dashboard {
        average_progress: average_progress(&enrolled_courses),
        enrolled_courses,
        recommendations,
    })
}

/// Enrolls from the recommendation list and returns the refreshed dashboard without
/// the course in its recommendations.
pub async fn enroll_from_dashboard(
    store: &dyn LearningStore,
    recommender: &dyn Recommender,
    user_id: Option<i64>,
    course_id: Option<i64>,
    strategy: Option<&str>,
) -> AppResult<Dashboard> {
    let user_id = require_id(user_id, "userId")?;
    let course_id = require_id(course_id, "courseId")?;
    progress::services::enroll(store, user_id, course_id).await?;

    let mut dashboard = build_dashboard(store, recommender, Some(user_id), strategy).await?;
    dashboard.recommendations.record_enrollment(course_id);
    Ok(dashboard)
}

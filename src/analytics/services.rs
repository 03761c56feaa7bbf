use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::dto::{AnalyticsSnapshot, UserProfile};
use crate::{
    error::{AppError, AppResult},
    store::{InteractionFact, LearningStore},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub category_count: i64,
}

/// Per-user rollup over interactions. Averages are `None` when there is nothing
/// to average.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionRollup {
    pub course_count: i64,
    pub avg_progress: Option<f64>,
    pub avg_rating: Option<f64>,
    pub categories: Vec<CategoryCount>,
}

impl InteractionRollup {
    pub fn from_facts(facts: &[InteractionFact]) -> Self {
        if facts.is_empty() {
            return Self::default();
        }
        let n = facts.len() as f64;
        let progress_sum: i64 = facts.iter().map(|f| i64::from(f.progress)).sum();
        let rating_sum: i64 = facts.iter().map(|f| i64::from(f.rating)).sum();

        let mut named: BTreeMap<&str, i64> = BTreeMap::new();
        let mut uncategorized = 0;
        for fact in facts {
            match fact.category.as_deref() {
                Some(c) => *named.entry(c).or_insert(0) += 1,
                None => uncategorized += 1,
            }
        }
        let mut categories: Vec<CategoryCount> = named
            .into_iter()
            .map(|(c, count)| CategoryCount {
                category: Some(c.to_string()),
                category_count: count,
            })
            .collect();
        if uncategorized > 0 {
            categories.push(CategoryCount {
                category: None,
                category_count: uncategorized,
            });
        }

        Self {
            course_count: facts.len() as i64,
            avg_progress: Some(progress_sum as f64 / n),
            avg_rating: Some(rating_sum as f64 / n),
            categories,
        }
    }
}

pub async fn user_details(store: &dyn LearningStore, user_id: i64) -> AppResult<UserProfile> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(user.into())
}

/// Profile, interaction rollup and learning signals in one flat snapshot. Only an
/// unknown user is an error; missing profile or interaction rows read as empty.
pub async fn comprehensive_analysis(
    store: &dyn LearningStore,
    user_id: i64,
) -> AppResult<AnalyticsSnapshot> {
    let profile = user_details(store, user_id).await?;
    let facts = store.interaction_facts(user_id).await?;
    let learning = store.learning_profile(user_id).await?;
    if learning.is_none() {
        debug!(user_id, "no learning profile row; reporting empty signals");
    }

    let rollup = InteractionRollup::from_facts(&facts);
    Ok(AnalyticsSnapshot {
        profile,
        course_count: rollup.course_count,
        avg_progress: rollup.avg_progress,
        avg_rating: rollup.avg_rating,
        difficulty: learning.as_ref().and_then(|l| l.difficulty.clone()),
        learning_style: learning.as_ref().and_then(|l| l.learning_style.clone()),
        time_spent: learning.as_ref().map(|l| l.time_spent),
        engagement_score: learning.as_ref().map(|l| l.engagement_score),
        course_categories: rollup.categories,
    })
}

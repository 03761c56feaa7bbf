use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    store::{Interaction, LearningStore, ProgressUpdate},
};

pub const MIN_PROGRESS: i32 = 0;
pub const MAX_PROGRESS: i32 = 100;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Lifecycle of one (user, course) enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "progress", rename_all = "snake_case")]
pub enum EnrollmentState {
    NotEnrolled,
    Enrolled,
    InProgress(i32),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Enroll,
    Record(i32),
}

impl EnrollmentState {
    pub fn of(interaction: Option<&Interaction>) -> Self {
        match interaction {
            None => Self::NotEnrolled,
            Some(i) => Self::for_progress(i.progress),
        }
    }

    fn for_progress(progress: i32) -> Self {
        match progress {
            p if p <= MIN_PROGRESS => Self::Enrolled,
            p if p >= MAX_PROGRESS => Self::Completed,
            p => Self::InProgress(p),
        }
    }

    pub fn apply(self, event: ProgressEvent) -> AppResult<Self> {
        match (self, event) {
            (_, ProgressEvent::Record(p)) if !(MIN_PROGRESS..=MAX_PROGRESS).contains(&p) => {
                Err(AppError::invalid(format!(
                    "progress must be between {MIN_PROGRESS} and {MAX_PROGRESS}"
                )))
            }
            (Self::NotEnrolled, ProgressEvent::Enroll) => Ok(Self::Enrolled),
            (_, ProgressEvent::Enroll) => {
                Err(AppError::Conflict("Already enrolled in this course".into()))
            }
            (Self::NotEnrolled, ProgressEvent::Record(_)) => {
                Err(AppError::not_found("Interaction not found"))
            }
            // Completed stays open: learners revisit finished courses.
            (_, ProgressEvent::Record(p)) => Ok(Self::for_progress(p)),
        }
    }
}

/// Caller-supplied progress event, after presence checks.
#[derive(Debug, Clone, Default)]
pub struct ProgressInput {
    pub user_id: i64,
    pub course_id: i64,
    pub progress: i32,
    pub rating: Option<i32>,
    pub difficulty: Option<String>,
    pub learning_style: Option<String>,
    pub time_spent: Option<i64>,
    pub engagement_score: Option<f64>,
}

fn validate(input: ProgressInput) -> AppResult<ProgressUpdate> {
    if let Some(r) = input.rating {
        if !(MIN_RATING..=MAX_RATING).contains(&r) {
            return Err(AppError::invalid(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
    }
    if matches!(input.time_spent, Some(t) if t < 0) {
        return Err(AppError::invalid("timeSpent must not be negative"));
    }
    if matches!(input.engagement_score, Some(e) if !e.is_finite() || e < 0.0) {
        return Err(AppError::invalid(
            "engagementScore must be a non-negative number",
        ));
    }
    Ok(ProgressUpdate {
        user_id: input.user_id,
        course_id: input.course_id,
        progress: input.progress,
        rating: input.rating,
        difficulty: input.difficulty,
        learning_style: input.learning_style,
        time_spent: input.time_spent,
        engagement_score: input.engagement_score,
    })
}

/// Moves the enrollment to its next state and persists the interaction and the
/// learning profile together.
pub async fn record_progress(
    store: &dyn LearningStore,
    input: ProgressInput,
) -> AppResult<EnrollmentState> {
    let update = validate(input)?;
    let current = store.interaction(update.user_id, update.course_id).await?;
    let next = EnrollmentState::of(current.as_ref()).apply(ProgressEvent::Record(update.progress))?;

    let stored = store.apply_progress(&update).await?;
    debug!(
        user_id = stored.user_id,
        course_id = stored.course_id,
        progress = stored.progress,
        state = ?next,
        "progress recorded"
    );
    Ok(next)
}

pub async fn enroll(
    store: &dyn LearningStore,
    user_id: i64,
    course_id: i64,
) -> AppResult<Interaction> {
    let current = store.interaction(user_id, course_id).await?;
    EnrollmentState::of(current.as_ref()).apply(ProgressEvent::Enroll)?;

    let interaction = store.enroll(user_id, course_id).await?;
    info!(user_id, course_id, "course enrolled");
    Ok(interaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::seeded;

    #[test]
    fn enroll_only_from_not_enrolled() {
        assert_eq!(
            EnrollmentState::NotEnrolled.apply(ProgressEvent::Enroll).unwrap(),
            EnrollmentState::Enrolled
        );
        for state in [
            EnrollmentState::Enrolled,
            EnrollmentState::InProgress(30),
            EnrollmentState::Completed,
        ] {
            assert!(matches!(
                state.apply(ProgressEvent::Enroll),
                Err(AppError::Conflict(_))
            ));
        }
    }

    #[test]
    fn record_moves_by_progress_value() {
        let s = EnrollmentState::Enrolled;
        assert_eq!(s.apply(ProgressEvent::Record(0)).unwrap(), EnrollmentState::Enrolled);
        assert_eq!(
            s.apply(ProgressEvent::Record(45)).unwrap(),
            EnrollmentState::InProgress(45)
        );
        assert_eq!(
            s.apply(ProgressEvent::Record(100)).unwrap(),
            EnrollmentState::Completed
        );
    }

    #[test]
    fn completed_can_be_recorded_again() {
        let s = EnrollmentState::Completed;
        assert_eq!(
            s.apply(ProgressEvent::Record(100)).unwrap(),
            EnrollmentState::Completed
        );
        assert_eq!(
            s.apply(ProgressEvent::Record(60)).unwrap(),
            EnrollmentState::InProgress(60)
        );
    }

    #[test]
    fn record_rejects_out_of_range_and_unenrolled() {
        for p in [-1, 101, i32::MAX] {
            assert!(matches!(
                EnrollmentState::InProgress(10).apply(ProgressEvent::Record(p)),
                Err(AppError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            EnrollmentState::NotEnrolled.apply(ProgressEvent::Record(10)),
            Err(AppError::NotFound(_))
        ));
    }

    fn input(progress: i32) -> ProgressInput {
        ProgressInput {
            user_id: 42,
            course_id: 7,
            progress,
            rating: Some(5),
            difficulty: Some("medium".into()),
            learning_style: Some("visual".into()),
            time_spent: Some(300),
            engagement_score: Some(0.8),
        }
    }

    #[tokio::test]
    async fn completed_progress_shows_in_enrolled_listing() {
        let store = seeded();
        enroll(&store, 42, 7).await.unwrap();
        let state = record_progress(&store, input(100)).await.unwrap();
        assert_eq!(state, EnrollmentState::Completed);

        let listed = store.enrolled_courses(42).await.unwrap();
        assert_eq!(listed[0].course_id, 7);
        assert_eq!(listed[0].progress, 100);
    }

    #[tokio::test]
    async fn progress_without_enrollment_is_not_found_and_writes_nothing() {
        let store = seeded();
        let before = store.learning_profile(42).await.unwrap();
        let err = record_progress(&store, input(40)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.learning_profile(42).await.unwrap(), before);
    }

    #[tokio::test]
    async fn invalid_values_are_rejected_before_any_write() {
        let store = seeded();
        enroll(&store, 42, 7).await.unwrap();

        let bad_rating = ProgressInput { rating: Some(9), ..input(50) };
        let bad_time = ProgressInput { time_spent: Some(-5), ..input(50) };
        let bad_engagement = ProgressInput { engagement_score: Some(f64::NAN), ..input(50) };
        for bad in [bad_rating, bad_time, bad_engagement, input(150)] {
            assert!(matches!(
                record_progress(&store, bad).await,
                Err(AppError::InvalidArgument(_))
            ));
        }
        assert_eq!(store.interaction(42, 7).await.unwrap().unwrap().progress, 0);
    }

    #[tokio::test]
    async fn second_enrollment_conflicts() {
        let store = seeded();
        enroll(&store, 42, 7).await.unwrap();
        assert!(matches!(
            enroll(&store, 42, 7).await,
            Err(AppError::Conflict(_))
        ));
    }
}

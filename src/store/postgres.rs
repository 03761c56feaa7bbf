use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tracing::debug;

use super::{
    Course, EnrolledCourse, Interaction, InteractionFact, LearningProfile, LearningStore,
    NewUser, ProgressUpdate, User, DEFAULT_LEARNING_STYLE, INITIAL_RATING,
};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, age, gender, preference, \
                            area_of_interest, learning_goal, created_at";
const INTERACTION_COLUMNS: &str =
    "user_id, course_id, progress, rating, enrolled_at, completion_date";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn insert_default_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_data (user_id, learning_style)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_LEARNING_STYLE)
    .execute(&mut **tx)
    .await
    .context("insert default user_data")?;
    Ok(())
}

async fn exists_tx(
    tx: &mut Transaction<'_, Postgres>,
    sql: &str,
    id: i64,
) -> anyhow::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .with_context(|| format!("existence check: {sql}"))?;
    Ok(row.is_some())
}

#[async_trait]
impl LearningStore for PgStore {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, age, gender, preference,
                               area_of_interest, learning_goal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.age)
        .bind(&new_user.gender)
        .bind(&new_user.preference)
        .bind(&new_user.area_of_interest)
        .bind(&new_user.learning_goal)
        .fetch_one(&mut *tx)
        .await;

        let user = match inserted {
            Ok(u) => u,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AppError::Conflict("Email already registered".into()));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("insert user").into()),
        };

        insert_default_profile_tx(&mut tx, user.id).await?;
        tx.commit().await.context("commit tx")?;
        Ok(user)
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, course_name, category, difficulty, popularity,
                   course_description, youtube_link
              FROM courses
             ORDER BY popularity DESC, course_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list courses")?;
        Ok(rows)
    }

    async fn find_course(&self, course_id: i64) -> AppResult<Option<Course>> {
        let row = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, course_name, category, difficulty, popularity,
                   course_description, youtube_link
              FROM courses
             WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .context("find course")?;
        Ok(row)
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> AppResult<Interaction> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        if !exists_tx(&mut tx, "SELECT 1 FROM users WHERE id = $1", user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        if !exists_tx(&mut tx, "SELECT 1 FROM courses WHERE course_id = $1", course_id).await? {
            return Err(AppError::not_found("Course not found"));
        }

        let interaction = sqlx::query_as::<_, Interaction>(&format!(
            r#"
            INSERT INTO interactions (user_id, course_id, progress, rating)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING {INTERACTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(INITIAL_RATING)
        .fetch_optional(&mut *tx)
        .await
        .context("insert interaction")?
        .ok_or_else(|| AppError::Conflict("Already enrolled in this course".into()))?;

        insert_default_profile_tx(&mut tx, user_id).await?;
        tx.commit().await.context("commit tx")?;

        debug!(user_id, course_id, "interaction created");
        Ok(interaction)
    }

    async fn enrolled_courses(&self, user_id: i64) -> AppResult<Vec<EnrolledCourse>> {
        let rows = sqlx::query_as::<_, EnrolledCourse>(
            r#"
            SELECT c.course_id, c.course_name, c.youtube_link, i.progress
              FROM interactions i
              JOIN courses c ON i.course_id = c.course_id
             WHERE i.user_id = $1
             ORDER BY i.enrolled_at ASC, c.course_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("list enrolled courses")?;
        Ok(rows)
    }

    async fn interaction(&self, user_id: i64, course_id: i64) -> AppResult<Option<Interaction>> {
        let row = sqlx::query_as::<_, Interaction>(&format!(
            "SELECT {INTERACTION_COLUMNS} FROM interactions WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .context("find interaction")?;
        Ok(row)
    }

    async fn apply_progress(&self, update: &ProgressUpdate) -> AppResult<Interaction> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        // The UPDATE holds the row lock until commit, so writers on one pair serialize.
        let interaction = sqlx::query_as::<_, Interaction>(&format!(
            r#"
            UPDATE interactions
               SET progress = $3,
                   rating = COALESCE($4, rating),
                   completion_date = NOW()
             WHERE user_id = $1 AND course_id = $2
            RETURNING {INTERACTION_COLUMNS}
            "#
        ))
        .bind(update.user_id)
        .bind(update.course_id)
        .bind(update.progress)
        .bind(update.rating)
        .fetch_optional(&mut *tx)
        .await
        .context("update interaction")?
        .ok_or_else(|| AppError::not_found("Interaction not found"))?;

        let profile = sqlx::query(
            r#"
            UPDATE user_data
               SET difficulty = COALESCE($2, difficulty),
                   learning_style = COALESCE($3, learning_style),
                   time_spent = COALESCE($4, time_spent),
                   engagement_score = COALESCE($5, engagement_score),
                   last_updated = NOW()
             WHERE user_id = $1
            "#,
        )
        .bind(update.user_id)
        .bind(&update.difficulty)
        .bind(&update.learning_style)
        .bind(update.time_spent)
        .bind(update.engagement_score)
        .execute(&mut *tx)
        .await
        .context("update user_data")?;

        if profile.rows_affected() == 0 {
            // dropping `tx` rolls back the interaction update
            return Err(AppError::not_found("User data not found"));
        }

        tx.commit().await.context("commit tx")?;
        Ok(interaction)
    }

    async fn learning_profile(&self, user_id: i64) -> AppResult<Option<LearningProfile>> {
        let row = sqlx::query_as::<_, LearningProfile>(
            r#"
            SELECT user_id, difficulty, learning_style, time_spent, engagement_score, last_updated
              FROM user_data
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("find user_data")?;
        Ok(row)
    }

    async fn interaction_facts(&self, user_id: i64) -> AppResult<Vec<InteractionFact>> {
        let rows = sqlx::query_as::<_, InteractionFact>(
            r#"
            SELECT i.course_id, i.progress, i.rating, c.category
              FROM interactions i
              JOIN courses c ON i.course_id = c.course_id
             WHERE i.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load interaction facts")?;
        Ok(rows)
    }
}

use crate::config::{AppConfig, StoreBackend};
use crate::recommend::{HttpRecommender, Recommender};
use crate::store::{LearningStore, MemoryStore, PgStore};
use crate::store::Course;
use anyhow::Context;
use std::sync::Arc;

fn load_catalog(path: &str) -> anyhow::Result<Vec<Course>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing course catalog {path}"))
}

/// Everything a request needs, injected through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn LearningStore>,
    pub recommender: Arc<dyn Recommender>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing")?;
                let pg = PgStore::connect(url, config.database_max_connections).await?;
                if let Err(e) = sqlx::migrate!("./migrations").run(pg.pool()).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(pg) as Arc<dyn LearningStore>
            }
            StoreBackend::Memory => {
                tracing::warn!("using the in-memory store; data is lost on restart");
                let courses = match config.catalog_seed.as_deref() {
                    Some(path) => load_catalog(path)?,
                    None => Vec::new(),
                };
                tracing::info!(courses = courses.len(), "memory catalog seeded");
                Arc::new(MemoryStore::new().with_catalog(courses)) as Arc<dyn LearningStore>
            }
        };

        let recommender =
            Arc::new(HttpRecommender::new(&config.recommender)?) as Arc<dyn Recommender>;

        Ok(Self::from_parts(config, store, recommender))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn LearningStore>,
        recommender: Arc<dyn Recommender>,
    ) -> Self {
        Self {
            config,
            store,
            recommender,
        }
    }

    #[cfg(test)]
    pub fn fake(store: MemoryStore, recommender: Arc<dyn Recommender>) -> Self {
        use crate::config::{JwtConfig, RecommenderConfig};

        let config = Arc::new(AppConfig {
            store_backend: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            catalog_seed: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            recommender: RecommenderConfig {
                base_url: "http://recommender.invalid".into(),
                timeout_secs: 1,
            },
        });
        Self::from_parts(config, Arc::new(store), recommender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_parses() {
        let courses = load_catalog(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.sample.json"))
            .expect("sample catalog");
        assert_eq!(courses.len(), 3);
        assert_eq!(courses[0].course_name, "Rust Basics");
        assert_eq!(courses[1].youtube_link, None);
    }

    #[tokio::test]
    async fn seeded_memory_store_serves_the_catalog() {
        let store = MemoryStore::new().with_catalog(vec![Course {
            course_id: 5,
            course_name: "Typography".into(),
            category: Some("Design".into()),
            difficulty: None,
            popularity: 1.0,
            course_description: None,
            youtube_link: None,
        }]);
        let found = store.find_course(5).await.unwrap();
        assert_eq!(found.map(|c| c.course_name).as_deref(), Some("Typography"));
    }

    #[test]
    fn missing_catalog_is_an_error() {
        assert!(load_catalog("/nonexistent/catalog.json").is_err());
    }
}

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::dto::{parse_upstream, RecommendationItem};
use crate::{
    config::RecommenderConfig,
    error::{AppError, AppResult},
};

/// The external recommender: `(strategy, user) -> ranked courses`.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, strategy: &str, user_id: i64) -> AppResult<Vec<RecommendationItem>>;
}

/// Calls `GET {base}/recommend/{strategy}/{userId}`. Failures are reported once,
/// never retried.
#[derive(Clone)]
pub struct HttpRecommender {
    client: Client,
    base_url: Url,
}

impl HttpRecommender {
    pub fn new(config: &RecommenderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build recommender http client")?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("parse RECOMMENDER_URL {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("RECOMMENDER_URL must be an http(s) base url");
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, strategy: &str, user_id: i64) -> Url {
        let mut url = self.base_url.clone();
        let user = user_id.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            // segment encoding keeps the strategy tag opaque, e.g. "a/b" stays one segment
            segments
                .pop_if_empty()
                .extend(["recommend", strategy, user.as_str()]);
        }
        url
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn recommend(&self, strategy: &str, user_id: i64) -> AppResult<Vec<RecommendationItem>> {
        let url = self.endpoint(strategy, user_id);
        debug!(%url, "requesting recommendations");

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::UpstreamUnavailable(if e.is_timeout() {
                "recommender timed out".to_string()
            } else {
                format!("request failed: {e}")
            })
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(%status, strategy, user_id, "recommender returned an error status");
            return Err(AppError::UpstreamUnavailable(format!(
                "status {status}: {body}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("reading body failed: {e}")))?;
        parse_upstream(&body)
    }
}

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{analytics, auth, courses, progress, recommend};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(courses::router())
        .merge(progress::router())
        .merge(analytics::router())
        .merge(recommend::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;
    use serde_json::{json, Value};

    use super::*;
    use crate::recommend::client::fakes::{item, DownRecommender, StaticRecommender};
    use crate::recommend::Recommender;
    use crate::store::memory::fixtures::seeded;

    async fn spawn(recommender: Arc<dyn Recommender>) -> String {
        let app = build_app(AppState::fake(seeded(), recommender));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn spawn_default() -> String {
        spawn(Arc::new(StaticRecommender::new(vec![
            item(7, "Rust Basics"),
            item(8, "Async Rust"),
        ])))
        .await
    }

    #[tokio::test]
    async fn enroll_progress_then_analysis() {
        let base = spawn_default().await;
        let http = reqwest::Client::new();

        let res = http
            .post(format!("{base}/enroll"))
            .json(&json!({"userId": 42, "courseId": 7}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = http
            .post(format!("{base}/updateProgress"))
            .json(&json!({
                "userId": 42, "courseId": 7, "progress": 100, "rating": 5,
                "difficulty": "medium", "learningStyle": "visual",
                "timeSpent": 300, "engagementScore": 0.8
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], true);

        let enrolled: Value = http
            .get(format!("{base}/enrolled_courses?userId=42"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(enrolled[0]["course_id"], 7);
        assert_eq!(enrolled[0]["progress"], 100);
        assert_eq!(
            enrolled[0]["youtube_link"],
            "https://www.youtube.com/watch?v=course7"
        );

        let snap: Value = http
            .get(format!("{base}/user_details_with_comprehensive_analysis?userId=42"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snap["course_count"], 1);
        assert_eq!(snap["avg_progress"], 100.0);
        assert_eq!(snap["learning_style"], "visual");
        assert_eq!(snap["course_categories"][0]["category"], "Programming");
        assert_eq!(snap["course_categories"][0]["category_count"], 1);
    }

    #[tokio::test]
    async fn progress_without_enrollment_is_404() {
        let base = spawn_default().await;
        let res = reqwest::Client::new()
            .post(format!("{base}/updateProgress"))
            .json(&json!({"userId": 42, "courseId": 8, "progress": 10}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn progress_fields_posted_as_text_are_accepted() {
        let base = spawn_default().await;
        let http = reqwest::Client::new();
        http.post(format!("{base}/enroll"))
            .json(&json!({"userId": "42", "courseId": "8"}))
            .send()
            .await
            .unwrap();

        let res = http
            .post(format!("{base}/updateProgress"))
            .json(&json!({
                "userId": "42", "courseId": "8", "progress": "60", "rating": "4",
                "timeSpent": "120", "engagementScore": "0.8"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let snap: Value = http
            .get(format!("{base}/user_details_with_comprehensive_analysis?userId=42"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snap["avg_rating"], 4.0);
        assert_eq!(snap["engagement_score"], 0.8);
        assert_eq!(snap["time_spent"], 120);

        let res = http
            .post(format!("{base}/updateProgress"))
            .json(&json!({"userId": 42, "courseId": 8, "progress": 60, "rating": "great"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_fields_are_400() {
        let base = spawn_default().await;
        let http = reqwest::Client::new();

        let res = http
            .post(format!("{base}/enroll"))
            .json(&json!({"userId": 42}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = http
            .post(format!("{base}/updateProgress"))
            .json(&json!({"courseId": 7, "progress": 10}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = http
            .get(format!("{base}/enrolled_courses"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = http
            .get(format!("{base}/enrolled_courses?userId=abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_enroll_is_409() {
        let base = spawn_default().await;
        let http = reqwest::Client::new();
        for expected in [StatusCode::OK, StatusCode::CONFLICT] {
            let res = http
                .post(format!("{base}/enroll"))
                .json(&json!({"userId": "42", "courseId": "9"}))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), expected);
        }
    }

    #[tokio::test]
    async fn recommendations_keep_tuple_shape() {
        let base = spawn_default().await;
        let body: Value = reqwest::get(format!("{base}/recommend/hybrid/42"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["recommendations"][0][0], 7);
        assert_eq!(body["recommendations"][0][1], "Rust Basics");
        assert_eq!(body["recommendations"][1].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn empty_recommendations_are_an_empty_list() {
        let base = spawn(Arc::new(StaticRecommender::new(vec![]))).await;
        let res = reqwest::get(format!("{base}/recommend/hybrid/42")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"recommendations": []}));
    }

    #[tokio::test]
    async fn upstream_failure_is_502_without_detail() {
        let base = spawn(Arc::new(DownRecommender)).await;
        let res = reqwest::get(format!("{base}/recommend/hybrid/42")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "upstream_unavailable");
        assert!(!body["message"].as_str().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn dashboard_without_recommender_still_lists_enrollments() {
        let base = spawn(Arc::new(DownRecommender)).await;
        let http = reqwest::Client::new();
        http.post(format!("{base}/enroll"))
            .json(&json!({"userId": 42, "courseId": 7}))
            .send()
            .await
            .unwrap();

        let res = http
            .get(format!("{base}/dashboard?userId=42"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let dash: Value = res.json().await.unwrap();
        assert_eq!(dash["enrolled_courses"][0]["course_id"], 7);
        assert_eq!(dash["recommendations"], json!([]));
    }

    #[tokio::test]
    async fn dashboard_marks_enrolled_recommendations() {
        let base = spawn_default().await;
        let http = reqwest::Client::new();
        http.post(format!("{base}/enroll"))
            .json(&json!({"userId": 42, "courseId": 7}))
            .send()
            .await
            .unwrap();

        let dash: Value = http
            .get(format!("{base}/dashboard?userId=42"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(dash["recommendations"][0]["course_id"], 7);
        assert_eq!(dash["recommendations"][0]["action"], "continue");
        assert_eq!(dash["recommendations"][1]["action"], "enroll");

        let dash: Value = http
            .post(format!("{base}/dashboard/enroll"))
            .json(&json!({"userId": 42, "courseId": 8}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(dash["enrolled_courses"].as_array().unwrap().len(), 2);
        assert_eq!(dash["recommendations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_login_me() {
        let base = spawn_default().await;
        let http = reqwest::Client::new();

        let res = http
            .post(format!("{base}/auth/register"))
            .json(&json!({
                "username": "grace", "email": " Grace@Example.com ", "password": "hopper-1906",
                "age": 30, "area_of_interest": "Compilers"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = http
            .post(format!("{base}/auth/login"))
            .json(&json!({"email": "grace@example.com", "password": "hopper-1906"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let auth: Value = res.json().await.unwrap();
        let token = auth["access_token"].as_str().unwrap().to_string();

        let me: Value = http
            .get(format!("{base}/me"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(me["email"], "grace@example.com");

        // a freshly registered learner has a profile row, so progress can be recorded
        let user_id = me["id"].as_i64().unwrap();
        http.post(format!("{base}/enroll"))
            .json(&json!({"userId": user_id, "courseId": 8}))
            .send()
            .await
            .unwrap();
        let res = http
            .post(format!("{base}/updateProgress"))
            .json(&json!({"userId": user_id, "courseId": 8, "progress": 40}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = http
            .post(format!("{base}/auth/login"))
            .json(&json!({"email": "grace@example.com", "password": "wrong-password"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

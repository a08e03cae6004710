use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{context::AppContext, handlers};

/// Builds the HTTP router over a shared context.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/status", get(handlers::status))
        .route("/predict", post(handlers::predict))
        .route("/train", post(handlers::train))
        .route("/bayesian-info", get(handlers::bayesian_info))
        .route("/samples", get(handlers::samples))
        .route("/stats", get(handlers::stats))
        .route("/search", get(handlers::search))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use shared_logging::Telemetry;
    use std::{fs, path::Path};
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    struct Fixture {
        _dir: TempDir,
        ctx: Arc<AppContext>,
    }

    impl Fixture {
        fn new(with_dataset: bool) -> Self {
            let dir = tempdir().unwrap();
            if with_dataset {
                write_dataset(&dir.path().join("sms.txt"));
            }
            let config = ServiceConfig {
                dataset_path: dir.path().join("sms.txt"),
                model_dir: dir.path().join("models"),
                ..ServiceConfig::default()
            };
            let ctx = Arc::new(AppContext::new(config, Telemetry::console("test")));
            Self { _dir: dir, ctx }
        }

        async fn call(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if body.is_some() {
                request = request.header(header::CONTENT_TYPE, "application/json");
            }
            let request = request
                .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
                .unwrap();
            let response = router(Arc::clone(&self.ctx)).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        }
    }

    fn write_dataset(path: &Path) {
        let mut rows = "ham\tHello friend\nspam\tWIN FREE CASH NOW!!!\n".repeat(10);
        rows.push_str("ham\tSee you at lunch\nspam\tClaim your prize at www.win.example now\n");
        fs::write(path, rows).unwrap();
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let fixture = Fixture::new(false);
        let (status, body) = fixture.call(Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["endpoints"]["/predict"].is_string());
    }

    #[tokio::test]
    async fn predict_before_training_is_rejected() {
        let fixture = Fixture::new(true);
        let (status, body) = fixture
            .call(Method::POST, "/predict", Some(r#"{"message":"hi"}"#))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Model not trained yet. Please train the model first.");
    }

    #[tokio::test]
    async fn train_then_predict_round_trip() {
        let fixture = Fixture::new(true);
        let (status, body) = fixture.call(Method::GET, "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_trained"], false);

        let (status, body) = fixture.call(Method::POST, "/train", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Model trained successfully!");
        assert_eq!(body["model_saved"], true);
        let accuracy = body["accuracy"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&accuracy));

        let (_, body) = fixture.call(Method::GET, "/status", None).await;
        assert_eq!(body["model_trained"], true);
        assert_eq!(body["data_loaded"], true);
        assert_eq!(body["ready_for_prediction"], true);

        let (status, body) = fixture
            .call(Method::POST, "/predict", Some(r#"{"message":"  WIN free CASH now  "}"#))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "WIN free CASH now");
        assert_eq!(body["prediction"], "spam");
        assert_eq!(body["is_spam"], true);
        let spam = body["confidence"]["spam"].as_f64().unwrap();
        let ham = body["confidence"]["ham"].as_f64().unwrap();
        assert!((spam + ham - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn predict_validates_body() {
        let fixture = Fixture::new(true);
        fixture.ctx.train().await.unwrap();

        let (status, body) = fixture.call(Method::POST, "/predict", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Please provide a 'message' field in the request body");

        let (status, body) = fixture
            .call(Method::POST, "/predict", Some(r#"{"message":"   "}"#))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message cannot be empty");

        let (status, _) = fixture.call(Method::POST, "/predict", Some("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = fixture
            .call(Method::POST, "/predict", Some(r#"{"message": 42}"#))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn train_without_dataset_reports_path() {
        let fixture = Fixture::new(false);
        let (status, body) = fixture.call(Method::POST, "/train", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Training data not found at"));
    }

    #[tokio::test]
    async fn samples_load_dataset_lazily() {
        let fixture = Fixture::new(true);
        assert!(!fixture.ctx.data_loaded());
        let (status, body) = fixture.call(Method::GET, "/samples?count=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["samples"]["spam_samples"].as_array().unwrap().len(), 2);
        assert_eq!(body["samples"]["ham_samples"].as_array().unwrap().len(), 2);
        assert!(fixture.ctx.data_loaded());

        let (_, body) = fixture.call(Method::GET, "/samples?count=abc", None).await;
        assert_eq!(body["samples"]["ham_samples"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn dataset_endpoints_without_data_fail() {
        let fixture = Fixture::new(false);
        for uri in ["/samples", "/stats", "/search?keyword=win"] {
            let (status, body) = fixture.call(Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Dataset not loaded and data file not found");
        }
    }

    #[tokio::test]
    async fn malformed_dataset_is_bad_request() {
        let fixture = Fixture::new(false);
        fs::write(&fixture.ctx.config().dataset_path, "ham\thello\nmaybe\tsomething\n").unwrap();
        for uri in ["/samples?count=2", "/stats", "/search?keyword=hello"] {
            let (status, body) = fixture.call(Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("malformed dataset line 2"));
            assert!(body.get("detail").is_none());
        }
        assert!(!fixture.ctx.data_loaded());
    }

    #[tokio::test]
    async fn stats_and_search() {
        let fixture = Fixture::new(true);
        let (status, body) = fixture.call(Method::GET, "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_messages"], 22);
        assert_eq!(body["stats"]["spam_count"], 11);

        let (status, body) = fixture
            .call(Method::GET, "/search?keyword=PRIZE&limit=3", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["label"], "spam");

        let (status, _) = fixture.call(Method::GET, "/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bayesian_info_is_static() {
        let fixture = Fixture::new(false);
        let (status, body) = fixture.call(Method::GET, "/bayesian-info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bayesian_info"]["algorithm"], "Multinomial Naive Bayes");
        let steps = body["bayesian_info"]["preprocessing"].as_array().unwrap();
        assert!(steps.iter().any(|step| step.as_str() == Some("Porter stemming")));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let fixture = Fixture::new(false);
        let (status, body) = fixture.call(Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let fixture = Fixture::new(false);
        for (method, uri) in [(Method::GET, "/predict"), (Method::GET, "/train"), (Method::POST, "/stats")] {
            let (status, body) = fixture.call(method, uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Method not allowed");
        }
    }
}

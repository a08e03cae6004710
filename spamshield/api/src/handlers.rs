use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde_json::{json, Value};
use spamshield_nlp::{DatasetError, DatasetStats};

use crate::{context::AppContext, error::ApiError};

/// Result type of every handler.
pub type ApiResult = Result<Json<Value>, ApiError>;

const DEFAULT_SAMPLE_COUNT: usize = 5;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const MISSING_MESSAGE: &str = "Please provide a 'message' field in the request body";
const NO_DATASET: &str = "Dataset not loaded and data file not found";

/// `GET /`: service description.
pub async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Spam Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/predict": "POST - Predict if a message is spam",
            "/train": "POST - Train the model",
            "/status": "GET - Get model and data status",
            "/samples": "GET - Get sample messages",
            "/stats": "GET - Get dataset statistics",
            "/search": "GET - Search messages by keyword",
            "/bayesian-info": "GET - Get Bayesian network information",
        }
    }))
}

/// `GET /status`: model and dataset readiness.
pub async fn status(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let model_trained = ctx.model_trained();
    Json(json!({
        "success": true,
        "model_trained": model_trained,
        "data_loaded": ctx.data_loaded(),
        "ready_for_prediction": model_trained,
    }))
}

/// `POST /predict`: classifies `{"message": ...}`.
pub async fn predict(
    State(ctx): State<Arc<AppContext>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let classifier = ctx.classifier().ok_or(ApiError::NotTrained)?;
    let Ok(Json(body)) = body else {
        return Err(ApiError::Validation(MISSING_MESSAGE.into()));
    };
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Validation(MISSING_MESSAGE.into()))?
        .trim();
    if message.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".into()));
    }
    let result = classifier
        .predict(message)
        .map_err(|err| ApiError::internal("Prediction failed", &err))?;
    Ok(Json(json!({
        "success": true,
        "message": message,
        "prediction": result.prediction,
        "is_spam": result.is_spam,
        "confidence": result.confidence,
    })))
}

/// `POST /train`: retrains from the configured dataset and persists the model.
pub async fn train(State(ctx): State<Arc<AppContext>>) -> ApiResult {
    let report = ctx.train().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Model trained successfully!",
        "accuracy": report.accuracy,
        "model_saved": true,
        "report": report,
    })))
}

/// `GET /bayesian-info`: static description of the model.
pub async fn bayesian_info() -> Json<Value> {
    Json(json!({
        "success": true,
        "bayesian_info": {
            "algorithm": "Multinomial Naive Bayes",
            "assumption": "Features are conditionally independent given the class",
            "formula": "P(Spam|Words) = P(Words|Spam) × P(Spam) / P(Words)",
            "features": "TF-IDF weighted word frequencies",
            "preprocessing": [
                "Lowercase conversion",
                "URL and email removal",
                "Stop word removal",
                "Porter stemming",
                "Special character filtering",
            ],
            "advantages": [
                "Fast training and prediction",
                "Works well with small datasets",
                "Handles irrelevant features well",
                "Provides probability estimates",
            ],
            "network_structure": {
                "class_node": "Spam/Ham classification",
                "feature_nodes": "Individual words/tokens",
                "independence_assumption": "Words are independent given the class",
            }
        }
    }))
}

/// `GET /samples?count=N`: first `N` messages of each class.
pub async fn samples(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let stats = dataset(&ctx, "Failed to get samples").await?;
    let count = parse_or(params.get("count"), DEFAULT_SAMPLE_COUNT);
    Ok(Json(json!({
        "success": true,
        "samples": stats.samples(count),
    })))
}

/// `GET /stats`: dataset summary.
pub async fn stats(State(ctx): State<Arc<AppContext>>) -> ApiResult {
    let stats = dataset(&ctx, "Failed to get statistics").await?;
    Ok(Json(json!({
        "success": true,
        "stats": stats.summary(),
    })))
}

/// `GET /search?keyword=K&limit=L`: case-insensitive message search.
pub async fn search(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let keyword = params
        .get("keyword")
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::Validation("Please provide a 'keyword' query parameter".into()))?;
    let stats = dataset(&ctx, "Search failed").await?;
    let limit = parse_or(params.get("limit"), DEFAULT_SEARCH_LIMIT);
    Ok(Json(json!({
        "success": true,
        "keyword": keyword,
        "results": stats.search(keyword, limit),
    })))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for known routes hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn dataset(ctx: &AppContext, failure: &str) -> Result<Arc<DatasetStats>, ApiError> {
    ctx.dataset_or_load().await.map_err(|err| match err {
        DatasetError::NotFound(_) => ApiError::Data(NO_DATASET.into()),
        other => ApiError::Data(format!("{failure}: {other}")),
    })
}

fn parse_or(raw: Option<&String>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}

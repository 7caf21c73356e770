use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::batch::{
    count_error, count_outcome, ensure_metrics_described, filter_record, FilteredRecord, IssueReport,
};
use crate::classify::{ClassificationResult, ClassifierHandle, RejectReason};
use crate::error::Error;
use crate::sanitize::sanitize;

#[derive(Clone)]
pub struct AppState {
    pub classifier: ClassifierHandle,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/classify", post(classify))
        .route("/sanitize", post(sanitize_text))
        .route("/filter", post(filter_one))
        .route("/filter/batch", post(filter_batch))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Shorthand for tests and embedding: router over a bare handle.
pub fn router(classifier: ClassifierHandle) -> Router {
    create_router(AppState { classifier })
}

#[derive(Deserialize)]
struct SanitizeReq {
    text: String,
}

#[derive(Serialize)]
struct SanitizeResp {
    text: String,
}

#[derive(Serialize)]
struct FilterResp {
    accepted: bool,
    reason: Option<RejectReason>,
    record: Value,
}

impl From<FilteredRecord> for FilterResp {
    fn from(f: FilteredRecord) -> Self {
        Self {
            accepted: f.verdict.accepted,
            reason: f.verdict.reason,
            record: f.record,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum BatchItemOut {
    Filtered(FilterResp),
    Failed { error: String },
}

#[derive(Serialize)]
struct BatchResp {
    results: Vec<BatchItemOut>,
    report: IssueReport,
}

struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::NotAnObject(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn classify(
    State(state): State<AppState>,
    Json(record): Json<Value>,
) -> Json<ClassificationResult> {
    Json(state.classifier.current().classify_value(&record))
}

async fn sanitize_text(Json(body): Json<SanitizeReq>) -> Json<SanitizeResp> {
    Json(SanitizeResp {
        text: sanitize(&body.text),
    })
}

async fn filter_one(
    State(state): State<AppState>,
    Json(record): Json<Value>,
) -> Result<Json<FilterResp>, ApiError> {
    ensure_metrics_described();
    let classifier = state.classifier.current();
    match filter_record(&classifier, record) {
        Ok(filtered) => {
            count_outcome(&filtered.verdict);
            Ok(Json(filtered.into()))
        }
        Err(e) => {
            count_error();
            Err(ApiError(e))
        }
    }
}

async fn filter_batch(
    State(state): State<AppState>,
    Json(records): Json<Vec<Value>>,
) -> Json<BatchResp> {
    ensure_metrics_described();
    let classifier = state.classifier.current();
    let mut report = IssueReport::default();

    let results = records
        .into_iter()
        .map(|record| match filter_record(&classifier, record) {
            Ok(filtered) => {
                count_outcome(&filtered.verdict);
                match filtered.verdict.reason {
                    Some(reason) => report.record_rejected(reason),
                    None => report.record_accepted(),
                }
                BatchItemOut::Filtered(filtered.into())
            }
            Err(e) => {
                count_error();
                report.record_error();
                BatchItemOut::Failed {
                    error: e.to_string(),
                }
            }
        })
        .collect();

    Json(BatchResp { results, report })
}

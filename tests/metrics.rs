// tests/metrics.rs
//
// Own test binary: installs the process-wide Prometheus recorder exactly once.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use hsa_filter::batch::{self, OutputLayout};
use hsa_filter::metrics::Metrics;
use hsa_filter::{router, Classifier, ClassifierConfig, ClassifierHandle};
use serde_json::json;
use tempfile::tempdir;
use tower::ServiceExt as _;

#[tokio::test]
async fn metrics_endpoint_exposes_filter_counters() {
    let metrics = Metrics::init(&ClassifierConfig::default()).expect("install recorder");

    let dir = tempdir().unwrap();
    let issue = dir.path().join("classified/1977/08/14");
    std::fs::create_dir_all(&issue).unwrap();
    std::fs::write(
        issue.join("ad.json"),
        json!({ "headline": "Sale", "body": "x", "section": "ad" }).to_string(),
    )
    .unwrap();
    batch::process_all_issues(&Classifier::with_defaults(), &OutputLayout::new(dir.path()))
        .unwrap();

    // Records filtered over HTTP are counted too
    let api = router(ClassifierHandle::new(Classifier::with_defaults()));
    let req = Request::builder()
        .method("POST")
        .uri("/filter/batch")
        .header("content-type", "application/json")
        .body(Body::from(r#"[{"headline":"Sale","body":"x","section":"classified"}, 42]"#))
        .unwrap();
    let resp = api.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = metrics.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("filter_records_total"), "{text}");
    assert!(text.contains("outcome=\"rejected\""), "{text}");
    assert!(text.contains("outcome=\"error\""), "{text}");
    assert!(text.contains("filter_rejections_total"), "{text}");
    assert!(text.contains("filter_min_body_chars"), "{text}");

    // A second recorder cannot be installed
    assert!(Metrics::init(&ClassifierConfig::default()).is_err());
}

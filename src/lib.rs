// src/lib.rs
// Public library surface for the CLI, the HTTP API and integration tests.

pub mod api;
pub mod article;
pub mod batch;
pub mod classify;
pub mod debug;
pub mod error;
pub mod metrics;
pub mod sanitize;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::article::{ArticleCandidate, Section};
pub use crate::batch::{filter_record, FilteredRecord, IssueReport, OutputLayout, RunReport};
pub use crate::classify::{
    ClassificationResult, Classifier, ClassifierConfig, ClassifierHandle, RejectReason,
};
pub use crate::error::{Error, Result};
pub use crate::sanitize::sanitize;

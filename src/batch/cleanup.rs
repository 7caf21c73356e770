// src/batch/cleanup.rs
//! Aggressive cleanup of an already-accepted (`hsa-ready`) tree.
//!
//! Every record is reclassified with strict section exclusion. Rejects are
//! moved to `rejected/cleaned/YYYY/MM/DD/` (or `rejected/cleaned/unknown/`
//! when the record has no usable `timestamp`) and removed from the accepted tree.

use super::{
    count_error, count_outcome, ensure_metrics_described, read_record, tag_rejected,
    write_record, IssueReport, OutputLayout,
};
use crate::classify::{ClassificationResult, Classifier};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use jwalk::WalkDir;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CLEANED_DIR: &str = "cleaned";
const UNKNOWN_DATE_DIR: &str = "unknown";

/// Sub-path for a record's `timestamp` (`YYYY-MM-DD`, optionally followed by a time).
pub fn dated_subdir(timestamp: Option<&str>) -> PathBuf {
    timestamp
        .and_then(|ts| ts.trim().get(..10))
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| {
            PathBuf::from(d.format("%Y").to_string())
                .join(d.format("%m").to_string())
                .join(d.format("%d").to_string())
        })
        .unwrap_or_else(|| PathBuf::from(UNKNOWN_DATE_DIR))
}

/// Scan `hsa-ready/` recursively. With `dry_run` nothing is moved; the report
/// still says what would have been.
pub fn cleanup_accepted(
    classifier: &Classifier,
    layout: &OutputLayout,
    dry_run: bool,
) -> Result<IssueReport> {
    ensure_metrics_described();
    let strict = classifier.with_strict_sections();
    let root = layout.hsa_ready();
    let cleaned_root = layout.rejected().join(CLEANED_DIR);

    let mut report = IssueReport::default();
    if !root.is_dir() {
        warn!(dir = %root.display(), "nothing to clean");
        return Ok(report);
    }

    for entry in WalkDir::new(&root).sort(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("json")
        {
            continue;
        }

        match clean_one(&strict, &path, &cleaned_root, dry_run) {
            Ok(verdict) => {
                count_outcome(&verdict);
                match verdict.reason {
                    Some(reason) => report.record_rejected(reason),
                    None => report.record_accepted(),
                }
            }
            Err(e) => {
                warn!(error = %e, file = %path.display(), "processing error");
                count_error();
                report.record_error();
            }
        }
    }

    info!(
        scanned = report.total,
        removed = report.rejected,
        errors = report.processing_errors,
        dry_run,
        "cleanup finished"
    );
    Ok(report)
}

fn clean_one(
    strict: &Classifier,
    path: &Path,
    cleaned_root: &Path,
    dry_run: bool,
) -> Result<ClassificationResult> {
    let mut record = read_record(path)?;
    if !record.is_object() {
        return Err(Error::NotAnObject(path.display().to_string()));
    }

    let verdict = strict.classify_value(&record);
    let Some(reason) = verdict.reason else {
        return Ok(verdict);
    };
    if dry_run {
        return Ok(verdict);
    }

    let target_dir =
        cleaned_root.join(dated_subdir(record.get("timestamp").and_then(Value::as_str)));
    if let Some(map) = record.as_object_mut() {
        tag_rejected(map, reason.as_str());
    }
    fs::create_dir_all(&target_dir)?;
    let name = path.file_name().unwrap_or_default();
    write_record(&target_dir.join(name), &record)?;
    fs::remove_file(path)?;
    Ok(verdict)
}

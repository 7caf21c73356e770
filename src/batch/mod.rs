// src/batch/mod.rs
//! Issue-directory batch processing around the classifier and sanitizer.
//!
//! Layout under an output root:
//!
//! ```text
//! classified/YYYY/MM/DD/*.json   input records
//! hsa-ready/YYYY/MM/DD/          accepted, body sanitized
//! rejected/YYYY/MM/DD/           rejected, skip_hsa + skip_hsa_reason added
//! index.json                     per-issue counts
//! ```

pub mod cleanup;
pub mod report;

use crate::classify::{ClassificationResult, Classifier};
use crate::error::{Error, Result};
use crate::sanitize::sanitize;
use chrono::{Datelike, NaiveDate};
use jwalk::WalkDir;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub use report::{IssueReport, RunReport};

pub const CLASSIFIED_DIR: &str = "classified";
pub const HSA_READY_DIR: &str = "hsa-ready";
pub const REJECTED_DIR: &str = "rejected";
pub const INDEX_FILE: &str = "index.json";

pub const SKIP_FLAG_FIELD: &str = "skip_hsa";
pub const SKIP_REASON_FIELD: &str = "skip_hsa_reason";

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "filter_records_total",
            "Records processed, labelled by outcome (accepted/rejected/error)."
        );
        describe_counter!(
            "filter_rejections_total",
            "Rejected records, labelled by rejection reason."
        );
        describe_histogram!("filter_issue_ms", "Issue processing time in milliseconds.");
        describe_gauge!(
            "filter_last_run_ts",
            "Unix ts when an issue was last processed."
        );
    });
}

pub(crate) fn count_outcome(verdict: &ClassificationResult) {
    match verdict.reason {
        Some(reason) => {
            counter!("filter_records_total", "outcome" => "rejected").increment(1);
            counter!("filter_rejections_total", "reason" => reason.as_str()).increment(1);
        }
        None => counter!("filter_records_total", "outcome" => "accepted").increment(1),
    }
}

pub(crate) fn count_error() {
    counter!("filter_records_total", "outcome" => "error").increment(1);
}

/// Dated newspaper edition; maps to a `YYYY/MM/DD` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueDate(NaiveDate);

impl IssueDate {
    /// Parse `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| Error::Config(format!("invalid issue date `{s}`: {e}")))
    }

    pub fn from_components(year: &str, month: &str, day: &str) -> Option<Self> {
        let y = year.parse::<i32>().ok()?;
        let m = month.parse::<u32>().ok()?;
        let d = day.parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(y, m, d).map(Self)
    }

    pub fn rel_path(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.0.year()))
            .join(format!("{:02}", self.0.month()))
            .join(format!("{:02}", self.0.day()))
    }
}

impl fmt::Display for IssueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Directory conventions under one output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn classified(&self) -> PathBuf {
        self.root.join(CLASSIFIED_DIR)
    }

    pub fn hsa_ready(&self) -> PathBuf {
        self.root.join(HSA_READY_DIR)
    }

    pub fn rejected(&self) -> PathBuf {
        self.root.join(REJECTED_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }
}

/// A record after classification: tagged if rejected, body sanitized if accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRecord {
    pub verdict: ClassificationResult,
    pub record: Value,
}

impl FilteredRecord {
    pub fn accepted(&self) -> bool {
        self.verdict.accepted
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Mark a record as skipped for HSA with the given reason label.
pub(crate) fn tag_rejected(map: &mut Map<String, Value>, reason: &str) {
    map.insert(SKIP_FLAG_FIELD.to_string(), Value::Bool(true));
    map.insert(SKIP_REASON_FIELD.to_string(), Value::String(reason.to_string()));
}

/// Classify one record and apply the accept/reject transformation.
/// Fields other than `body`, `skip_hsa` and `skip_hsa_reason` are left untouched.
pub fn filter_record(classifier: &Classifier, mut record: Value) -> Result<FilteredRecord> {
    if !record.is_object() {
        return Err(Error::NotAnObject(json_kind(&record).to_string()));
    }

    let verdict = classifier.classify_value(&record);
    if let Some(map) = record.as_object_mut() {
        match verdict.reason {
            Some(reason) => tag_rejected(map, reason.as_str()),
            None => {
                if let Some(Value::String(body)) = map.get_mut("body") {
                    *body = sanitize(body);
                }
            }
        }
    }

    Ok(FilteredRecord { verdict, record })
}

pub(crate) fn read_record(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) fn write_record(path: &Path, record: &Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(record)?)?;
    Ok(())
}

fn is_json_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("json")
}

/// JSON files directly inside `dir`, sorted by path.
fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_json_file(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Process every record of one issue. Per-file failures are counted as
/// processing errors; only output directory creation aborts the issue.
pub fn process_issue(
    classifier: &Classifier,
    layout: &OutputLayout,
    issue: IssueDate,
) -> Result<IssueReport> {
    ensure_metrics_described();
    let started = Instant::now();

    let source_dir = layout.classified().join(issue.rel_path());
    let accepted_dir = layout.hsa_ready().join(issue.rel_path());
    let rejected_dir = layout.rejected().join(issue.rel_path());
    fs::create_dir_all(&accepted_dir)?;
    fs::create_dir_all(&rejected_dir)?;

    let mut report = IssueReport::default();
    if !source_dir.is_dir() {
        warn!(issue = %issue, dir = %source_dir.display(), "issue directory missing");
        return Ok(report);
    }

    for path in list_json_files(&source_dir)? {
        let outcome = read_record(&path)
            .and_then(|record| filter_record(classifier, record))
            .and_then(|filtered| {
                let dir = if filtered.accepted() {
                    &accepted_dir
                } else {
                    &rejected_dir
                };
                let name = path.file_name().unwrap_or_default();
                write_record(&dir.join(name), &filtered.record)?;
                Ok(filtered.verdict)
            });

        match outcome {
            Ok(verdict) => {
                count_outcome(&verdict);
                match verdict.reason {
                    Some(reason) => {
                        debug!(file = %path.display(), %reason, "rejected");
                        report.record_rejected(reason);
                    }
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

    histogram!("filter_issue_ms").record(started.elapsed().as_secs_f64() * 1000.0);
    gauge!("filter_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    info!(
        issue = %issue,
        total = report.total,
        accepted = report.accepted,
        rejected = report.rejected,
        errors = report.processing_errors,
        "issue processed"
    );
    Ok(report)
}

/// Every `YYYY/MM/DD` directory under `classified/`, in date order.
/// Directories that don't form a valid date are skipped.
pub fn discover_issues(layout: &OutputLayout) -> Result<Vec<IssueDate>> {
    let root = layout.classified();
    if !root.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input directory {} not found", root.display()),
        )));
    }

    let mut issues = Vec::new();
    for entry in WalkDir::new(&root).min_depth(3).max_depth(3).sort(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let parts: Vec<String> = path
            .strip_prefix(&root)
            .unwrap_or(&path)
            .iter()
            .map(|c| c.to_string_lossy().into_owned())
            .collect();
        match parts.as_slice() {
            [y, m, d] => match IssueDate::from_components(y, m, d) {
                Some(issue) => issues.push(issue),
                None => debug!(dir = %path.display(), "not an issue directory"),
            },
            _ => debug!(dir = %path.display(), "unexpected depth"),
        }
    }
    issues.sort();
    Ok(issues)
}

/// Record an issue's counts in `index.json`, keeping every other entry/field.
pub fn update_index(index_path: &Path, issue: IssueDate, report: &IssueReport) -> Result<()> {
    let mut index = if index_path.exists() {
        match read_record(index_path)? {
            Value::Object(map) => map,
            other => return Err(Error::NotAnObject(json_kind(&other).to_string())),
        }
    } else {
        Map::new()
    };

    let entry = index
        .entry(issue.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Some(obj) = entry.as_object_mut() {
        obj.insert("hsa_ready_count".into(), report.accepted.into());
        obj.insert("rejected_count".into(), report.rejected.into());
        obj.insert(
            "processing_error_count".into(),
            report.processing_errors.into(),
        );
    }

    if let Some(parent) = index_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_record(index_path, &Value::Object(index))
}

/// Process one issue and record it in the index.
pub fn finalize_issue(
    classifier: &Classifier,
    layout: &OutputLayout,
    issue: IssueDate,
) -> Result<IssueReport> {
    let report = process_issue(classifier, layout, issue)?;
    update_index(&layout.index_path(), issue, &report)?;
    Ok(report)
}

/// Process every discovered issue, updating the index as it goes.
pub fn process_all_issues(classifier: &Classifier, layout: &OutputLayout) -> Result<RunReport> {
    let mut run = RunReport::new();
    for issue in discover_issues(layout)? {
        info!(issue = %issue, "processing issue");
        let report = finalize_issue(classifier, layout, issue)?;
        run.add_issue(issue.to_string(), report);
    }
    Ok(run)
}

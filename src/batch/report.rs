// src/batch/report.rs
//! Counters for one issue (or a whole run) and their text/JSON renderings.

use crate::classify::RejectReason;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Outcome counts for a batch of records.
///
/// `processing_errors` counts records that could not be read or written; they
/// are neither accepted nor rejected and never appear in `rejection_reasons`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub processing_errors: usize,
    pub rejection_reasons: BTreeMap<String, usize>,
}

impl IssueReport {
    pub fn record_accepted(&mut self) {
        self.total += 1;
        self.accepted += 1;
    }

    pub fn record_rejected(&mut self, reason: RejectReason) {
        self.total += 1;
        self.rejected += 1;
        *self
            .rejection_reasons
            .entry(reason.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn record_error(&mut self) {
        self.total += 1;
        self.processing_errors += 1;
    }

    pub fn merge(&mut self, other: &IssueReport) {
        self.total += other.total;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.processing_errors += other.processing_errors;
        for (reason, n) in &other.rejection_reasons {
            *self.rejection_reasons.entry(reason.clone()).or_insert(0) += n;
        }
    }

    /// Reasons by descending count, ties broken by label.
    pub fn sorted_reasons(&self) -> Vec<(&str, usize)> {
        let mut v: Vec<(&str, usize)> = self
            .rejection_reasons
            .iter()
            .map(|(k, n)| (k.as_str(), *n))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        v
    }

    /// Accepted share of classified records in percent (errors excluded).
    pub fn acceptance_pct(&self) -> f64 {
        let classified = self.accepted + self.rejected;
        if classified == 0 {
            return 0.0;
        }
        (self.accepted as f64 / classified as f64 * 10_000.0).round() / 100.0
    }

    pub fn render_text(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "====== {title} ======");
        let _ = writeln!(out, "Total articles: {}", self.total);
        let _ = writeln!(
            out,
            "Usable for HSA: {} ({:.2}%)",
            self.accepted,
            self.acceptance_pct()
        );
        let _ = writeln!(out, "Rejected: {}", self.rejected);
        if self.processing_errors > 0 {
            let _ = writeln!(out, "Processing errors: {}", self.processing_errors);
        }
        if !self.rejection_reasons.is_empty() {
            let _ = writeln!(out, "\nRejection reasons:");
            for (reason, n) in self.sorted_reasons() {
                let _ = writeln!(out, "  - {reason}: {n}");
            }
        }
        out
    }
}

/// Aggregate over every processed issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub issues: BTreeMap<String, IssueReport>,
    pub totals: IssueReport,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            issues: BTreeMap::new(),
            totals: IssueReport::default(),
        }
    }

    pub fn add_issue(&mut self, issue_id: impl Into<String>, report: IssueReport) {
        self.totals.merge(&report);
        self.issues.insert(issue_id.into(), report);
    }

    pub fn render_text(&self) -> String {
        let mut out = self.totals.render_text("HSA FILTERING REPORT");
        let _ = writeln!(out, "\nIssues processed: {}", self.issues.len());
        out
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_merge() {
        let mut a = IssueReport::default();
        a.record_accepted();
        a.record_rejected(RejectReason::BodyTooShort);
        a.record_error();

        let mut b = IssueReport::default();
        b.record_rejected(RejectReason::BodyTooShort);
        b.record_rejected(RejectReason::AdPhrase);

        a.merge(&b);
        assert_eq!(a.total, 5);
        assert_eq!(a.accepted, 1);
        assert_eq!(a.rejected, 3);
        assert_eq!(a.processing_errors, 1);
        assert_eq!(
            a.sorted_reasons(),
            vec![("Body too short", 2), ("Contains ad phrase", 1)]
        );
    }

    #[test]
    fn acceptance_pct_ignores_errors() {
        let mut r = IssueReport::default();
        assert_eq!(r.acceptance_pct(), 0.0);
        r.record_accepted();
        r.record_rejected(RejectReason::MissingBody);
        r.record_rejected(RejectReason::MissingBody);
        r.record_error();
        assert!((r.acceptance_pct() - 33.33).abs() < 1e-9);
    }

    #[test]
    fn text_report_lists_reasons() {
        let mut run = RunReport::new();
        let mut r = IssueReport::default();
        r.record_rejected(RejectReason::MissingHeadline);
        run.add_issue("1977-08-14", r);
        let txt = run.render_text();
        assert!(txt.contains("HSA FILTERING REPORT"));
        assert!(txt.contains("  - Missing headline: 1"));
        assert!(txt.contains("Issues processed: 1"));
    }
}

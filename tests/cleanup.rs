// tests/cleanup.rs
//
// Strict re-check of an hsa-ready tree.

use std::fs;
use std::path::Path;

use hsa_filter::batch::cleanup::cleanup_accepted;
use hsa_filter::batch::OutputLayout;
use hsa_filter::Classifier;
use serde_json::{json, Value};
use tempfile::tempdir;

const BODY: &str = "The city council met on Tuesday evening to debate the new budget. \
Members argued for nearly three hours about road repairs and school funding. \
The mayor said a final vote would follow next week.";

fn write(path: &Path, v: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, v.to_string()).unwrap();
}

fn seed(root: &Path) {
    let day = root.join("hsa-ready/1977/08/14");
    write(
        &day.join("keep.json"),
        &json!({ "headline": "Council debates budget", "body": BODY, "section": "news" }),
    );
    write(
        &day.join("dated.json"),
        &json!({ "headline": "Council debates budget", "body": BODY, "timestamp": "1977-08-14T06:00:00" }),
    );
    write(
        &day.join("undated.json"),
        &json!({ "headline": "Council debates budget", "body": BODY, "section": "unknown" }),
    );
}

#[test]
fn moves_strict_rejects_into_cleaned_tree() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    let layout = OutputLayout::new(dir.path());

    let report = cleanup_accepted(&Classifier::with_defaults(), &layout, false).unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 2);

    let ready = dir.path().join("hsa-ready/1977/08/14");
    assert!(ready.join("keep.json").exists());
    assert!(!ready.join("dated.json").exists());
    assert!(!ready.join("undated.json").exists());

    let moved = dir.path().join("rejected/cleaned/1977/08/14/dated.json");
    let v: Value = serde_json::from_str(&fs::read_to_string(moved).unwrap()).unwrap();
    assert_eq!(v["skip_hsa"], true);
    assert_eq!(v["skip_hsa_reason"], "Section type excluded");

    assert!(dir
        .path()
        .join("rejected/cleaned/unknown/undated.json")
        .exists());
}

#[test]
fn dry_run_leaves_files_in_place() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    let layout = OutputLayout::new(dir.path());

    let report = cleanup_accepted(&Classifier::with_defaults(), &layout, true).unwrap();
    assert_eq!(report.rejected, 2);
    assert!(dir.path().join("hsa-ready/1977/08/14/dated.json").exists());
    assert!(!dir.path().join("rejected").exists());
}

#[test]
fn missing_tree_is_empty_report() {
    let dir = tempdir().unwrap();
    let report =
        cleanup_accepted(&Classifier::with_defaults(), &OutputLayout::new(dir.path()), false)
            .unwrap();
    assert_eq!(report.total, 0);
}

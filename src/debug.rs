// src/debug.rs
//! Dev-only verdict logging. Never logs raw article text: only a short hash
//! of headline + body, the outcome and the rule evidence.

use crate::classify::ClassificationResult;
use tracing::info;

pub const ENV_DEV_LOG: &str = "HSA_FILTER_DEV_LOG";
pub const ENV_RUNTIME_ENV: &str = "HSA_FILTER_ENV";

// Dev logging gate: HSA_FILTER_DEV_LOG=1 AND dev env (debug build or HSA_FILTER_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    is_dev_env()
}

pub(crate) fn is_dev_env() -> bool {
    matches!(
        std::env::var(ENV_RUNTIME_ENV)
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// First 6 bytes of SHA-256, hex encoded.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

pub(crate) fn dev_log_verdict(headline: &str, body: &str, verdict: &ClassificationResult) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(&format!("{headline}\n{body}"));
    let evidence = truncate_vec(&verdict.evidence, 5);
    info!(
        target: "verdict",
        %id,
        accepted = verdict.accepted,
        reason = verdict.reason_str().unwrap_or("-"),
        evidence = ?evidence
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("hello");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("hello"));
        assert_ne!(a, anon_hash("hello!"));
        // sha256("hello") starts with 2cf24dba5fb0
        assert_eq!(a, "2cf24dba5fb0");
    }

    #[test]
    fn truncate_keeps_prefix() {
        assert_eq!(truncate_vec(&[1, 2, 3], 2), vec!["1", "2"]);
    }
}

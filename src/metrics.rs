use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::classify::ClassifierConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder and publish the active
    /// thresholds as static gauges. Fails if a recorder is already installed.
    pub fn init(cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        let t = &cfg.thresholds;
        gauge!("filter_min_body_chars").set(t.min_body_chars as f64);
        gauge!("filter_max_symbol_ratio").set(t.max_symbol_ratio as f64);
        gauge!("filter_strict_sections").set(if cfg.strict_section_exclusion {
            1.0
        } else {
            0.0
        });

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

//! Observability infrastructure for the cost estimator
//!
//! Provides:
//! - Prometheus metrics (decode counters, binding counters, estimation latency)
//! - Structured logging of significant estimation events with tracing

use prometheus::{
    register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for estimation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EstimatorMetricsInner> = OnceLock::new();

struct EstimatorMetricsInner {
    estimation_latency_seconds: Histogram,
    documents_decoded: IntCounter,
    documents_skipped: IntCounter,
    decode_errors: IntCounter,
    workloads_estimated: IntCounter,
    volume_claims_estimated: IntCounter,
    scaling_policies_bound: IntCounter,
    scaling_policies_unmatched: IntCounter,
}

impl EstimatorMetricsInner {
    fn new() -> Self {
        Self {
            estimation_latency_seconds: register_histogram!(
                "cost_estimator_estimation_latency_seconds",
                "Time spent estimating the cost of one manifest batch",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register estimation_latency_seconds"),

            documents_decoded: register_int_counter!(
                "cost_estimator_documents_decoded_total",
                "Manifest documents decoded into workloads, policies or claims"
            )
            .expect("Failed to register documents_decoded"),

            documents_skipped: register_int_counter!(
                "cost_estimator_documents_skipped_total",
                "Manifest documents of unsupported kinds"
            )
            .expect("Failed to register documents_skipped"),

            decode_errors: register_int_counter!(
                "cost_estimator_decode_errors_total",
                "Manifest documents that failed to decode"
            )
            .expect("Failed to register decode_errors"),

            workloads_estimated: register_int_counter!(
                "cost_estimator_workloads_estimated_total",
                "Workloads priced by the estimator"
            )
            .expect("Failed to register workloads_estimated"),

            volume_claims_estimated: register_int_counter!(
                "cost_estimator_volume_claims_estimated_total",
                "Persistent volume claims priced by the estimator"
            )
            .expect("Failed to register volume_claims_estimated"),

            scaling_policies_bound: register_int_counter!(
                "cost_estimator_scaling_policies_bound_total",
                "Autoscalers attached to a workload"
            )
            .expect("Failed to register scaling_policies_bound"),

            scaling_policies_unmatched: register_int_counter!(
                "cost_estimator_scaling_policies_unmatched_total",
                "Autoscalers whose target matched no workload"
            )
            .expect("Failed to register scaling_policies_unmatched"),
        }
    }
}

/// Estimator metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EstimatorMetricsInner {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new)
    }

    pub fn observe_estimation_latency(&self, duration_secs: f64) {
        self.inner().estimation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_documents_decoded(&self) {
        self.inner().documents_decoded.inc();
    }

    pub fn inc_documents_skipped(&self) {
        self.inner().documents_skipped.inc();
    }

    pub fn inc_decode_errors(&self) {
        self.inner().decode_errors.inc();
    }

    pub fn add_workloads_estimated(&self, count: usize) {
        self.inner().workloads_estimated.inc_by(count as u64);
    }

    pub fn add_volume_claims_estimated(&self, count: usize) {
        self.inner().volume_claims_estimated.inc_by(count as u64);
    }

    pub fn add_scaling_policies_bound(&self, count: usize) {
        self.inner().scaling_policies_bound.inc_by(count as u64);
    }

    pub fn add_scaling_policies_unmatched(&self, count: usize) {
        self.inner().scaling_policies_unmatched.inc_by(count as u64);
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for estimation events
///
/// Every event carries an `event` field so that JSON logs can be filtered
/// without parsing messages.
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    /// `source` names the manifest set, usually its path
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_estimate(&self, workloads: usize, volume_claims: usize, kinds: usize, duration_ms: f64) {
        info!(
            event = "estimate_completed",
            source = %self.source,
            workloads = workloads,
            volume_claims = volume_claims,
            kinds = kinds,
            duration_ms = duration_ms,
            "Cost estimate completed"
        );
    }

    pub fn log_policy_bound(&self, policy: &str, workload: &str, relaxed: bool) {
        info!(
            event = "scaling_policy_bound",
            source = %self.source,
            policy = %policy,
            workload = %workload,
            relaxed_match = relaxed,
            "Autoscaler bound to workload"
        );
    }

    pub fn log_policy_unmatched(&self, policy: &str, target: &str) {
        warn!(
            event = "scaling_policy_unmatched",
            source = %self.source,
            policy = %policy,
            target = %target,
            "Autoscaler target not found, workload costed without it"
        );
    }

    /// A later autoscaler replaced an earlier one on the same workload
    pub fn log_policy_overridden(&self, workload: &str, previous: &str, current: &str) {
        warn!(
            event = "scaling_policy_overridden",
            source = %self.source,
            workload = %workload,
            previous_policy = %previous,
            policy = %current,
            "Multiple autoscalers target the same workload, keeping the last one"
        );
    }

    pub fn log_unsupported_storage_class(&self, claim: &str, storage_class: &str) {
        info!(
            event = "storage_class_unsupported",
            source = %self.source,
            claim = %claim,
            storage_class = %storage_class,
            "Storage class not priced, using standard persistent disk instead"
        );
    }

    pub fn log_diff(&self, summary: &str, possibly_cost_increase: bool, max_diff_usd: f64) {
        info!(
            event = "diff_computed",
            source = %self.source,
            possibly_cost_increase = possibly_cost_increase,
            max_diff_usd = max_diff_usd,
            summary = %summary,
            "Cost difference computed"
        );
    }
}
